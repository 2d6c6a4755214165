//! Module that contains algorithms related to cluster mode
pub mod error;
pub mod partitioning;
pub mod state;
