pub mod broadcast;
pub mod broker;
pub mod cache;
pub mod client;
pub mod cluster;
pub mod cmd;
pub mod error;
pub mod forward;
pub mod queue;
pub mod server;
pub mod storage_engine;
pub mod telemetry;
pub mod test_utils;
pub mod utils;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
