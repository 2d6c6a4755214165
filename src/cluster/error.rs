use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub enum Error {
    /// Ownership was requested from a ring without entries
    EmptyRing,
    /// Two ring entries landed on the same hash
    HashCollision { node: String, existing: String },
    /// The same node id was listed twice in the cluster configuration
    DuplicateNode { id: String },
    /// A node id that is not part of the cluster configuration
    UnknownNode { id: String },
    Logic { reason: String },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
