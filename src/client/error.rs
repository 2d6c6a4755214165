use serde::{Deserialize, Serialize};

/// Concrete type for a [`crate::client::Client`] error
pub type Result<T> = std::result::Result<T, Error>;

/// Enum that represents a client error
#[derive(Debug, Serialize, Deserialize)]
pub enum Error {
    /// Variant returned when a client was unable to reach a shardq node
    UnableToConnect { reason: String },
    /// The remote node didn't answer in time
    Timeout { reason: String },
    /// The request couldn't be built (eg: invalid method or header)
    InvalidRequest { reason: String },
    /// Variant returned if the client was unable to interpret the server response
    InvalidServerResponse { reason: String },
    /// Server answered 404 - empty queue or missing cache key
    NotFound { body: String },
    /// Server answered with any other non-success status
    UnexpectedStatus { status: u16, body: String },
    /// Generic IO error (automatically converted from [`std::io::Error`])
    Io { reason: String },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io {
            reason: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout {
                reason: value.to_string(),
            }
        } else if value.is_connect() {
            Self::UnableToConnect {
                reason: value.to_string(),
            }
        } else if value.is_builder() {
            Self::InvalidRequest {
                reason: value.to_string(),
            }
        } else if value.is_decode() {
            Self::InvalidServerResponse {
                reason: value.to_string(),
            }
        } else {
            Self::Io {
                reason: value.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidServerResponse {
            reason: value.to_string(),
        }
    }
}
