//! This module defines client/user visible errors that can be returned by shardq.
//!
//! Every variant maps to one HTTP status code (see [`Error::status_code`]) and is
//! serialized as `{"error": <variant>}` in the response body.
use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{event, Level};

pub type Result<T> = std::result::Result<T, Error>;

/// Error enum with all possible variants
#[derive(Debug, Serialize)]
pub enum Error {
    /// Empty queue on consume or a key missing from both cache and record store
    NotFound { key: String },
    InvalidRequest(InvalidRequest),
    InvalidServerConfig { reason: String },
    /// The node that owns a shard couldn't be reached while forwarding a request to it
    UpstreamUnavailable { node: String, reason: String },
    Internal(Internal),
    Io { reason: String },
}

impl Error {
    /// Returns true if this is an instance of a [`Error::NotFound`] variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidServerConfig { .. } | Error::Internal(_) | Error::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a Error,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            event!(Level::ERROR, "request failed: {}", self);
        } else {
            event!(Level::DEBUG, "request failed: {}", self);
        }

        (status, Json(ErrorBody { error: &self })).into_response()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<crate::storage_engine::Error> for Error {
    fn from(err: crate::storage_engine::Error) -> Self {
        Self::Internal(Internal::StorageEngine(err))
    }
}

impl From<crate::cluster::error::Error> for Error {
    fn from(err: crate::cluster::error::Error) -> Self {
        Self::Internal(Internal::Cluster(err))
    }
}

#[derive(Debug, Serialize)]
pub enum Internal {
    Logic { reason: String },
    StorageEngine(crate::storage_engine::Error),
    Cluster(crate::cluster::error::Error),
    /// A stored message couldn't be decoded back into a document
    CorruptedEntry { reason: String },
    /// A forwarded request arrived at a node that doesn't own its shard either
    Misrouted { key: String, owner: String },
}

#[derive(Debug, Serialize)]
pub enum InvalidRequest {
    InvalidJsonPayload(String),
    EmptyPayload,
    /// `ack` is the path segment acknowledgements are posted under and can't name a queue
    ReservedQueueName { queue: String },
}

#[cfg(test)]
mod tests {
    use super::{Error, Internal, InvalidRequest};
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};

    #[test]
    fn status_codes() {
        let cases = vec![
            (
                Error::NotFound {
                    key: "orders".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::InvalidRequest(InvalidRequest::EmptyPayload),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::InvalidRequest(InvalidRequest::ReservedQueueName {
                    queue: "ack".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::UpstreamUnavailable {
                    node: "B".to_string(),
                    reason: "connection refused".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::Internal(Internal::StorageEngine(
                    crate::storage_engine::Error::Internal,
                )),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
        }
    }

    #[tokio::test]
    async fn upstream_unavailable_body_names_the_node() {
        let response = Error::UpstreamUnavailable {
            node: "B".to_string(),
            reason: "connection refused".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["UpstreamUnavailable"]["node"], "B");
        assert_eq!(
            body["error"]["UpstreamUnavailable"]["reason"],
            "connection refused"
        );
    }
}
