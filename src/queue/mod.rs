//! At-least-once delivery queue.
//!
//! Every queue is owned by exactly one node (see [`crate::cluster::state::State::key_owner`]).
//! Requests that arrive at any other node are forwarded to the owner.
//!
//! A message goes through the following states:
//!
//! ```text
//!   produce             consume                     acknowledge
//! ---------> Enqueued ----------> Checked-out -----------------> Acknowledged
//!                                    |   ^
//!                                    +---+ (redelivered by an operator)
//! ```
//!
//! Consuming a message does not delete it. The message is atomically moved from the head of the queue to
//! the tail of its processing queue (`"{queue}:processing"`) and only leaves the system once the consumer
//! acknowledges it. A consumer that crashes before acknowledging leaves the message in the processing queue.
//! There is no visibility timeout - nothing moves messages back from the processing queue automatically.
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tracing::{event, instrument, Level};

use crate::{
    client::ProxiedRequest,
    cluster::state::{Node, State as ClusterState},
    error::{Error, Internal, InvalidRequest, Result},
    forward::{was_forwarded, Forwarder, Routed},
    server::SyncStorageEngine,
};

const PROCESSING_SUFFIX: &str = ":processing";
/// `/queue/ack/{token}` shares its prefix with `/queue/{queue}`
const RESERVED_QUEUE_NAMES: [&str; 1] = ["ack"];

/// # Errors
/// [`InvalidRequest::ReservedQueueName`] if `queue` collides with another route
pub fn validate_queue_name(queue: &str) -> Result<()> {
    if RESERVED_QUEUE_NAMES.contains(&queue) {
        return Err(Error::InvalidRequest(InvalidRequest::ReservedQueueName {
            queue: queue.to_string(),
        }));
    }

    Ok(())
}

/// Name of the shadow queue holding the checked-out messages of `queue`.
/// This name doubles as the ack token handed to consumers.
pub fn processing_queue_name(queue: &str) -> String {
    format!("{}{}", queue, PROCESSING_SUFFIX)
}

/// Messages are stored as their JSON encoding. Objects are encoded with their keys sorted,
/// so two documents that are equal as values always have the same encoding.
pub fn encode_message(message: &Value) -> Result<Bytes> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(|e| Error::Internal(Internal::Logic {
            reason: format!("Unable to encode message: {}", e),
        }))
}

fn decode_message(raw: &[u8]) -> Result<Value> {
    serde_json::from_slice(raw).map_err(|e| {
        Error::Internal(Internal::CorruptedEntry {
            reason: e.to_string(),
        })
    })
}

/// Parses a request body into a document
pub fn parse_document(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Err(Error::InvalidRequest(InvalidRequest::EmptyPayload));
    }

    serde_json::from_slice(body)
        .map_err(|e| Error::InvalidRequest(InvalidRequest::InvalidJsonPayload(e.to_string())))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Produced {
    pub queue: String,
    pub node: String,
    pub message: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub node: String,
    pub message: Value,
    pub ack_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledged {
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub queue: String,
    pub node: String,
    /// messages waiting to be consumed
    pub ready: usize,
    /// messages consumed but not acknowledged yet
    pub in_flight: usize,
}

pub struct DeliveryQueue {
    cluster_state: Arc<ClusterState>,
    forwarder: Forwarder,
    storage: SyncStorageEngine,
}

impl std::fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("cluster_state", &self.cluster_state)
            .field("storage", &self.storage)
            .finish()
    }
}

impl DeliveryQueue {
    pub fn new(
        cluster_state: Arc<ClusterState>,
        forwarder: Forwarder,
        storage: SyncStorageEngine,
    ) -> Self {
        Self {
            cluster_state,
            forwarder,
            storage,
        }
    }

    fn own_id(&self) -> String {
        self.cluster_state.own_id().to_string()
    }

    /// Returns the owner of `queue` if it isn't this node. Reserved queue names are rejected
    /// before any routing happens.
    ///
    /// A request that was already forwarded once is never forwarded again. If it still
    /// landed on a node that doesn't own the queue, the two nodes disagree on the ring.
    fn remote_owner(&self, queue: &str, request: &ProxiedRequest) -> Result<Option<Node>> {
        validate_queue_name(queue)?;
        let owner = self.cluster_state.key_owner(queue.as_bytes())?;
        if owner.id == self.cluster_state.own_id() {
            return Ok(None);
        }

        if was_forwarded(request) {
            return Err(Error::Internal(Internal::Misrouted {
                key: queue.to_string(),
                owner: owner.id.clone(),
            }));
        }

        event!(
            Level::DEBUG,
            "queue {} is owned by {}, forwarding",
            queue,
            owner.id
        );
        Ok(Some(owner.clone()))
    }

    /// Appends the message in `request`'s body to `queue`, forwarding to the owner if needed
    #[instrument(name = "queue::produce", level = "info", skip(self, request))]
    pub async fn produce(&self, queue: &str, request: ProxiedRequest) -> Result<Routed<Produced>> {
        if let Some(owner) = self.remote_owner(queue, &request)? {
            return Ok(Routed::Forwarded(self.forwarder.proxy(&owner, request).await?));
        }

        let message = parse_document(&request.body)?;
        Ok(Routed::Local(self.produce_local(queue, message).await?))
    }

    /// Checks out the message at the head of `queue`, forwarding to the owner if needed
    #[instrument(name = "queue::consume", level = "info", skip(self, request))]
    pub async fn consume(&self, queue: &str, request: ProxiedRequest) -> Result<Routed<Delivery>> {
        if let Some(owner) = self.remote_owner(queue, &request)? {
            return Ok(Routed::Forwarded(self.forwarder.proxy(&owner, request).await?));
        }

        Ok(Routed::Local(self.consume_local(queue).await?))
    }

    #[instrument(name = "queue::pending", level = "debug", skip(self, request))]
    pub async fn pending(&self, queue: &str, request: ProxiedRequest) -> Result<Routed<Pending>> {
        if let Some(owner) = self.remote_owner(queue, &request)? {
            return Ok(Routed::Forwarded(self.forwarder.proxy(&owner, request).await?));
        }

        Ok(Routed::Local(self.pending_local(queue).await?))
    }

    pub async fn produce_local(&self, queue: &str, message: Value) -> Result<Produced> {
        let encoded = encode_message(&message)?;
        let len = self.storage.push_back(queue.as_bytes(), encoded).await?;
        event!(Level::DEBUG, "produced to {} (length {})", queue, len);

        Ok(Produced {
            queue: queue.to_string(),
            node: self.own_id(),
            message,
        })
    }

    /// # Errors
    /// [`Error::NotFound`] if the queue is empty. This never blocks waiting for a message.
    pub async fn consume_local(&self, queue: &str) -> Result<Delivery> {
        let ack_token = processing_queue_name(queue);
        let raw = self
            .storage
            .move_front_to_back(queue.as_bytes(), ack_token.as_bytes())
            .await?
            .ok_or_else(|| Error::NotFound {
                key: queue.to_string(),
            })?;

        Ok(Delivery {
            node: self.own_id(),
            message: decode_message(&raw)?,
            ack_token,
        })
    }

    /// Removes every copy of `message` from the processing queue named by `ack_token`.
    ///
    /// Acknowledging a message that is not there is a no-op. Acks are not routed:
    /// the client sends them to the node that served the delivery.
    #[instrument(name = "queue::acknowledge", level = "info", skip(self, message))]
    pub async fn acknowledge(&self, ack_token: &str, message: &Value) -> Result<Acknowledged> {
        let encoded = encode_message(message)?;
        let removed = self
            .storage
            .remove_all(ack_token.as_bytes(), &encoded)
            .await?;
        if removed == 0 {
            event!(
                Level::DEBUG,
                "ack for {} matched no checked-out message",
                ack_token
            );
        }

        Ok(Acknowledged { removed })
    }

    pub async fn pending_local(&self, queue: &str) -> Result<Pending> {
        let ready = self.storage.list_len(queue.as_bytes()).await?;
        let in_flight = self
            .storage
            .list_len(processing_queue_name(queue).as_bytes())
            .await?;

        Ok(Pending {
            queue: queue.to_string(),
            node: self.own_id(),
            ready,
            in_flight,
        })
    }
}
