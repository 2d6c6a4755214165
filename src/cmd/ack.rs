use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{broker::Broker, error::Result, queue::parse_document};

/// Acknowledges a delivered message.
///
/// Acks are always executed by the node that receives them. There is no ownership lookup,
/// clients are expected to send the ack to the node named in the consume response.
#[derive(Debug)]
pub struct Ack {
    ack_token: String,
    message: Value,
}

impl Ack {
    pub fn new(ack_token: String, message: Value) -> Self {
        Self { ack_token, message }
    }

    /// Builds the command from the raw request body, which must be the delivered message itself
    pub fn try_from_body(ack_token: String, body: &[u8]) -> Result<Self> {
        Ok(Self::new(ack_token, parse_document(body)?))
    }

    pub async fn execute(self, broker: Arc<Broker>) -> Result<AckResponse> {
        let acknowledged = broker
            .queue()
            .acknowledge(&self.ack_token, &self.message)
            .await?;

        Ok(AckResponse {
            status: "message acknowledged".to_string(),
            removed: acknowledged.removed,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
    /// how many checked-out copies of the message were removed (0 if it was already acknowledged)
    pub removed: usize,
}
