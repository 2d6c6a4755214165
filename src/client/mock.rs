//! Mock implementation for [`Client`]
//!
//! Records every call it receives and answers with canned responses, optionally failing
//! according to the configured [`Fault`]s.
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use crate::test_utils::fault::{Fault, When};

use super::{
    error::{Error, Result},
    Client, ProxiedRequest, ProxiedResponse,
};

#[derive(Debug, Default)]
pub struct MockClientStats {
    pub forwarded: Vec<(String, ProxiedRequest)>,
    pub invalidated: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct MockClientFaults {
    pub forward: Fault,
    pub invalidate: Fault,
    /// addresses that behave as if the peer was down
    pub unreachable: HashSet<String>,
    /// addresses that take this long to answer an invalidation
    pub slow: HashMap<String, Duration>,
}

#[derive(Debug, Default)]
pub struct MockClient {
    pub faults: MockClientFaults,
    pub stats: Mutex<MockClientStats>,
    responses: HashMap<String, ProxiedResponse>,
}

impl MockClient {
    pub fn new(faults: MockClientFaults) -> Self {
        Self {
            faults,
            ..Default::default()
        }
    }

    /// Every request forwarded to `addr` will be answered with `response`
    pub fn with_response(mut self, addr: &str, response: ProxiedResponse) -> Self {
        self.responses.insert(addr.to_string(), response);
        self
    }

    pub fn forwarded(&self) -> Vec<(String, ProxiedRequest)> {
        self.stats.lock().unwrap().forwarded.clone()
    }

    pub fn invalidated(&self) -> Vec<(String, String)> {
        self.stats.lock().unwrap().invalidated.clone()
    }

    fn check_reachable(&self, fault: &Fault, addr: &str, call: &str) -> Result<()> {
        if fault.triggers() {
            return Err(Error::UnableToConnect {
                reason: format!("Mocked error on {}", call),
            });
        }

        if self.faults.unreachable.contains(addr) {
            return Err(Error::UnableToConnect {
                reason: format!("Mocked unreachable peer {}", addr),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Client for MockClient {
    async fn forward(&self, addr: &str, request: ProxiedRequest) -> Result<ProxiedResponse> {
        self.stats
            .lock()
            .unwrap()
            .forwarded
            .push((addr.to_string(), request));
        self.check_reachable(&self.faults.forward, addr, "forward")?;

        Ok(self
            .responses
            .get(addr)
            .cloned()
            .unwrap_or(ProxiedResponse {
                status: 200,
                headers: vec![("content-type".to_string(), Bytes::from("application/json"))],
                body: Bytes::from(format!("{{\"node\":\"{}\"}}", addr)),
            }))
    }

    async fn invalidate(&self, addr: &str, key: &str) -> Result<()> {
        self.stats
            .lock()
            .unwrap()
            .invalidated
            .push((addr.to_string(), key.to_string()));
        self.check_reachable(&self.faults.invalidate, addr, "invalidate")?;

        if let Some(delay) = self.faults.slow.get(addr) {
            tokio::time::sleep(*delay).await;
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct MockClientBuilder {
    faults: MockClientFaults,
}

impl MockClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forward_fault(mut self, when: When) -> Self {
        self.faults.forward = Fault { when };
        self
    }

    pub fn with_invalidate_fault(mut self, when: When) -> Self {
        self.faults.invalidate = Fault { when };
        self
    }

    pub fn with_unreachable_peer(mut self, addr: &str) -> Self {
        self.faults.unreachable.insert(addr.to_string());
        self
    }

    pub fn with_slow_peer(mut self, addr: &str, delay: Duration) -> Self {
        self.faults.slow.insert(addr.to_string(), delay);
        self
    }

    pub fn build(self) -> MockClient {
        MockClient::new(self.faults)
    }
}
