//! The mock module contains a mock [`PartitioningScheme`] used for tests
use std::collections::HashMap;

use crate::cluster::error::{Error, Result};

use super::PartitioningScheme;

/// Routes keys to explicitly pinned owners. Keys that were not pinned belong to
/// the first node added to the scheme.
#[derive(Debug, Default)]
pub struct MockPartitioningScheme {
    nodes: Vec<String>,
    pinned: HashMap<Vec<u8>, String>,
}

impl MockPartitioningScheme {
    pub fn pin(mut self, key: &str, owner: &str) -> Self {
        self.pinned.insert(key.as_bytes().to_vec(), owner.to_string());
        self
    }
}

impl PartitioningScheme for MockPartitioningScheme {
    fn add_node(&mut self, node_id: &str) -> Result<()> {
        self.nodes.push(node_id.to_string());
        Ok(())
    }

    fn key_owner(&self, key: &[u8]) -> Result<String> {
        if let Some(owner) = self.pinned.get(key) {
            return Ok(owner.clone());
        }

        self.nodes.first().cloned().ok_or(Error::EmptyRing)
    }
}
