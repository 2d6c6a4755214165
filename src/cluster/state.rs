//! This file contains the [`State`] data structure.
//! This structure holds the (static) cluster membership. It owns the [`PartitioningScheme`]
//! provided during construction and delegates queries like: Which node owns a given key to it.
//!
//! Membership is loaded once at startup from configuration and never changes afterwards,
//! so the state is shared between requests without any locking.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    error::{Error, Result},
    partitioning::PartitioningScheme,
};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Node {
    // Opaque node identifier - this is what gets placed on the hash ring
    pub id: String,
    // the IP/PORT pair formatted as <ip>:<port>
    pub addr: String,
}

impl Node {
    pub fn new(id: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
        }
    }
}

pub struct State {
    own_id: String,
    // Nodes in configuration order
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    partitioning_scheme: Box<dyn PartitioningScheme + Send + Sync>,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("own_id", &self.own_id)
            .field("nodes", &self.nodes)
            .finish()
    }
}

impl State {
    /// Builds the cluster state from the full node list (self included).
    ///
    /// # Errors
    ///  1. `own_id` is not part of `nodes`
    ///  2. the same node id is listed more than once
    ///  3. the partitioning scheme refuses one of the nodes
    pub fn new(
        mut partitioning_scheme: Box<dyn PartitioningScheme + Send + Sync>,
        own_id: &str,
        nodes: Vec<Node>,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(Error::DuplicateNode {
                    id: node.id.clone(),
                });
            }
            partitioning_scheme.add_node(&node.id)?;
        }

        if !index.contains_key(own_id) {
            return Err(Error::UnknownNode {
                id: own_id.to_string(),
            });
        }

        Ok(Self {
            own_id: own_id.to_string(),
            nodes,
            index,
            partitioning_scheme,
        })
    }

    /// Returns the node that owns the given shard key
    pub fn key_owner(&self, key: &[u8]) -> Result<&Node> {
        let owner_id = self.partitioning_scheme.key_owner(key)?;
        self.get_node(&owner_id).ok_or(Error::Logic {
            reason: format!(
                "Partitioning scheme returned node {} which is not part of the cluster. This should never happen.",
                owner_id
            ),
        })
    }

    pub fn owns_key(&self, key: &[u8]) -> Result<bool> {
        Ok(self.key_owner(key)?.id == self.own_id)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|i| &self.nodes[*i])
    }

    pub fn own_node(&self) -> &Node {
        // existence checked in `new`
        &self.nodes[self.index[&self.own_id]]
    }

    pub fn own_id(&self) -> &str {
        &self.own_id
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every node in the cluster except self
    pub fn peers(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .filter(|node| node.id != self.own_id)
            .cloned()
            .collect()
    }
}
