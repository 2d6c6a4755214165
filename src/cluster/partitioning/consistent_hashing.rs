//! Consistent-hashing is the default [`PartitioningScheme`] for shardq
use crate::cluster::error::{Error, Result};
use murmur3::murmur3_x86_128;
use std::io::Cursor;

use super::PartitioningScheme;

/// Let's force the usage of Hash functions that return u128 for now..
type HashFunctionReturnType = u128;

/// Number of ring positions each node gets when no value is configured
pub const DEFAULT_REPLICAS: usize = 5;

/// ConsistentHashing decides which node owns a shard key (eg: a queue name).
/// It creates a fixed hash space - in this case from [0, 2^128) - and computes
/// the hash of both the nodes and the keys being routed.
/// The node that owns the key is the first node whose hash is higher than or equal to the hash of the key.
/// This hash space should be viewed as a circular buffer (or hash ring):
///
/// In this example we have a hash space that goes from 0 to 10 (ie: the hash function returns a number between 0 and 10).
/// Ring entries:     ['A:0', 'B:0', 'C:0']
/// Entry hashes:     [  2  ,   5  ,   8  ]
///
/// key 'foo', hash('foo') = 4 -> owned by node B (hash 5)
/// key 'bar', hash('bar') = 7 -> owned by node C (hash 8)
/// key 'zoo', hash('zoo') = 9 -> owned by node A (hash 2)
///   - this last one shows the circular nature of the ring
///
/// Every node is placed on the ring `replicas` times, at the hashes of `"{node_id}:{i}"` for i in [0, replicas).
/// More positions per node smooth out how many keys each node ends up owning.
///
/// Implementation notes:
///  1. `hashes` is always sorted and `nodes[i]` is the owner of the ring entry `hashes[i]`.
///  2. The hash function is injectable so that tests can place nodes and keys at known positions.
#[derive(Clone, Debug)]
pub struct ConsistentHashing {
    nodes: Vec<String>,
    hashes: Vec<HashFunctionReturnType>,
    replicas: usize,
    hash_fn: fn(&[u8]) -> HashFunctionReturnType,
}

impl Default for ConsistentHashing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS)
    }
}

impl ConsistentHashing {
    pub fn new(replicas: usize) -> Self {
        Self::new_with_hash_fn(replicas, murmur3_hash)
    }

    pub fn new_with_hash_fn(replicas: usize, hash_fn: fn(&[u8]) -> HashFunctionReturnType) -> Self {
        Self {
            nodes: Vec::new(),
            hashes: Vec::new(),
            replicas,
            hash_fn,
        }
    }

    /// Builds a ring containing all the provided nodes
    pub fn with_nodes<'a, I>(replicas: usize, nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ring = Self::new(replicas);
        for node in nodes {
            ring.add_node(node)?;
        }

        Ok(ring)
    }

    /// Number of entries currently placed on the ring
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    fn key_owner_index(&self, key: &[u8]) -> Result<usize> {
        if self.hashes.is_empty() {
            return Err(Error::EmptyRing);
        }

        let key_hash = (self.hash_fn)(key);
        Ok(self.hashes.partition_point(|elem| *elem < key_hash) % self.hashes.len())
    }
}

impl PartitioningScheme for ConsistentHashing {
    fn add_node(&mut self, node_id: &str) -> Result<()> {
        if self.replicas == 0 {
            return Err(Error::Logic {
                reason: "ConsistentHashing requires at least one replica per node".to_string(),
            });
        }

        for i in 0..self.replicas {
            let entry_hash = (self.hash_fn)(format!("{}:{}", node_id, i).as_bytes());
            match self.hashes.binary_search(&entry_hash) {
                Ok(index) => {
                    return Err(Error::HashCollision {
                        node: node_id.to_string(),
                        existing: self.nodes[index].clone(),
                    });
                }
                Err(index) => {
                    self.hashes.insert(index, entry_hash);
                    self.nodes.insert(index, node_id.to_string());
                }
            }
        }

        Ok(())
    }

    fn key_owner(&self, key: &[u8]) -> Result<String> {
        let index = self.key_owner_index(key)?;
        Ok(self.nodes[index].clone())
    }
}

/// The hash function used to place both nodes and keys on the ring
pub fn murmur3_hash(key: &[u8]) -> HashFunctionReturnType {
    murmur3_x86_128(&mut Cursor::new(key), 0).expect("reading from an in-memory cursor can't fail")
}
