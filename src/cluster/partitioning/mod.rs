//! Module that contains different partitioning schemes
use crate::cluster::error::Result;

pub mod consistent_hashing;
pub mod mock;

/// This trait defines a PartitioningScheme (ie: which cluster node owns which shard key)
///
/// Membership is static for the lifetime of a process, so the scheme is only ever mutated
/// while the cluster state is being constructed. After that it is shared read-only.
pub trait PartitioningScheme {
    /// adds a new node to the partition state
    fn add_node(&mut self, node_id: &str) -> Result<()>;

    /// returns the id of the node that owns the given key
    fn key_owner(&self, key: &[u8]) -> Result<String>;
}
