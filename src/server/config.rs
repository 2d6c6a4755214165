use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cluster::{partitioning::consistent_hashing::DEFAULT_REPLICAS, state::Node};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Id of this node. Must be one of the ids listed in `nodes`
    pub node_id: String,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Every node of the cluster, self included. A standalone node lists only itself.
    pub nodes: Vec<Node>,
    pub storage_engine: StorageEngine,
    #[serde(default)]
    pub partitioning_scheme: PartitioningScheme,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub cache: Cache,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageEngine {
    InMemory,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartitioningScheme {
    ConsistentHashing {
        /// Virtual nodes placed on the ring for every node
        replicas: usize,
    },
}

impl Default for PartitioningScheme {
    fn default() -> Self {
        Self::ConsistentHashing {
            replicas: DEFAULT_REPLICAS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Timeouts {
    #[serde(default = "default_forward_ms")]
    pub forward_ms: u64,
    #[serde(default = "default_broadcast_ms")]
    pub broadcast_ms: u64,
}

fn default_forward_ms() -> u64 {
    5000
}

fn default_broadcast_ms() -> u64 {
    500
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            forward_ms: default_forward_ms(),
            broadcast_ms: default_broadcast_ms(),
        }
    }
}

impl Timeouts {
    pub fn forward(&self) -> Duration {
        Duration::from_millis(self.forward_ms)
    }

    pub fn broadcast(&self) -> Duration {
        Duration::from_millis(self.broadcast_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Cache {
    pub capacity: usize,
}

impl Default for Cache {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{Cache, Config, PartitioningScheme, StorageEngine, Timeouts};

    fn read_config(name: &str) -> Config {
        let mut config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        config_path.push("conf");
        config_path.push(name);

        let stringified_json = std::fs::read_to_string(config_path).unwrap();
        serde_json::from_str(&stringified_json).unwrap()
    }

    #[test]
    fn deserialize_standalone() {
        let config = read_config("standalone.json");

        assert_eq!(config.node_id, "node-1");
        assert_eq!(config.port, 3001);
        assert_eq!(config.nodes.len(), 1);
        assert_eq!(config.storage_engine, StorageEngine::InMemory);
        assert_eq!(
            config.partitioning_scheme,
            PartitioningScheme::ConsistentHashing { replicas: 5 }
        );
        assert_eq!(config.timeouts, Timeouts::default());
        assert_eq!(config.cache, Cache { capacity: 128 });
    }

    #[test]
    fn deserialize_cluster() {
        let config = read_config("cluster_node_2.json");

        assert_eq!(config.node_id, "node-2");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3002);
        let ids: Vec<&str> = config.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["node-1", "node-2", "node-3"]);
        assert_eq!(config.nodes[2].addr, "127.0.0.1:3003");
        assert_eq!(config.timeouts.forward_ms, 5000);
        assert_eq!(config.timeouts.broadcast_ms, 500);
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config: Config = serde_json::from_str(
            r#"{
                "node_id": "a",
                "port": 4000,
                "nodes": [{"id": "a", "addr": "127.0.0.1:4000"}],
                "storage_engine": "in_memory",
                "timeouts": {"forward_ms": 100}
            }"#,
        )
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.timeouts.forward_ms, 100);
        assert_eq!(config.timeouts.broadcast_ms, 500);
        assert_eq!(config.cache.capacity, 128);
    }
}
