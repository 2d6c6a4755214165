#![allow(dead_code)]
use std::sync::Arc;

use shardq::{
    cluster::state::Node,
    server::{
        config::{Cache, Config, PartitioningScheme, StorageEngine, Timeouts},
        Server, SyncStorageEngine,
    },
    storage_engine::in_memory::InMemory,
};
use tokio::{
    net::TcpListener,
    sync::oneshot::{channel, Receiver, Sender},
    task::JoinHandle,
};

async fn shutdown_future(receiver: Receiver<()>) {
    let _ = receiver.await;
}

pub struct ServerHandle {
    pub node: Node,
    task_handle: JoinHandle<()>,
    shutdown: Sender<()>,
}

impl ServerHandle {
    pub async fn stop(self) {
        drop(self.shutdown);
        self.task_handle.await.unwrap();
    }
}

pub fn config(own: &Node, nodes: &[Node]) -> Config {
    Config {
        node_id: own.id.clone(),
        host: "127.0.0.1".to_string(),
        port: 0,
        nodes: nodes.to_vec(),
        storage_engine: StorageEngine::InMemory,
        partitioning_scheme: PartitioningScheme::ConsistentHashing { replicas: 5 },
        timeouts: Timeouts {
            forward_ms: 2000,
            broadcast_ms: 300,
        },
        cache: Cache { capacity: 16 },
    }
}

/// Reserves `n` ephemeral ports and returns the node list of a cluster living on them
pub async fn reserve_nodes(n: usize) -> (Vec<Node>, Vec<TcpListener>) {
    let mut nodes = Vec::with_capacity(n);
    let mut listeners = Vec::with_capacity(n);
    for i in 0..n {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        nodes.push(Node::new(
            format!("node-{}", i + 1),
            listener.local_addr().unwrap().to_string(),
        ));
        listeners.push(listener);
    }

    (nodes, listeners)
}

/// Starts one server per listener. `nodes` may list more nodes than there are listeners:
/// the extra ones are part of the membership but nobody is listening on their address.
pub fn start_servers(nodes: &[Node], listeners: Vec<TcpListener>) -> Vec<ServerHandle> {
    spawn_servers(nodes, listeners, None)
}

/// Like [`start_servers`] but every node reads through to the same record store
pub fn start_servers_with_records(
    nodes: &[Node],
    listeners: Vec<TcpListener>,
    records: SyncStorageEngine,
) -> Vec<ServerHandle> {
    spawn_servers(nodes, listeners, Some(records))
}

fn spawn_servers(
    nodes: &[Node],
    listeners: Vec<TcpListener>,
    records: Option<SyncStorageEngine>,
) -> Vec<ServerHandle> {
    listeners
        .into_iter()
        .zip(nodes.iter())
        .map(|(listener, node)| {
            let config = config(node, nodes);
            let server = match records.clone() {
                Some(records) => Server::from_listener_with_records(config, listener, records),
                None => Server::from_listener(config, listener),
            }
            .expect("Unable to construct server from config");
            let (shutdown_sender, shutdown_receiver) = channel();
            let task_handle = tokio::spawn(async move {
                server
                    .run(shutdown_future(shutdown_receiver))
                    .await
                    .unwrap();
            });

            ServerHandle {
                node: node.clone(),
                task_handle,
                shutdown: shutdown_sender,
            }
        })
        .collect()
}

pub async fn start_cluster(n: usize) -> Vec<ServerHandle> {
    let (nodes, listeners) = reserve_nodes(n).await;
    start_servers(&nodes, listeners)
}

/// A cluster of `n` nodes sharing a single in-memory record store
pub async fn start_cluster_with_shared_records(n: usize) -> Vec<ServerHandle> {
    let (nodes, listeners) = reserve_nodes(n).await;
    start_servers_with_records(&nodes, listeners, Arc::new(InMemory::default()))
}

pub async fn stop_all(handles: Vec<ServerHandle>) {
    for handle in handles {
        handle.stop().await;
    }
}
