//! This module contains the HTTP server of a shardq node.
//!
//! A [`Server`] is built from a [`Config`]: it binds the listener, builds the cluster state and
//! the [`Broker`], and serves the routes declared in [`routes`] until the shutdown future
//! passed to [`Server::run`] resolves.
use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc};

use axum::Router;
use tokio::net::TcpListener;
use tracing::{event, Level};

use crate::{
    broker::{Broker, BrokerOptions},
    client::http_client::HttpClient,
    cluster::{partitioning::consistent_hashing::ConsistentHashing, state::State as ClusterState},
    storage_engine::{in_memory::InMemory, StorageEngine},
};

use self::config::Config;

pub mod config;
pub mod routes;

pub type SyncStorageEngine = Arc<dyn StorageEngine + Send + Sync + 'static>;

fn storage_engine(config: &Config) -> SyncStorageEngine {
    match config.storage_engine {
        config::StorageEngine::InMemory => Arc::new(InMemory::default()),
    }
}

pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    pub async fn from_config(path: PathBuf) -> anyhow::Result<Self> {
        let c = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&c)?;

        let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
        Self::from_listener(config, listener)
    }

    /// Builds a server on top of an already bound listener. The port in `config` is ignored.
    /// The node gets a record store of its own, built from `config.storage_engine`.
    pub fn from_listener(config: Config, listener: TcpListener) -> anyhow::Result<Self> {
        let records = storage_engine(&config);
        Self::from_listener_with_records(config, listener, records)
    }

    /// Same as [`Server::from_listener`] but the cache reads through to (and writes to) `records`.
    /// Nodes built with the same `records` handle share one record store, which is what the
    /// cluster-wide cache invalidation assumes.
    pub fn from_listener_with_records(
        config: Config,
        listener: TcpListener,
        records: SyncStorageEngine,
    ) -> anyhow::Result<Self> {
        let queues = storage_engine(&config);

        let partitioning_scheme = match config.partitioning_scheme {
            config::PartitioningScheme::ConsistentHashing { replicas } => {
                Box::new(ConsistentHashing::new(replicas))
            }
        };

        let cluster_state = Arc::new(ClusterState::new(
            partitioning_scheme,
            &config.node_id,
            config.nodes,
        )?);

        let client = Arc::new(HttpClient::new(
            config.timeouts.forward(),
            config.timeouts.broadcast(),
        ));

        let broker = Arc::new(Broker::new(
            cluster_state,
            client,
            queues,
            records,
            BrokerOptions {
                cache_capacity: config.cache.capacity,
                broadcast_timeout: config.timeouts.broadcast(),
            },
        ));

        Ok(Self {
            listener,
            router: routes::router(broker),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until `shutdown` resolves. In-flight requests are allowed to finish.
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future + Send + 'static,
    {
        event!(Level::INFO, "Listener started on {}", self.local_addr()?);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.await;
                event!(Level::INFO, "Shutting down");
            })
            .await?;

        Ok(())
    }
}
