use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{broker::Broker, cluster::state::Node};

/// Identity of the node serving the request and the peers it knows about
#[derive(Debug)]
pub struct NodeInfo;

impl NodeInfo {
    pub fn execute(self, broker: Arc<Broker>) -> axum::Json<NodeInfoResponse> {
        let node = broker.own_node();
        axum::Json(NodeInfoResponse {
            message: format!("Hello from Node {}", node.id),
            node: node.id.clone(),
            addr: node.addr.clone(),
            port: node
                .addr
                .rsplit_once(':')
                .and_then(|(_, port)| port.parse().ok()),
            peers: broker.peers().to_vec(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeInfoResponse {
    pub message: String,
    pub node: String,
    pub addr: String,
    pub port: Option<u16>,
    pub peers: Vec<Node>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::NodeInfo;
    use crate::{client::mock::MockClientBuilder, cmd::test_support};

    #[test]
    fn describes_self_and_peers() {
        let broker = test_support::broker(Arc::new(MockClientBuilder::new().build()));
        let axum::Json(info) = NodeInfo.execute(broker);
        assert_eq!(info.message, "Hello from Node A");
        assert_eq!(info.addr, "127.0.0.1:3001");
        assert_eq!(info.port, Some(3001));
        assert_eq!(info.peers.len(), 1);
        assert_eq!(info.peers[0].id, "B");
    }
}
