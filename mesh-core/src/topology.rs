use crate::model::{Node, NodeId, NodeStatus};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Edge {
    id: String,
    source: NodeId,
    target: NodeId,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: format!("{}-{}", source, target),
            source,
            target,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }
}

/// What a renderer needs to draw one node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopologyNode {
    id: NodeId,
    label: String,
    status: NodeStatus,
}

impl TopologyNode {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }
}

/// Renderer-agnostic full-mesh description of the current collection.
/// Holds no state of its own; rebuild it after every change.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Topology {
    nodes: Vec<TopologyNode>,
    edges: Vec<Edge>,
}

impl Topology {
    pub fn build(nodes: &[Node]) -> Self {
        Self {
            nodes: nodes
                .iter()
                .map(|n| TopologyNode {
                    id: n.id().clone(),
                    label: n.label(),
                    status: n.status(),
                })
                .collect(),
            edges: full_mesh(nodes),
        }
    }

    pub fn nodes(&self) -> &Vec<TopologyNode> {
        &self.nodes
    }

    pub fn edges(&self) -> &Vec<Edge> {
        &self.edges
    }
}

/// Every unordered pair exactly once; the source is the earlier node in
/// collection order.
pub fn full_mesh(nodes: &[Node]) -> Vec<Edge> {
    nodes
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            nodes[i + 1..]
                .iter()
                .map(move |b| Edge::new(a.id().clone(), b.id().clone()))
        })
        .collect()
}
