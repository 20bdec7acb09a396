use super::ids::NodeId;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Healthy,
    Compromised,
    Isolated,
    Restored,
}

impl NodeStatus {
    pub const ALL: [NodeStatus; 4] = [
        NodeStatus::Healthy,
        NodeStatus::Compromised,
        NodeStatus::Isolated,
        NodeStatus::Restored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Healthy => "healthy",
            NodeStatus::Compromised => "compromised",
            NodeStatus::Isolated => "isolated",
            NodeStatus::Restored => "restored",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health metrics of a node.
///
/// `latency` is in milliseconds; `resource_usage` and `anomaly_score` are
/// ratios in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetrics {
    pub latency: f64,
    // config sources hand keys over lowercased
    #[serde(alias = "resourceusage")]
    pub resource_usage: f64,
    #[serde(alias = "anomalyscore")]
    pub anomaly_score: f64,
}

impl NodeMetrics {
    /// Metrics forced onto a node by fault injection.
    pub const DEGRADED: NodeMetrics = NodeMetrics {
        latency: 150.0,
        resource_usage: 0.8,
        anomaly_score: 0.9,
    };

    pub fn new(latency: f64, resource_usage: f64, anomaly_score: f64) -> Self {
        Self {
            latency,
            resource_usage,
            anomaly_score,
        }
    }

    /// Fresh metrics for a newly added node.
    ///
    /// latency in [10, 60) whole ms, resource usage in [0, 0.3),
    /// anomaly score in [0, 0.2).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            latency: rng.gen_range(10..60) as f64,
            resource_usage: rng.gen_range(0.0..0.3),
            anomaly_score: rng.gen_range(0.0..0.2),
        }
    }
}

/// A simulated network endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    status: NodeStatus,
    metrics: NodeMetrics,
    #[serde(default = "Utc::now", alias = "lastupdated")]
    last_updated: DateTime<Utc>,
    // Store generation this instance was created in; baseline nodes are 0
    #[serde(skip)]
    generation: u64,
}

impl Node {
    pub fn new(id: NodeId, status: NodeStatus, metrics: NodeMetrics) -> Self {
        Self {
            id,
            name: None,
            status,
            metrics,
            last_updated: Utc::now(),
            generation: 0,
        }
    }

    pub fn healthy(id: NodeId, metrics: NodeMetrics) -> Self {
        Self::new(id, NodeStatus::Healthy, metrics)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_last_updated(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = at;
        self
    }

    // Accessors
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// The store generation this node was added in. Together with the id it
    /// names one node instance, since ids are handed out again after a reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Display label: the name if set, otherwise `Node {id}`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Node {}", self.id),
        }
    }

    // Mutators are crate-private: every change goes through `transitions`.
    pub(crate) fn in_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub(crate) fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    pub(crate) fn set_metrics(&mut self, metrics: NodeMetrics) {
        self.metrics = metrics;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.last_updated = at;
    }
}
