use crate::error::{Result, SimulationError};
use crate::model::{Node, NodeId, NodeMetrics, NodeStatus};
use crate::transitions::TransitionPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Operator-tunable knobs shown on the control panel.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    /// Anomaly score at or above which a node counts as at risk in summaries.
    pub node_threshold: f64,
    /// Reserved. Nothing consumes it; there are no timer-driven transitions.
    pub recovery_timeout_ms: u64,
    /// Reserved. Faults are only ever injected manually.
    pub fault_injection_rate: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            node_threshold: 0.7,
            recovery_timeout_ms: 5000,
            fault_injection_rate: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MeshConfig {
    pub server_port: u16,
    pub log_level: String,

    /// Where the dashboard fetches node logs from (`{url}/run-log{N}`).
    pub log_source_url: String,
    /// Shell command behind `/run-log{N}`; `{n}` is replaced by the node number.
    pub log_command: String,

    /// Capacity hint for the notification bus.
    pub notification_capacity: usize,
    pub transition_policy: TransitionPolicy,
    pub settings: SimulationSettings,

    /// Replaces the built-in three-node baseline when set.
    pub baseline: Option<Vec<Node>>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            server_port: 5000,
            log_level: "info".to_string(),

            log_source_url: "http://localhost:5000".to_string(),
            log_command: "docker exec hackathon-node{n}-1 cat blacklisted_macs.log".to_string(),

            notification_capacity: crate::bus::DEFAULT_CAPACITY,
            transition_policy: TransitionPolicy::default(),
            settings: SimulationSettings::default(),

            baseline: None,
        }
    }
}

impl MeshConfig {
    /// Layers: built-in defaults, then `path` (or an optional `mesh.toml` in the
    /// working directory), then `MESH_*` environment variables with `__` as the
    /// nesting separator (e.g. `MESH_SETTINGS__NODE_THRESHOLD=0.5`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("mesh").required(false)),
        };
        let config = builder
            .add_source(
                Environment::with_prefix("MESH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a baseline override the store cannot work from.
    pub fn validate(&self) -> Result<()> {
        match &self.baseline {
            Some(baseline) => validate_baseline(baseline),
            None => Ok(()),
        }
    }

    pub fn baseline_nodes(&self) -> Vec<Node> {
        self.baseline.clone().unwrap_or_else(default_baseline)
    }

    pub fn log_command_for(&self, node: &str) -> String {
        self.log_command.replace("{n}", node)
    }
}

/// A baseline must hold unique ids, all nodes `healthy`, and leave room for
/// the allocator after its highest numeric id.
pub fn validate_baseline(nodes: &[Node]) -> Result<()> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id()) {
            return Err(invalid(format!("duplicate baseline node id '{}'", node.id())));
        }
        if node.status() != NodeStatus::Healthy {
            return Err(invalid(format!(
                "baseline node '{}' is {}, expected healthy",
                node.id(),
                node.status()
            )));
        }
        if node.id().as_number() == Some(u64::MAX) {
            return Err(invalid(format!(
                "baseline node id '{}' leaves no room for new ids",
                node.id()
            )));
        }
    }
    Ok(())
}

fn invalid(message: String) -> SimulationError {
    SimulationError::Config(ConfigError::Message(message))
}

/// The three healthy nodes every run starts from.
pub fn default_baseline() -> Vec<Node> {
    vec![
        Node::healthy(NodeId::from("1"), NodeMetrics::new(10.0, 0.3, 0.1)),
        Node::healthy(NodeId::from("2"), NodeMetrics::new(15.0, 0.2, 0.1)),
        Node::healthy(NodeId::from("3"), NodeMetrics::new(12.0, 0.25, 0.15)),
    ]
}
