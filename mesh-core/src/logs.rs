//! Node log fetching.
//!
//! Selecting a node starts a fetch tagged with that node's id. When the fetch
//! completes, its text lands in the [`LogSlot`] only if the same node is still
//! selected; anything else is a stale result and is dropped.

use crate::error::{Result, SimulationError};
use crate::model::NodeId;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Shown in the slot when a fetch fails.
pub const LOG_FETCH_FALLBACK: &str = "Error fetching log output";

/// Body of the `/run-log{N}` endpoint: `{"output": ..}` or `{"error": ..}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogResponse {
    pub fn output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Anything that can produce log text for a node.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch(&self, node: &NodeId) -> Result<String>;
}

/// Fetches logs from the log collaborator over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLogSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLogSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, node: &NodeId) -> String {
        format!("{}/run-log{}", self.base_url.trim_end_matches('/'), node)
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch(&self, node: &NodeId) -> Result<String> {
        let url = self.url_for(node);
        debug!("Logs: GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body: LogResponse = response.json().await?;

        match (status.is_success(), body) {
            (
                true,
                LogResponse {
                    output: Some(output),
                    ..
                },
            ) => Ok(output),
            (_, body) => Err(SimulationError::LogFetch {
                node: node.clone(),
                reason: body.error.unwrap_or_else(|| format!("HTTP {}", status)),
            }),
        }
    }
}

/// Proof that a fetch was started for a particular selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTicket {
    node_id: NodeId,
}

impl LogTicket {
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }
}

/// The single "current log output" slot of the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSlot {
    node_id: Option<NodeId>,
    output: Option<String>,
}

impl LogSlot {
    pub fn node_id(&self) -> Option<&NodeId> {
        self.node_id.as_ref()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Points the slot at `node_id` and issues the ticket its fetch must carry.
    pub(crate) fn begin(&mut self, node_id: NodeId) -> LogTicket {
        if self.node_id.as_ref() != Some(&node_id) {
            self.output = None;
        }
        self.node_id = Some(node_id.clone());
        LogTicket { node_id }
    }

    /// Stores a fetch result. Returns false if the ticket is stale.
    pub(crate) fn complete(&mut self, ticket: &LogTicket, result: Result<String>) -> bool {
        if self.node_id.as_ref() != Some(&ticket.node_id) {
            debug!(
                "Logs: Discarding stale result for node {} (selected: {:?})",
                ticket.node_id, self.node_id
            );
            return false;
        }
        self.output = Some(match result {
            Ok(output) => output,
            Err(e) => {
                warn!("Logs: Fetch for node {} failed: {}", ticket.node_id, e);
                LOG_FETCH_FALLBACK.to_string()
            }
        });
        true
    }

    pub(crate) fn clear(&mut self) {
        self.node_id = None;
        self.output = None;
    }
}
