use super::ids::{CommentId, NodeId};
use super::node::Node;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status change a commenter proposes for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    Isolate,
    Restore,
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestedAction::Isolate => f.write_str("isolate"),
            SuggestedAction::Restore => f.write_str("restore"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
}

/// A moderation comment attached to a node thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeComment {
    id: CommentId,
    node_id: NodeId,
    user_name: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<SuggestedAction>,
    status: CommentStatus,
    timestamp: DateTime<Utc>,
    #[serde(skip)]
    node_generation: u64,
}

impl NodeComment {
    pub fn new(
        node_id: NodeId,
        user_name: impl Into<String>,
        content: impl Into<String>,
        action: Option<SuggestedAction>,
    ) -> Self {
        Self {
            id: CommentId::generate(),
            node_id,
            user_name: user_name.into(),
            content: content.into(),
            action,
            status: CommentStatus::Pending,
            timestamp: Utc::now(),
            node_generation: 0,
        }
    }

    pub(crate) fn on_generation(mut self, generation: u64) -> Self {
        self.node_generation = generation;
        self
    }

    pub fn id(&self) -> &CommentId {
        &self.id
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Generation of the node instance this comment was written on.
    pub fn node_generation(&self) -> u64 {
        self.node_generation
    }

    /// True if `node` is the instance this comment was written on.
    pub fn is_on(&self, node: &Node) -> bool {
        &self.node_id == node.id() && self.node_generation == node.generation()
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn action(&self) -> Option<SuggestedAction> {
        self.action
    }

    pub fn status(&self) -> CommentStatus {
        self.status
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_pending(&self) -> bool {
        self.status == CommentStatus::Pending
    }

    /// Moves a pending comment to `status`. Returns false if already resolved.
    pub(crate) fn resolve(&mut self, status: CommentStatus) -> bool {
        if !self.is_pending() || status == CommentStatus::Pending {
            return false;
        }
        self.status = status;
        true
    }
}
