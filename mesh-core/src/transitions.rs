//! Pure status transitions.
//!
//! Every change to a node goes through [`apply`], which takes a node and an
//! action and returns the next node. The store only decides *which* node to
//! transform and what to tell the user about it.

use crate::model::{Node, NodeMetrics, NodeStatus, SuggestedAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeAction {
    /// Manual compromise with fixed degraded metrics.
    InjectFault,
    /// Approved isolation suggestion.
    Isolate,
    /// Approved restore suggestion.
    Restore,
    /// Display name change. Does not refresh `last_updated`.
    Rename(String),
}

impl From<SuggestedAction> for NodeAction {
    fn from(action: SuggestedAction) -> Self {
        match action {
            SuggestedAction::Isolate => NodeAction::Isolate,
            SuggestedAction::Restore => NodeAction::Restore,
        }
    }
}

/// How approved comment actions are checked against the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Approval sets the status unconditionally.
    #[default]
    Authoritative,
    /// Only `compromised -> isolated` and `isolated -> restored` are allowed.
    Strict,
}

impl TransitionPolicy {
    /// Status the node moves to, or `None` if the policy forbids the move.
    pub fn target(&self, current: NodeStatus, action: SuggestedAction) -> Option<NodeStatus> {
        match self {
            TransitionPolicy::Authoritative => Some(unchecked_target(action)),
            TransitionPolicy::Strict => strict_target(current, action),
        }
    }
}

fn unchecked_target(action: SuggestedAction) -> NodeStatus {
    match action {
        SuggestedAction::Isolate => NodeStatus::Isolated,
        SuggestedAction::Restore => NodeStatus::Restored,
    }
}

/// The documented state machine for moderation actions.
pub fn strict_target(current: NodeStatus, action: SuggestedAction) -> Option<NodeStatus> {
    match (current, action) {
        (NodeStatus::Compromised, SuggestedAction::Isolate) => Some(NodeStatus::Isolated),
        (NodeStatus::Isolated, SuggestedAction::Restore) => Some(NodeStatus::Restored),
        _ => None,
    }
}

/// Returns the node that results from applying `action` at time `at`.
pub fn apply(node: &Node, action: &NodeAction, at: DateTime<Utc>) -> Node {
    let mut next = node.clone();
    match action {
        NodeAction::InjectFault => {
            next.set_status(NodeStatus::Compromised);
            next.set_metrics(NodeMetrics::DEGRADED);
            next.touch(at);
        }
        NodeAction::Isolate => {
            next.set_status(NodeStatus::Isolated);
            next.touch(at);
        }
        NodeAction::Restore => {
            next.set_status(NodeStatus::Restored);
            next.touch(at);
        }
        NodeAction::Rename(name) => next.set_name(name.clone()),
    }
    next
}
