use crate::allocator::IdAllocator;
use crate::bus::NotificationBus;
use crate::error::{Result, SimulationError};
use crate::model::{Node, NodeId, NodeMetrics, NodeStatus, SuggestedAction};
use crate::transitions::{self, NodeAction, TransitionPolicy};
use chrono::Utc;
use log::{debug, error, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(test)]
mod tests;

/// Counts of nodes per status, plus how many sit at or above the anomaly threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub total: usize,
    pub by_status: HashMap<NodeStatus, usize>,
    pub at_risk: usize,
}

/// Owns the node collection and the baseline it resets to.
///
/// Operations that are user-visible push exactly one notification onto the
/// bus they are handed. Operations targeting unknown ids are no-ops.
#[derive(Debug, Clone)]
pub struct NodeStore {
    nodes: Vec<Node>,
    baseline: Vec<Node>,
    policy: TransitionPolicy,
    // Bumped by every reset; stamped on nodes added afterwards
    generation: u64,
}

impl NodeStore {
    /// Creates a store whose current collection is a copy of `baseline`.
    pub fn new(baseline: Vec<Node>) -> Self {
        Self {
            nodes: baseline.clone(),
            baseline,
            policy: TransitionPolicy::default(),
            generation: 0,
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Allocator seeded to continue after this store's baseline.
    pub fn allocator(&self) -> IdAllocator {
        IdAllocator::after(self.baseline.iter().map(Node::id))
    }

    // --- Read side ---

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn baseline(&self) -> &[Node] {
        &self.baseline
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// The node `id` only if it is still the instance from `generation`.
    pub fn resolve(&self, id: &NodeId, generation: u64) -> Option<&Node> {
        self.get(id).filter(|n| n.generation() == generation)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn summary(&self, threshold: f64) -> StoreSummary {
        let mut summary = StoreSummary {
            total: self.nodes.len(),
            ..Default::default()
        };
        for node in &self.nodes {
            *summary.by_status.entry(node.status()).or_insert(0) += 1;
            if node.metrics().anomaly_score >= threshold {
                summary.at_risk += 1;
            }
        }
        summary
    }

    // --- Operations ---

    /// Adds a healthy node with fresh random metrics.
    ///
    /// Returns `None`, and adds nothing, if the allocator produced an id
    /// already in the collection.
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        ids: &mut IdAllocator,
        bus: &mut NotificationBus,
        rng: &mut R,
    ) -> Option<NodeId> {
        let id = ids.next();
        if self.contains(&id) {
            error!("Store: Duplicate node id '{}' from allocator. Add dropped.", id);
            return None;
        }

        let node =
            Node::healthy(id.clone(), NodeMetrics::random(rng)).in_generation(self.generation);
        info!("Store: Added node {} ({:?})", id, node.metrics());
        self.nodes.push(node);

        bus.info(
            "Node Added",
            format!("Node {} has been added to the network", id),
        );
        Some(id)
    }

    /// Replaces the display name as given. Blank names and unknown ids are ignored.
    pub fn rename(&mut self, id: &NodeId, new_name: &str, bus: &mut NotificationBus) -> bool {
        if new_name.trim().is_empty() {
            debug!("Store: Ignoring blank rename for node {}", id);
            return false;
        }
        if !self.transform(id, &NodeAction::Rename(new_name.to_string())) {
            debug!("Store: Rename target {} not found", id);
            return false;
        }

        bus.success(
            "Node Updated",
            format!("Node {} renamed to {}", id, new_name),
        );
        true
    }

    /// Compromises `target` with the fixed degraded metrics.
    ///
    /// With no target the user is told to pick one and
    /// [`SimulationError::NoFaultTarget`] is returned. An unknown id is a no-op
    /// (`Ok(false)`).
    pub fn inject_fault(
        &mut self,
        target: Option<&NodeId>,
        bus: &mut NotificationBus,
    ) -> Result<bool> {
        let Some(id) = target else {
            bus.error("Error", "Please select a node to inject fault");
            return Err(SimulationError::NoFaultTarget);
        };

        if !self.transform(id, &NodeAction::InjectFault) {
            warn!("Store: Fault target {} not found", id);
            return Ok(false);
        }

        info!("Store: Fault injected into node {}", id);
        bus.error("Fault Injected", format!("Node {} has been compromised", id));
        Ok(true)
    }

    /// Restores the baseline snapshot and the allocator seed.
    ///
    /// Selection lives in the presentation state; see
    /// [`crate::Simulation::reset`], which clears it alongside this call.
    pub fn reset(&mut self, ids: &mut IdAllocator, bus: &mut NotificationBus) {
        self.nodes = self.baseline.clone();
        self.generation = self.generation.saturating_add(1);
        ids.reset();
        info!(
            "Store: Reset to baseline ({} nodes, next id {})",
            self.nodes.len(),
            ids.peek()
        );
        bus.info("Simulation Reset", "All nodes restored to initial state");
    }

    /// Applies an approved moderation action. Only the comment workflow calls this.
    ///
    /// Returns false if the node instance from `generation` is gone or the
    /// policy forbids the move. No notification is emitted here; the approval
    /// itself reports the outcome.
    pub(crate) fn apply_action(
        &mut self,
        id: &NodeId,
        generation: u64,
        action: SuggestedAction,
    ) -> bool {
        let Some(current) = self.resolve(id, generation).map(Node::status) else {
            debug!(
                "Store: Action {} on missing node {} (generation {})",
                action, id, generation
            );
            return false;
        };

        if self.policy.target(current, action).is_none() {
            warn!(
                "Store: {:?} policy forbids '{}' on node {} ({})",
                self.policy, action, id, current
            );
            return false;
        }

        self.transform(id, &NodeAction::from(action))
    }

    /// Replaces the node `id` with the result of `action`. False if absent.
    fn transform(&mut self, id: &NodeId, action: &NodeAction) -> bool {
        let at = Utc::now();
        match self.nodes.iter_mut().find(|n| n.id() == id) {
            Some(node) => {
                *node = transitions::apply(node, action, at);
                true
            }
            None => false,
        }
    }
}
