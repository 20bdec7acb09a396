use crate::allocator::IdAllocator;
use crate::bus::NotificationBus;
use crate::comments::CommentWorkflow;
use crate::config::{MeshConfig, SimulationSettings};
use crate::error::Result;
use crate::logs::{LogSlot, LogSource, LogTicket};
use crate::model::{CommentId, Node, NodeId, SuggestedAction};
use crate::store::{NodeStore, StoreSummary};
use crate::topology::Topology;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One simulation session: the node store, its moderation threads, the
/// notification log and the presentation state (selection, log slot, run flag).
///
/// Every method runs to completion; the only asynchronous step is the log
/// fetch, which is split into [`Simulation::select`] and
/// [`Simulation::complete_log_fetch`] so callers can await it without holding
/// the simulation.
#[derive(Debug)]
pub struct Simulation {
    store: NodeStore,
    comments: CommentWorkflow,
    bus: NotificationBus,
    ids: IdAllocator,
    selected: Option<NodeId>,
    log: LogSlot,
    running: bool,
    settings: SimulationSettings,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: &MeshConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic metric generation for tests and replays.
    pub fn with_seed(config: &MeshConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &MeshConfig, rng: StdRng) -> Self {
        let store = NodeStore::new(config.baseline_nodes()).with_policy(config.transition_policy);
        let ids = store.allocator();
        info!(
            "Simulation: {} baseline nodes, next id {}, {:?} transitions",
            store.len(),
            ids.peek(),
            store.policy()
        );
        Self {
            store,
            comments: CommentWorkflow::new(),
            bus: NotificationBus::with_capacity(config.notification_capacity),
            ids,
            selected: None,
            log: LogSlot::default(),
            running: false,
            settings: config.settings.clone(),
            rng,
        }
    }

    // --- Read side ---

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn nodes(&self) -> &[Node] {
        self.store.nodes()
    }

    pub fn comments(&self) -> &CommentWorkflow {
        &self.comments
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn selected_id(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// The selected node, if it still exists.
    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.as_ref().and_then(|id| self.store.get(id))
    }

    pub fn log_output(&self) -> Option<&str> {
        self.log.output()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn topology(&self) -> Topology {
        Topology::build(self.store.nodes())
    }

    pub fn summary(&self) -> StoreSummary {
        self.store.summary(self.settings.node_threshold)
    }

    // --- Node operations ---

    pub fn add_node(&mut self) -> Option<NodeId> {
        self.store.add(&mut self.ids, &mut self.bus, &mut self.rng)
    }

    pub fn rename_node(&mut self, id: &NodeId, name: &str) -> bool {
        self.store.rename(id, name, &mut self.bus)
    }

    /// Injects a fault into `target`, or into the selected node when `None`.
    pub fn inject_fault(&mut self, target: Option<&NodeId>) -> Result<bool> {
        let target = target.or(self.selected.as_ref()).cloned();
        self.store.inject_fault(target.as_ref(), &mut self.bus)
    }

    /// Back to the baseline: nodes, id seed, selection and log slot.
    pub fn reset(&mut self) {
        self.store.reset(&mut self.ids, &mut self.bus);
        self.clear_selection();
    }

    // --- Selection & logs ---

    /// Selects `id` and returns the ticket its log fetch must carry.
    /// Unknown ids leave the selection untouched.
    pub fn select(&mut self, id: &NodeId) -> Option<LogTicket> {
        if !self.store.contains(id) {
            debug!("Simulation: Cannot select missing node {}", id);
            return None;
        }
        self.selected = Some(id.clone());
        Some(self.log.begin(id.clone()))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.log.clear();
    }

    /// Writes a finished fetch into the log slot unless the selection moved on.
    pub fn complete_log_fetch(&mut self, ticket: &LogTicket, result: Result<String>) -> bool {
        self.log.complete(ticket, result)
    }

    /// Select-then-fetch for callers that own the simulation outright.
    pub async fn select_and_fetch(&mut self, id: &NodeId, source: &dyn LogSource) -> bool {
        let Some(ticket) = self.select(id) else {
            return false;
        };
        let result = source.fetch(ticket.node_id()).await;
        self.complete_log_fetch(&ticket, result)
    }

    // --- Moderation ---

    pub fn add_comment(
        &mut self,
        node_id: &NodeId,
        user_name: &str,
        content: &str,
        action: Option<SuggestedAction>,
    ) -> Option<CommentId> {
        self.comments
            .add_comment(&self.store, node_id, user_name, content, action, &mut self.bus)
    }

    pub fn approve_comment(&mut self, id: &CommentId) -> bool {
        self.comments.approve(id, &mut self.store, &mut self.bus)
    }

    pub fn reject_comment(&mut self, id: &CommentId) -> bool {
        self.comments.reject(id, &mut self.bus)
    }

    // --- Control panel ---

    /// Flips the run flag. Nothing is scheduled by it; it is reported only.
    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        let state = if self.running { "started" } else { "paused" };
        self.bus
            .info("Simulation Status", format!("Simulation {}", state));
        self.running
    }

    pub fn update_settings(&mut self, settings: SimulationSettings) {
        info!("Simulation: Settings updated {:?}", settings);
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use crate::model::NodeStatus;
    use async_trait::async_trait;

    fn sim() -> Simulation {
        Simulation::with_seed(&MeshConfig::default(), 1)
    }

    struct EchoSource;

    #[async_trait]
    impl LogSource for EchoSource {
        async fn fetch(&self, node: &NodeId) -> Result<String> {
            Ok(format!("log of {}", node))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl LogSource for FailingSource {
        async fn fetch(&self, node: &NodeId) -> Result<String> {
            Err(SimulationError::LogFetch {
                node: node.clone(),
                reason: "container not running".into(),
            })
        }
    }

    #[test]
    fn test_fault_targets_selection_by_default() {
        let mut s = sim();
        let two = NodeId::from("2");
        s.select(&two).unwrap();

        assert!(s.inject_fault(None).unwrap());
        assert_eq!(s.store().get(&two).unwrap().status(), NodeStatus::Compromised);
    }

    #[test]
    fn test_fault_without_selection_is_user_error() {
        let mut s = sim();
        assert!(matches!(s.inject_fault(None), Err(SimulationError::NoFaultTarget)));
        assert_eq!(s.notifications().latest().unwrap().title(), "Error");
    }

    #[test]
    fn test_reset_clears_selection_of_added_node() {
        let mut s = sim();
        let added = s.add_node().unwrap();
        s.select(&added).unwrap();

        s.reset();

        assert!(s.selected_id().is_none());
        assert!(s.selected_node().is_none());
        assert!(s.log_output().is_none());
        assert_eq!(s.nodes(), s.store().baseline());
    }

    #[test]
    fn test_select_missing_node_keeps_selection() {
        let mut s = sim();
        s.select(&NodeId::from("1")).unwrap();
        assert!(s.select(&NodeId::from("404")).is_none());
        assert_eq!(s.selected_id(), Some(&NodeId::from("1")));
    }

    #[test]
    fn test_toggle_reports_state() {
        let mut s = sim();
        assert!(s.toggle_running());
        assert_eq!(s.notifications().latest().unwrap().message(), "Simulation started");
        assert!(!s.toggle_running());
        assert_eq!(s.notifications().latest().unwrap().message(), "Simulation paused");
    }

    #[tokio::test]
    async fn test_select_and_fetch_fills_slot() {
        let mut s = sim();
        assert!(s.select_and_fetch(&NodeId::from("3"), &EchoSource).await);
        assert_eq!(s.log_output(), Some("log of 3"));
    }

    #[tokio::test]
    async fn test_failed_fetch_uses_placeholder_without_notification() {
        let mut s = sim();
        let before = s.notifications().len();

        assert!(s.select_and_fetch(&NodeId::from("1"), &FailingSource).await);

        assert_eq!(s.log_output(), Some(crate::logs::LOG_FETCH_FALLBACK));
        assert_eq!(s.notifications().len(), before);
    }

    #[tokio::test]
    async fn test_out_of_order_completion_is_discarded() {
        let mut s = sim();
        let a = s.select(&NodeId::from("1")).unwrap();
        let b = s.select(&NodeId::from("2")).unwrap();

        // B finishes first, then A's late answer arrives
        let rb = EchoSource.fetch(b.node_id()).await;
        assert!(s.complete_log_fetch(&b, rb));
        let ra = EchoSource.fetch(a.node_id()).await;
        assert!(!s.complete_log_fetch(&a, ra));

        assert_eq!(s.log_output(), Some("log of 2"));
    }
}
