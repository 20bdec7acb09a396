use crate::bus::NotificationBus;
use crate::model::{CommentId, CommentStatus, Node, NodeComment, NodeId, SuggestedAction};
use crate::store::NodeStore;
use log::{debug, info};
use std::collections::HashMap;

/// Moderation threads for every node.
///
/// Comments are kept in submission order and never reordered. A suggested
/// action reaches the node only when its comment is approved, and only once.
#[derive(Debug, Default, Clone)]
pub struct CommentWorkflow {
    comments: Vec<NodeComment>,
    // CommentId -> position in `comments`
    index: HashMap<CommentId, usize>,
}

impl CommentWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a pending comment on an existing node.
    ///
    /// Blank content and unknown nodes are ignored (`None`).
    pub fn add_comment(
        &mut self,
        store: &NodeStore,
        node_id: &NodeId,
        user_name: &str,
        content: &str,
        action: Option<SuggestedAction>,
        bus: &mut NotificationBus,
    ) -> Option<CommentId> {
        let content = content.trim();
        if content.is_empty() {
            debug!("Comments: Ignoring blank comment on node {}", node_id);
            return None;
        }
        let Some(node) = store.get(node_id) else {
            debug!("Comments: Node {} not found, comment dropped", node_id);
            return None;
        };

        let comment = NodeComment::new(node_id.clone(), user_name, content, action)
            .on_generation(node.generation());
        let id = comment.id().clone();
        bus.info(
            "Comment Added",
            format!("{} commented on {}", display_user(user_name), node.label()),
        );

        self.index.insert(id.clone(), self.comments.len());
        self.comments.push(comment);
        Some(id)
    }

    /// Approves a pending comment and applies its action, if any.
    ///
    /// The action reaches only the node instance the comment was written on.
    /// If a reset removed that instance the comment is resolved and no node
    /// changes, even when a newer node reuses the id.
    ///
    /// Returns false (and does nothing) if the comment is unknown or resolved.
    pub fn approve(
        &mut self,
        id: &CommentId,
        store: &mut NodeStore,
        bus: &mut NotificationBus,
    ) -> bool {
        let Some(comment) = self.pending_mut(id) else {
            return false;
        };
        comment.resolve(CommentStatus::Approved);
        let node_id = comment.node_id().clone();
        let generation = comment.node_generation();
        let action = comment.action();
        let user = display_user(comment.user_name()).to_string();

        let label = store
            .resolve(&node_id, generation)
            .map(Node::label)
            .unwrap_or_else(|| format!("Node {}", node_id));

        match action {
            Some(action) => {
                let applied = store.apply_action(&node_id, generation, action);
                info!(
                    "Comments: Approved {} on node {} (applied: {})",
                    action, node_id, applied
                );
                let outcome = if applied {
                    match action {
                        SuggestedAction::Isolate => format!("{} has been isolated", label),
                        SuggestedAction::Restore => format!("{} has been restored", label),
                    }
                } else {
                    format!("{} left unchanged", label)
                };
                let message = format!("{}'s suggestion to {}: {}", user, action, outcome);
                match action {
                    SuggestedAction::Isolate => bus.info("Comment Approved", message),
                    SuggestedAction::Restore => bus.success("Comment Approved", message),
                };
            }
            None => {
                info!("Comments: Approved comment {} on node {}", id, node_id);
                bus.success(
                    "Comment Approved",
                    format!("{}'s comment on {} approved", user, label),
                );
            }
        }
        true
    }

    /// Rejects a pending comment. Never touches any node.
    pub fn reject(&mut self, id: &CommentId, bus: &mut NotificationBus) -> bool {
        let Some(comment) = self.pending_mut(id) else {
            return false;
        };
        comment.resolve(CommentStatus::Rejected);
        info!("Comments: Rejected comment {}", id);
        let message = match comment.action() {
            Some(action) => format!(
                "{}'s suggestion to {} Node {} was rejected",
                display_user(comment.user_name()),
                action,
                comment.node_id()
            ),
            None => format!(
                "{}'s comment on Node {} was rejected",
                display_user(comment.user_name()),
                comment.node_id()
            ),
        };
        bus.error("Comment Rejected", message);
        true
    }

    // --- Read side ---

    pub fn get(&self, id: &CommentId) -> Option<&NodeComment> {
        self.index.get(id).map(|&i| &self.comments[i])
    }

    /// Every comment, in submission order.
    pub fn all(&self) -> &[NodeComment] {
        &self.comments
    }

    /// The thread of `node`, in submission order. Comments left on an earlier
    /// node with the same id are not part of it.
    pub fn comments_for<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a NodeComment> {
        self.comments.iter().filter(move |c| c.is_on(node))
    }

    pub fn pending(&self) -> impl Iterator<Item = &NodeComment> {
        self.comments.iter().filter(|c| c.is_pending())
    }

    /// Comments whose node instance was removed by a reset.
    pub fn orphans<'a>(&'a self, store: &'a NodeStore) -> impl Iterator<Item = &'a NodeComment> {
        self.comments
            .iter()
            .filter(move |c| store.resolve(c.node_id(), c.node_generation()).is_none())
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    fn pending_mut(&mut self, id: &CommentId) -> Option<&mut NodeComment> {
        let Some(&i) = self.index.get(id) else {
            debug!("Comments: Unknown comment {}", id);
            return None;
        };
        let comment = &mut self.comments[i];
        if !comment.is_pending() {
            debug!("Comments: Comment {} already {:?}", id, comment.status());
            return None;
        }
        Some(comment)
    }
}

fn display_user(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() {
        "Anonymous"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::IdAllocator;
    use crate::config::default_baseline;
    use crate::model::{NodeStatus, Severity};

    fn setup() -> (CommentWorkflow, NodeStore, NotificationBus) {
        (
            CommentWorkflow::new(),
            NodeStore::new(default_baseline()),
            NotificationBus::new(),
        )
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_blank_content_rejected() {
        let (mut wf, store, mut bus) = setup();
        assert!(wf
            .add_comment(&store, &id("1"), "ana", "   \n\t", None, &mut bus)
            .is_none());
        assert!(wf.is_empty());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_unknown_node_rejected() {
        let (mut wf, store, mut bus) = setup();
        assert!(wf
            .add_comment(&store, &id("9"), "ana", "hello", None, &mut bus)
            .is_none());
        assert!(wf.is_empty());
    }

    #[test]
    fn test_submission_does_not_touch_node() {
        let (mut wf, store, mut bus) = setup();
        let before = store.nodes().to_vec();

        let cid = wf
            .add_comment(&store, &id("1"), "ana", " isolate ", Some(SuggestedAction::Isolate), &mut bus)
            .unwrap();

        assert_eq!(store.nodes(), before.as_slice());
        let comment = wf.get(&cid).unwrap();
        assert_eq!(comment.status(), CommentStatus::Pending);
        assert_eq!(comment.content(), "isolate");
    }

    #[test]
    fn test_approve_isolate_changes_only_target_status() {
        let (mut wf, mut store, mut bus) = setup();
        let before = store.nodes().to_vec();
        let cid = wf
            .add_comment(&store, &id("2"), "ana", "cut it off", Some(SuggestedAction::Isolate), &mut bus)
            .unwrap();

        assert!(wf.approve(&cid, &mut store, &mut bus));

        for (old, new) in before.iter().zip(store.nodes()) {
            if new.id() == &id("2") {
                assert_eq!(new.status(), NodeStatus::Isolated);
                assert_eq!(new.metrics(), old.metrics());
                assert_eq!(new.name(), old.name());
            } else {
                assert_eq!(new, old);
            }
        }
        assert_eq!(wf.get(&cid).unwrap().status(), CommentStatus::Approved);
        assert_eq!(bus.latest().unwrap().title(), "Comment Approved");
    }

    #[test]
    fn test_approve_is_idempotent() {
        let (mut wf, mut store, mut bus) = setup();
        let cid = wf
            .add_comment(&store, &id("1"), "ana", "restore", Some(SuggestedAction::Restore), &mut bus)
            .unwrap();

        assert!(wf.approve(&cid, &mut store, &mut bus));
        let after_first = store.nodes().to_vec();
        let notifications = bus.len();

        assert!(!wf.approve(&cid, &mut store, &mut bus));
        assert!(!wf.reject(&cid, &mut bus));

        assert_eq!(store.nodes(), after_first.as_slice());
        assert_eq!(bus.len(), notifications);
        assert_eq!(wf.get(&cid).unwrap().status(), CommentStatus::Approved);
        assert_eq!(
            bus.latest().unwrap().severity(),
            Severity::Success,
            "approve-restore is corrective"
        );
    }

    #[test]
    fn test_reject_leaves_nodes_unchanged() {
        let (mut wf, mut store, mut bus) = setup();
        let before = store.nodes().to_vec();
        let cid = wf
            .add_comment(&store, &id("3"), "bo", "isolate", Some(SuggestedAction::Isolate), &mut bus)
            .unwrap();

        assert!(wf.reject(&cid, &mut bus));
        assert!(!wf.approve(&cid, &mut store, &mut bus));

        assert_eq!(store.nodes(), before.as_slice());
        assert_eq!(wf.get(&cid).unwrap().status(), CommentStatus::Rejected);
        assert_eq!(bus.latest().unwrap().severity(), Severity::Error);
    }

    #[test]
    fn test_threads_keep_submission_order() {
        let (mut wf, mut store, mut bus) = setup();
        let first = wf
            .add_comment(&store, &id("1"), "a", "one", None, &mut bus)
            .unwrap();
        wf.add_comment(&store, &id("2"), "b", "other node", None, &mut bus);
        let third = wf
            .add_comment(&store, &id("1"), "c", "three", None, &mut bus)
            .unwrap();

        wf.approve(&third, &mut store, &mut bus);

        let node = store.get(&id("1")).unwrap();
        let thread: Vec<_> = wf.comments_for(node).map(|c| c.id().clone()).collect();
        assert_eq!(thread, vec![first, third]);
        assert_eq!(wf.pending().count(), 2);
    }

    #[test]
    fn test_orphaned_comment_approval_is_safe() {
        let (mut wf, mut store, mut bus) = setup();
        let mut ids = store.allocator();
        let mut rng = rand::thread_rng();
        let added = store.add(&mut ids, &mut bus, &mut rng).unwrap();
        let cid = wf
            .add_comment(&store, &added, "ana", "isolate", Some(SuggestedAction::Isolate), &mut bus)
            .unwrap();

        store.reset(&mut ids, &mut bus);
        assert_eq!(wf.orphans(&store).count(), 1);

        assert!(wf.approve(&cid, &mut store, &mut bus));
        assert_eq!(store.nodes(), store.baseline());
        assert_eq!(wf.get(&cid).unwrap().status(), CommentStatus::Approved);
    }

    #[test]
    fn test_comment_on_removed_node_never_reaches_reused_id() {
        let (mut wf, mut store, mut bus) = setup();
        let mut ids = store.allocator();
        let mut rng = rand::thread_rng();

        let old = store.add(&mut ids, &mut bus, &mut rng).unwrap();
        store.inject_fault(Some(&old), &mut bus).unwrap();
        let cid = wf
            .add_comment(&store, &old, "ana", "isolate", Some(SuggestedAction::Isolate), &mut bus)
            .unwrap();

        store.reset(&mut ids, &mut bus);
        let fresh = store.add(&mut ids, &mut bus, &mut rng).unwrap();
        assert_eq!(fresh, old);

        // Still an orphan, and not part of the new node's thread
        assert_eq!(wf.orphans(&store).count(), 1);
        let node = store.get(&fresh).unwrap();
        assert_eq!(wf.comments_for(node).count(), 0);

        assert!(wf.approve(&cid, &mut store, &mut bus));
        assert_eq!(store.get(&fresh).unwrap().status(), NodeStatus::Healthy);
        assert_eq!(wf.get(&cid).unwrap().status(), CommentStatus::Approved);
        assert!(bus.latest().unwrap().message().ends_with("left unchanged"));
    }

    #[test]
    fn test_baseline_threads_survive_reset() {
        let (mut wf, mut store, mut bus) = setup();
        let mut ids = store.allocator();
        let cid = wf
            .add_comment(&store, &id("2"), "ana", "watch this one", Some(SuggestedAction::Isolate), &mut bus)
            .unwrap();

        store.reset(&mut ids, &mut bus);

        assert_eq!(wf.orphans(&store).count(), 0);
        assert!(wf.approve(&cid, &mut store, &mut bus));
        assert_eq!(store.get(&id("2")).unwrap().status(), NodeStatus::Isolated);
    }
}
