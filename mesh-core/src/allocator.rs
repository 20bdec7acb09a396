use crate::model::NodeId;
use serde::{Deserialize, Serialize};

/// Monotonic source of node ids.
///
/// Seeded to continue right after the highest numeric id of the baseline, so
/// ids minted during a run never collide with a node still in the collection.
/// There is no global counter: callers pass the allocator explicitly to every
/// operation that creates nodes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    seed: u64,
    next: u64,
}

impl IdAllocator {
    pub fn new(seed: u64) -> Self {
        Self { seed, next: seed }
    }

    /// Allocator continuing after the highest numeric id in `ids`.
    /// Non-numeric ids are ignored; an empty set seeds at 1.
    ///
    /// Saturates at `u64::MAX`; configuration rejects baselines that reach it.
    pub fn after<'a>(ids: impl IntoIterator<Item = &'a NodeId>) -> Self {
        let highest = ids.into_iter().filter_map(NodeId::as_number).max();
        Self::new(highest.map_or(1, |n| n.saturating_add(1)))
    }

    /// Returns the current value as an id and advances.
    ///
    /// Once exhausted it keeps returning `u64::MAX`, which the store drops as
    /// a duplicate.
    pub fn next(&mut self) -> NodeId {
        let id = NodeId::new(self.next.to_string());
        self.next = self.next.saturating_add(1);
        id
    }

    /// The value the next call to [`IdAllocator::next`] will hand out.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restores the seed. Only the store's reset calls this.
    pub(crate) fn reset(&mut self) {
        self.next = self.seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_after_baseline() {
        let ids = vec![NodeId::from("1"), NodeId::from("3"), NodeId::from("2")];
        let mut allocator = IdAllocator::after(&ids);
        assert_eq!(allocator.seed(), 4);
        assert_eq!(allocator.next().as_str(), "4");
        assert_eq!(allocator.next().as_str(), "5");
    }

    #[test]
    fn test_non_numeric_ids_ignored() {
        let ids = vec![NodeId::from("gateway"), NodeId::from("9")];
        assert_eq!(IdAllocator::after(&ids).seed(), 10);
        assert_eq!(IdAllocator::after(&Vec::<NodeId>::new()).seed(), 1);
    }

    #[test]
    fn test_exhausted_allocator_does_not_wrap() {
        let ids = vec![NodeId::new(u64::MAX.to_string())];
        let mut allocator = IdAllocator::after(&ids);
        assert_eq!(allocator.seed(), u64::MAX);

        let max = u64::MAX.to_string();
        assert_eq!(allocator.next().as_str(), max);
        assert_eq!(allocator.next().as_str(), max);
        assert_eq!(allocator.peek(), u64::MAX);
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut allocator = IdAllocator::new(4);
        allocator.next();
        allocator.next();
        assert_eq!(allocator.peek(), 6);

        allocator.reset();
        assert_eq!(allocator.peek(), 4);
        assert_eq!(allocator.next().as_str(), "4");
    }
}
