//! Visited-Wire Record
//!
//! Tracks which wires have already fired during one propagation run.
//! Membership tests are O(1); visit order is kept for diagnostics.

use indexmap::IndexSet;

use crate::config::{VisitedStrategy, DEFAULT_MAX_VISITED_WIRES};
use crate::error::{Capacity, CircuitError, Result};
use crate::graph::WireId;

/// The set of wires visited in the current run.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    wires: IndexSet<WireId>,
    limit: Option<usize>,
}

impl VisitedSet {
    /// Create an empty set.
    ///
    /// At most `DEFAULT_MAX_VISITED_WIRES` slots are reserved up front; a
    /// larger bound grows on demand.
    pub fn new(strategy: VisitedStrategy) -> Self {
        let limit = strategy.limit();
        let reserved = limit.unwrap_or_default().min(DEFAULT_MAX_VISITED_WIRES);
        Self {
            wires: IndexSet::with_capacity(reserved),
            limit,
        }
    }

    /// Forget every visit.
    pub fn reset(&mut self) {
        self.wires.clear();
    }

    pub fn contains(&self, wire: WireId) -> bool {
        self.wires.contains(&wire)
    }

    /// Record a visit. Returns `false` if the wire was already visited.
    ///
    /// Fails with `CapacityExceeded` when a bounded set is full.
    pub fn insert(&mut self, wire: WireId) -> Result<bool> {
        if self.wires.contains(&wire) {
            return Ok(false);
        }
        if let Some(limit) = self.limit {
            if self.wires.len() >= limit {
                return Err(CircuitError::CapacityExceeded {
                    what: Capacity::VisitedWires,
                    limit,
                });
            }
        }
        self.wires.insert(wire);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.wires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    /// Visited wires in first-visit order.
    pub fn iter(&self) -> impl Iterator<Item = WireId> + '_ {
        self.wires.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_first_visit_only() {
        let mut visited = VisitedSet::new(VisitedStrategy::Unbounded);
        assert!(visited.insert(WireId::from(3)).unwrap());
        assert!(!visited.insert(WireId::from(3)).unwrap());
        assert!(visited.contains(WireId::from(3)));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn visit_order_is_preserved() {
        let mut visited = VisitedSet::default();
        for raw in [5, 1, 4, 1] {
            visited.insert(WireId::from(raw)).unwrap();
        }
        let order: Vec<_> = visited.iter().map(|w| w.index()).collect();
        assert_eq!(order, vec![5, 1, 4]);
    }

    #[test]
    fn bounded_set_overflows() {
        let mut visited = VisitedSet::new(VisitedStrategy::Bounded { capacity: 2 });
        visited.insert(WireId::from(0)).unwrap();
        visited.insert(WireId::from(1)).unwrap();

        // Revisiting never counts against the limit.
        assert!(!visited.insert(WireId::from(1)).unwrap());

        let err = visited.insert(WireId::from(2)).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::CapacityExceeded {
                what: Capacity::VisitedWires,
                limit: 2
            }
        ));
    }

    #[test]
    fn huge_bound_does_not_reserve_up_front() {
        let mut visited = VisitedSet::new(VisitedStrategy::Bounded {
            capacity: usize::MAX,
        });
        assert!(visited.wires.capacity() < 1024);
        assert!(visited.insert(WireId::from(0)).unwrap());
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut visited = VisitedSet::new(VisitedStrategy::default());
        visited.insert(WireId::from(0)).unwrap();
        visited.reset();
        assert!(visited.is_empty());
        assert!(!visited.contains(WireId::from(0)));
    }
}
