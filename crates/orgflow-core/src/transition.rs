//! Legal state transitions for structure change requests.
//!
//! The graph is a fixed adjacency table. [`TransitionTable`] is built
//! once (usually via `Default`) and consulted by value; it is never
//! mutated after construction.

use std::collections::{HashMap, HashSet};

use crate::models::change_request::ChangeRequestStatus::{self, *};

/// Current status -> statuses it may move to.
static STANDARD_TRANSITIONS: &[(ChangeRequestStatus, &[ChangeRequestStatus])] = &[
    (Draft, &[Submitted, Canceled]),
    (Submitted, &[UnderReview, Canceled]),
    (UnderReview, &[Approved, Rejected, Canceled]),
    (Approved, &[Implemented]),
    (Rejected, &[]),
    (Canceled, &[]),
    (Implemented, &[]),
];

#[derive(Debug, Clone)]
pub struct TransitionTable {
    edges: HashMap<ChangeRequestStatus, HashSet<ChangeRequestStatus>>,
}

impl TransitionTable {
    /// Build a table from explicit edges. Statuses absent from `edges`
    /// are terminal.
    pub fn from_edges(edges: &[(ChangeRequestStatus, &[ChangeRequestStatus])]) -> Self {
        let edges = edges
            .iter()
            .map(|(from, to)| (*from, to.iter().copied().collect()))
            .collect();
        Self { edges }
    }

    pub fn can_transition(&self, from: ChangeRequestStatus, to: ChangeRequestStatus) -> bool {
        self.edges
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Legal next statuses, in declaration order of [`ChangeRequestStatus::ALL`].
    pub fn allowed_from(&self, from: ChangeRequestStatus) -> Vec<ChangeRequestStatus> {
        ChangeRequestStatus::ALL
            .into_iter()
            .filter(|to| self.can_transition(from, *to))
            .collect()
    }

    pub fn is_terminal(&self, status: ChangeRequestStatus) -> bool {
        self.edges.get(&status).is_none_or(HashSet::is_empty)
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::from_edges(STANDARD_TRANSITIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_matches_lifecycle() {
        let table = TransitionTable::default();
        assert_eq!(table.allowed_from(Draft), vec![Submitted, Canceled]);
        assert_eq!(table.allowed_from(Submitted), vec![UnderReview, Canceled]);
        assert_eq!(
            table.allowed_from(UnderReview),
            vec![Approved, Rejected, Canceled]
        );
        assert_eq!(table.allowed_from(Approved), vec![Implemented]);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let table = TransitionTable::default();
        for status in [Rejected, Canceled, Implemented] {
            assert!(table.is_terminal(status), "{status} should be terminal");
            for to in ChangeRequestStatus::ALL {
                assert!(!table.can_transition(status, to));
            }
        }
        assert!(!table.is_terminal(Approved));
    }

    #[test]
    fn submitted_cannot_skip_review() {
        let table = TransitionTable::default();
        assert!(!table.can_transition(Submitted, Approved));
        assert!(!table.can_transition(Implemented, Draft));
        assert!(!table.can_transition(Draft, Draft));
    }
}
