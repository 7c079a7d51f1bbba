//! Lifecycle graphs for the engine's closed state enums.
//!
//! An implementor enumerates its outgoing edges once, as a static
//! successor table; edge membership, guarded moves, and terminality all
//! derive from that single table, so the graph cannot drift out of sync
//! with itself.

use std::fmt;
use thiserror::Error;

/// A move the lifecycle graph does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lifecycle does not permit {from:?} -> {to:?}")]
pub struct LifecycleError<S: fmt::Debug> {
    /// State the move started from.
    pub from: S,
    /// State the move aimed at.
    pub to: S,
}

/// Closed set of states with a fixed transition graph.
pub trait Lifecycle: Sized + Copy + Eq + fmt::Debug + 'static {
    /// States reachable from this one in a single move.
    fn successors(&self) -> &'static [Self];

    /// True when `next` is a direct successor of this state.
    fn permits(&self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    /// Moves to `next`, rejecting edges the graph does not contain.
    fn advance(self, next: Self) -> Result<Self, LifecycleError<Self>> {
        if self.permits(next) {
            Ok(next)
        } else {
            Err(LifecycleError {
                from: self,
                to: next,
            })
        }
    }

    /// A state with no successors never changes again.
    fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Queued,
        Working,
        Settled,
    }

    impl Lifecycle for Phase {
        fn successors(&self) -> &'static [Phase] {
            match self {
                Phase::Queued => &[Phase::Working],
                Phase::Working => &[Phase::Settled],
                Phase::Settled => &[],
            }
        }
    }

    #[test]
    fn permits_follows_the_successor_table() {
        assert!(Phase::Queued.permits(Phase::Working));
        assert!(!Phase::Queued.permits(Phase::Settled));
        assert!(!Phase::Settled.permits(Phase::Queued));
    }

    #[test]
    fn advance_returns_the_target_for_a_listed_edge() {
        assert_eq!(Phase::Queued.advance(Phase::Working), Ok(Phase::Working));
    }

    #[test]
    fn advance_rejects_an_unlisted_edge_naming_both_ends() {
        let err = Phase::Queued.advance(Phase::Settled).unwrap_err();
        assert_eq!(err.from, Phase::Queued);
        assert_eq!(err.to, Phase::Settled);
        assert!(err.to_string().contains("Queued"));
        assert!(err.to_string().contains("Settled"));
    }

    #[test]
    fn terminality_means_an_empty_successor_table() {
        assert!(Phase::Settled.is_terminal());
        assert!(!Phase::Queued.is_terminal());
        assert!(!Phase::Working.is_terminal());
    }
}
