//! Result gate: decides whether a result set is rendered right away or only
//! after the user confirms.
//!
//! The decision looks at the first result's row count only. Above the
//! threshold the results are parked until the user picks "all" or "partial".

use super::render::{render_results, RenderedTable};
use crate::engine::QueryResult;

/// The user's answer to the large-result prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Render every row of every result.
    ShowAll,
    /// Render at most `threshold` rows per result.
    ShowPartial,
}

/// Gate state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GateState {
    /// Nothing admitted since the last reset.
    #[default]
    Idle,
    /// Results parked until the user answers.
    AwaitingConfirmation(Vec<QueryResult>),
    /// The last admitted results were handed out for rendering.
    Rendering,
}

/// What the caller should do with admitted results.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Render these tables now.
    Render(Vec<RenderedTable>),
    /// Ask the user; `row_count` is the first result's size.
    Confirm { row_count: usize, threshold: usize },
}

/// The result gate state machine.
#[derive(Debug, Clone)]
pub struct ResultGate {
    threshold: usize,
    state: GateState,
}

impl ResultGate {
    /// Creates an idle gate with the given threshold.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            state: GateState::Idle,
        }
    }

    /// Row count above which confirmation is requested.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Current state.
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Whether results are waiting for a decision.
    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, GateState::AwaitingConfirmation(_))
    }

    /// Admits a fresh result list, replacing anything still pending.
    pub fn admit(&mut self, results: Vec<QueryResult>) -> GateOutcome {
        let first_rows = results.first().map(QueryResult::row_count).unwrap_or(0);

        if first_rows > self.threshold {
            self.state = GateState::AwaitingConfirmation(results);
            GateOutcome::Confirm {
                row_count: first_rows,
                threshold: self.threshold,
            }
        } else {
            self.state = GateState::Rendering;
            GateOutcome::Render(render_results(results, usize::MAX))
        }
    }

    /// Resolves a pending confirmation. Returns `None` when nothing is pending.
    pub fn resolve(&mut self, choice: Confirmation) -> Option<Vec<RenderedTable>> {
        match std::mem::take(&mut self.state) {
            GateState::AwaitingConfirmation(results) => {
                let cap = match choice {
                    Confirmation::ShowAll => usize::MAX,
                    Confirmation::ShowPartial => self.threshold,
                };
                self.state = GateState::Rendering;
                Some(render_results(results, cap))
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Drops any pending results; called when a new execution starts.
    pub fn reset(&mut self) {
        self.state = GateState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Value;

    fn result_with_rows(n: usize) -> QueryResult {
        QueryResult::new(
            vec!["n".to_string()],
            (0..n as i64).map(|i| vec![Value::Int(i)]).collect(),
        )
    }

    fn shown(tables: &[RenderedTable]) -> Vec<usize> {
        tables.iter().map(RenderedTable::shown_rows).collect()
    }

    #[test]
    fn at_threshold_renders_immediately() {
        let mut gate = ResultGate::new(5);
        match gate.admit(vec![result_with_rows(5), result_with_rows(9)]) {
            GateOutcome::Render(tables) => assert_eq!(shown(&tables), vec![5, 9]),
            other => panic!("Expected Render, got {other:?}"),
        }
        assert_eq!(gate.state(), &GateState::Rendering);
    }

    #[test]
    fn only_first_result_is_inspected() {
        let mut gate = ResultGate::new(5);
        let outcome = gate.admit(vec![result_with_rows(1), result_with_rows(500)]);
        match outcome {
            GateOutcome::Render(tables) => assert_eq!(shown(&tables), vec![1, 500]),
            other => panic!("Expected Render, got {other:?}"),
        }
    }

    #[test]
    fn empty_result_list_renders_nothing() {
        let mut gate = ResultGate::new(5);
        assert_eq!(gate.admit(Vec::new()), GateOutcome::Render(Vec::new()));
    }

    #[test]
    fn large_result_asks_then_partial_renders_threshold_rows() {
        let mut gate = ResultGate::new(5000);
        let outcome = gate.admit(vec![result_with_rows(12_000)]);
        assert_eq!(
            outcome,
            GateOutcome::Confirm {
                row_count: 12_000,
                threshold: 5000
            }
        );
        assert!(gate.is_awaiting());

        let tables = gate.resolve(Confirmation::ShowPartial).unwrap();
        assert_eq!(shown(&tables), vec![5000]);
        assert_eq!(tables[0].total_rows, 12_000);
        assert!(!gate.is_awaiting());
    }

    #[test]
    fn large_result_show_all_renders_everything() {
        let mut gate = ResultGate::new(5000);
        gate.admit(vec![result_with_rows(12_000)]);
        let tables = gate.resolve(Confirmation::ShowAll).unwrap();
        assert_eq!(shown(&tables), vec![12_000]);
    }

    #[test]
    fn partial_uses_min_of_threshold_and_rows_per_result() {
        let mut gate = ResultGate::new(10);
        gate.admit(vec![result_with_rows(11), result_with_rows(3), result_with_rows(40)]);
        let tables = gate.resolve(Confirmation::ShowPartial).unwrap();
        assert_eq!(shown(&tables), vec![10, 3, 10]);
    }

    #[test]
    fn resolve_without_pending_is_noop() {
        let mut gate = ResultGate::new(10);
        assert!(gate.resolve(Confirmation::ShowAll).is_none());
        assert_eq!(gate.state(), &GateState::Idle);

        gate.admit(vec![result_with_rows(1)]);
        assert!(gate.resolve(Confirmation::ShowPartial).is_none());
        assert_eq!(gate.state(), &GateState::Rendering);
    }

    #[test]
    fn reset_discards_pending_results() {
        let mut gate = ResultGate::new(2);
        gate.admit(vec![result_with_rows(3)]);
        gate.reset();
        assert_eq!(gate.state(), &GateState::Idle);
        assert!(gate.resolve(Confirmation::ShowAll).is_none());
    }

    #[test]
    fn new_admission_supersedes_pending() {
        let mut gate = ResultGate::new(2);
        gate.admit(vec![result_with_rows(3)]);
        let outcome = gate.admit(vec![result_with_rows(1)]);
        assert!(matches!(outcome, GateOutcome::Render(_)));
        assert!(!gate.is_awaiting());
    }
}
