//! Observable state of the suggestion request: idle, pending, resolved.
//!
//! Only one request may be in flight. Starting hands out a
//! [`PendingSuggestion`] guard; finishing it publishes the outcome, dropping it
//! unfinished (client went away) returns the tracker to idle. Clearing cancels
//! a pending request, so its outcome arrives for a superseded generation and
//! is discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;

use super::SuggestionOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SuggestionState {
    Idle,
    Pending { generation: u64 },
    Resolved { generation: u64, outcome: SuggestionOutcome },
}

impl SuggestionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SuggestionState::Pending { .. })
    }
}

pub struct SuggestionTracker {
    state: watch::Sender<SuggestionState>,
    generation: AtomicU64,
}

impl SuggestionTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SuggestionState::Idle);
        Self {
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> SuggestionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.state.subscribe()
    }

    /// Moves to pending, or returns `None` if a request is already in flight.
    pub fn try_begin(&self) -> Option<PendingSuggestion<'_>> {
        let mut started = None;
        self.state.send_if_modified(|state| {
            if state.is_pending() {
                return false;
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = SuggestionState::Pending { generation };
            started = Some(generation);
            true
        });

        started.map(|generation| PendingSuggestion {
            tracker: self,
            generation,
            done: false,
        })
    }

    /// Back to idle: forgets a resolved outcome or cancels a pending request
    /// (suggestion picked or token submitted).
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, SuggestionState::Idle) {
                return false;
            }
            *state = SuggestionState::Idle;
            true
        });
    }

    fn settle(&self, generation: u64, next: SuggestionState) -> bool {
        self.state.send_if_modified(|state| match state {
            SuggestionState::Pending { generation: current } if *current == generation => {
                *state = next;
                true
            }
            _ => false,
        })
    }
}

impl Default for SuggestionTracker {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PendingSuggestion<'a> {
    tracker: &'a SuggestionTracker,
    generation: u64,
    done: bool,
}

impl PendingSuggestion<'_> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Publishes the outcome. Returns false if this request was superseded.
    pub fn finish(mut self, outcome: SuggestionOutcome) -> bool {
        self.done = true;
        let generation = self.generation;
        let applied = self
            .tracker
            .settle(generation, SuggestionState::Resolved { generation, outcome });
        if !applied {
            tracing::debug!(generation, "discarding stale suggestion outcome");
        }
        applied
    }
}

impl Drop for PendingSuggestion<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.tracker.settle(self.generation, SuggestionState::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::{SuggestError, SuggestionContext, TimeOfDay};

    fn outcome() -> SuggestionOutcome {
        SuggestionOutcome::fallback(
            SuggestionContext {
                time_of_day: TimeOfDay::Morning,
                day_of_week: "Monday".into(),
            },
            &SuggestError::Disabled,
        )
    }

    #[test]
    fn test_starts_idle() {
        assert_eq!(SuggestionTracker::new().current(), SuggestionState::Idle);
    }

    #[test]
    fn test_second_request_refused_while_pending() {
        let tracker = SuggestionTracker::new();
        let first = tracker.try_begin().unwrap();
        assert!(tracker.current().is_pending());
        assert!(tracker.try_begin().is_none());

        assert!(first.finish(outcome()));
        assert!(matches!(tracker.current(), SuggestionState::Resolved { .. }));
        assert!(tracker.try_begin().is_some());
    }

    #[test]
    fn test_dropped_request_returns_to_idle() {
        let tracker = SuggestionTracker::new();
        {
            let _pending = tracker.try_begin().unwrap();
        }
        assert_eq!(tracker.current(), SuggestionState::Idle);
    }

    #[test]
    fn test_clear_forgets_resolved() {
        let tracker = SuggestionTracker::new();
        assert!(tracker.try_begin().unwrap().finish(outcome()));
        tracker.clear();
        assert_eq!(tracker.current(), SuggestionState::Idle);
    }

    #[test]
    fn test_cancelled_request_outcome_is_discarded() {
        let tracker = SuggestionTracker::new();
        let cancelled = tracker.try_begin().unwrap();
        tracker.clear();
        assert_eq!(tracker.current(), SuggestionState::Idle);

        assert!(!cancelled.finish(outcome()));
        assert_eq!(tracker.current(), SuggestionState::Idle);
    }

    #[test]
    fn test_late_outcome_does_not_clobber_newer_request() {
        let tracker = SuggestionTracker::new();
        let old = tracker.try_begin().unwrap();
        tracker.clear();
        let new = tracker.try_begin().unwrap();
        let current = new.generation();

        assert!(!old.finish(outcome()));
        assert_eq!(tracker.current(), SuggestionState::Pending { generation: current });

        assert!(new.finish(outcome()));
        assert!(matches!(
            tracker.current(),
            SuggestionState::Resolved { generation, .. } if generation == current
        ));
    }

    #[test]
    fn test_generations_increase() {
        let tracker = SuggestionTracker::new();
        let g1 = tracker.try_begin().unwrap().generation();
        let g2 = tracker.try_begin().unwrap().generation();
        assert!(g2 > g1);
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(SuggestionState::Pending { generation: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "pending", "generation": 3}));
    }

    #[tokio::test]
    async fn test_subscribers_see_resolution() {
        let tracker = SuggestionTracker::new();
        let mut rx = tracker.subscribe();
        let pending = tracker.try_begin().unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_pending());

        pending.finish(outcome());
        rx.changed().await.unwrap();
        assert!(matches!(*rx.borrow(), SuggestionState::Resolved { .. }));
    }
}
