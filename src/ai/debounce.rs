use std::time::{Duration, Instant};

use crate::categorize::Suggestion;
use crate::models::TxnType;

/// A suggestion the caller should compute, tagged so its answer can be
/// matched back to the input that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SuggestionRequest {
    pub(crate) generation: u64,
    pub(crate) item: String,
    pub(crate) kind: TxnType,
}

/// Debounced live suggestions for a text field.
///
/// Each keystroke re-arms the deadline. Once it passes, `poll` hands out one
/// request at a time; a result is applied only if it belongs to the latest
/// request and the input has not changed since it was sent.
pub(crate) struct SuggestionTracker {
    delay: Duration,
    item: String,
    kind: TxnType,
    deadline: Option<Instant>,
    generation: u64,
    in_flight: bool,
    sent: Option<(String, TxnType)>,
    current: Option<Suggestion>,
}

impl SuggestionTracker {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            item: String::new(),
            kind: TxnType::Expense,
            deadline: None,
            generation: 0,
            in_flight: false,
            sent: None,
            current: None,
        }
    }

    pub(crate) fn input(&mut self, item: &str, kind: TxnType, now: Instant) {
        let item = item.trim();
        if item == self.item && kind == self.kind {
            return;
        }
        self.item = item.to_string();
        self.kind = kind;
        self.current = None;
        self.deadline = (!item.is_empty()).then(|| now + self.delay);
    }

    /// Next request to dispatch, if the input has settled and nothing is in flight.
    pub(crate) fn poll(&mut self, now: Instant) -> Option<SuggestionRequest> {
        if self.in_flight {
            return None;
        }
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.generation += 1;
        self.in_flight = true;
        self.sent = Some((self.item.clone(), self.kind));
        Some(SuggestionRequest {
            generation: self.generation,
            item: self.item.clone(),
            kind: self.kind,
        })
    }

    /// Returns whether `suggestion` was applied.
    pub(crate) fn complete(&mut self, generation: u64, suggestion: Suggestion) -> bool {
        self.in_flight = false;
        let unchanged = self
            .sent
            .as_ref()
            .is_some_and(|(item, kind)| *item == self.item && *kind == self.kind);
        if generation != self.generation || !unchanged {
            tracing::debug!(generation, latest = self.generation, "Discarding stale suggestion");
            return false;
        }
        self.current = Some(suggestion);
        true
    }

    pub(crate) fn current(&self) -> Option<&Suggestion> {
        self.current.as_ref()
    }

    pub(crate) fn reset(&mut self) {
        self.item.clear();
        self.deadline = None;
        self.sent = None;
        self.current = None;
    }
}
