//! Prediction lifecycle: `Idle → Predicting → Ready(result)` or `Failed`.
//!
//! Entering `Ready` is the single place that produces a [`Navigation`] to
//! the results tab. Only one prediction may be in flight; a second
//! `begin` is rejected with `Busy`. Each `begin` hands out a fresh
//! [`Ticket`], and a completion carrying any other ticket is discarded,
//! so a cleared or superseded request can never overwrite newer state.
//!
//! The last successful result stays current through later `Predicting`
//! and `Failed` states until it is replaced or cleared.

use crate::models::{PredictionResult, UploadKind};

use super::{DashboardError, Tab};

/// Identifies one prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Which submit path started the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    Manual,
    Upload(UploadKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionState {
    Idle,
    Predicting {
        ticket: Ticket,
        source: PredictionSource,
    },
    Ready(Box<PredictionResult>),
    Failed(String),
}

/// Where the view should go after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub tab: Tab,
    pub scroll_to_top: bool,
}

impl Navigation {
    fn to_results() -> Self {
        Self {
            tab: Tab::AdrPredictions,
            scroll_to_top: true,
        }
    }
}

/// Outcome of [`PredictionTracker::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Ready(Navigation),
    Failed,
    /// The ticket was not the one in flight; nothing changed.
    Stale,
}

#[derive(Debug)]
pub struct PredictionTracker {
    state: PredictionState,
    /// Result carried over from a `Ready` state left by `begin`.
    last_result: Option<Box<PredictionResult>>,
    next_ticket: u64,
}

impl Default for PredictionTracker {
    fn default() -> Self {
        Self {
            state: PredictionState::Idle,
            last_result: None,
            next_ticket: 1,
        }
    }
}

impl PredictionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PredictionState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, PredictionState::Predicting { .. })
    }

    pub fn current(&self) -> Option<&PredictionResult> {
        match &self.state {
            PredictionState::Ready(result) => Some(result.as_ref()),
            _ => self.last_result.as_deref(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            PredictionState::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Enter `Predicting`, or refuse while another request is in flight.
    pub fn begin(&mut self, source: PredictionSource) -> Result<Ticket, DashboardError> {
        if self.is_busy() {
            return Err(DashboardError::Busy);
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let previous = std::mem::replace(
            &mut self.state,
            PredictionState::Predicting { ticket, source },
        );
        if let PredictionState::Ready(result) = previous {
            self.last_result = Some(result);
        }
        Ok(ticket)
    }

    /// Apply the response for `ticket`. Leaves `Predicting` whatever the outcome.
    pub fn finish(&mut self, ticket: Ticket, outcome: Result<PredictionResult, String>) -> Completion {
        match self.state {
            PredictionState::Predicting { ticket: current, .. } if current == ticket => {}
            _ => {
                tracing::debug!(?ticket, "Discarding stale prediction response");
                return Completion::Stale;
            }
        }

        match outcome {
            Ok(result) => {
                self.last_result = None;
                self.state = PredictionState::Ready(Box::new(result));
                Completion::Ready(Navigation::to_results())
            }
            Err(message) => {
                self.state = PredictionState::Failed(message);
                Completion::Failed
            }
        }
    }

    /// Show an already-known result (e.g. loaded from history).
    pub fn show(&mut self, result: PredictionResult) -> Result<Navigation, DashboardError> {
        if self.is_busy() {
            return Err(DashboardError::Busy);
        }
        self.last_result = None;
        self.state = PredictionState::Ready(Box::new(result));
        Ok(Navigation::to_results())
    }

    /// Back to `Idle`, dropping any result. An in-flight request becomes stale.
    pub fn clear(&mut self) {
        self.last_result = None;
        self.state = PredictionState::Idle;
    }
}
