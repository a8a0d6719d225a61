//! Per-page request/response state machine.
//!
//! ```text
//!            trigger                response
//!   Idle ────────────▶ Pending ────────────▶ Completed
//!    ▲                    │                     │  │
//!    │                    │ error               │  │ refresh (Refreshable only)
//!    │       clear        ▼                     │  └──▶ Pending
//!    ├─────────────── Failed ◀──────────────────┘ (refresh error)
//!    │       clear                              │
//!    └──────────────────────────────────────────┘
//! ```
//!
//! Invariants:
//! - at most one request in flight per page; `trigger` in `Pending` or
//!   `Completed` is ignored
//! - `Completed` holds the request and the output that answered it, so the
//!   page redraws without calling the service again
//! - `clear` leaves the controller equal to a freshly built one
//! - a failed call lands in `Failed`, never stays `Pending`; only an
//!   explicit trigger or clear leaves it (no automatic retry)

use chrono::{DateTime, Utc};

use crate::completion::Completer;
use crate::error::WorkflowError;

/// One page's use case: how a request becomes an output.
pub trait UseCase {
    type Request: Clone + PartialEq + std::fmt::Debug;
    type Output: Clone + PartialEq + std::fmt::Debug;

    /// Short page identifier used in logs.
    const NAME: &'static str;

    /// Compose the prompt, call the completer, and build the output.
    fn execute(
        &self,
        request: &Self::Request,
        completer: &dyn Completer,
    ) -> Result<Self::Output, WorkflowError>;
}

/// Marker for use cases whose completed page may re-run without a clear.
pub trait Refreshable: UseCase {}

/// A completed exchange, kept for redraws.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange<Req, Out> {
    pub request: Req,
    pub output: Out,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageState<Req, Out> {
    Idle,
    Pending {
        request: Req,
    },
    Completed(Exchange<Req, Out>),
    Failed {
        request: Req,
        error: WorkflowError,
    },
}

impl<Req, Out> PageState<Req, Out> {
    pub fn name(&self) -> &'static str {
        match self {
            PageState::Idle => "idle",
            PageState::Pending { .. } => "pending",
            PageState::Completed(_) => "completed",
            PageState::Failed { .. } => "failed",
        }
    }
}

/// What a trigger or refresh did.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The call ran and the page is now `Completed`.
    Completed,
    /// The call ran and failed; the page is now `Failed`.
    Failed(WorkflowError),
    /// The page was not in a state that accepts this action.
    Ignored,
}

#[derive(Debug)]
pub struct PageController<U: UseCase> {
    use_case: U,
    state: PageState<U::Request, U::Output>,
}

impl<U: UseCase> PageController<U> {
    pub fn new(use_case: U) -> Self {
        Self {
            use_case,
            state: PageState::Idle,
        }
    }

    pub fn state(&self) -> &PageState<U::Request, U::Output> {
        &self.state
    }

    pub fn use_case(&self) -> &U {
        &self.use_case
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, PageState::Idle)
    }

    /// Inputs are editable only when nothing is cached.
    pub fn inputs_editable(&self) -> bool {
        matches!(self.state, PageState::Idle | PageState::Failed { .. })
    }

    pub fn exchange(&self) -> Option<&Exchange<U::Request, U::Output>> {
        match &self.state {
            PageState::Completed(exchange) => Some(exchange),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        match &self.state {
            PageState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Run `request` if the page is `Idle` (or `Failed`, as a user retry).
    /// Blocks until the completer returns.
    pub fn trigger(&mut self, request: U::Request, completer: &dyn Completer) -> TriggerOutcome {
        match self.state {
            PageState::Idle | PageState::Failed { .. } => self.run(request, completer),
            PageState::Pending { .. } | PageState::Completed(_) => {
                log::debug!("{}: trigger ignored in state {}", U::NAME, self.state.name());
                TriggerOutcome::Ignored
            }
        }
    }

    /// Drop the cached exchange (or failure) and return to `Idle`.
    /// Returns false when there was nothing to clear.
    pub fn clear(&mut self) -> bool {
        match self.state {
            PageState::Completed(_) | PageState::Failed { .. } => {
                log::debug!("{}: cleared", U::NAME);
                self.state = PageState::Idle;
                true
            }
            PageState::Idle | PageState::Pending { .. } => false,
        }
    }

    fn run(&mut self, request: U::Request, completer: &dyn Completer) -> TriggerOutcome {
        log::info!("{}: request started", U::NAME);
        self.state = PageState::Pending {
            request: request.clone(),
        };
        match self.use_case.execute(&request, completer) {
            Ok(output) => {
                log::info!("{}: request completed", U::NAME);
                self.state = PageState::Completed(Exchange {
                    request,
                    output,
                    completed_at: Utc::now(),
                });
                TriggerOutcome::Completed
            }
            Err(error) => {
                log::warn!("{}: request failed: {}", U::NAME, error);
                self.state = PageState::Failed {
                    request,
                    error: error.clone(),
                };
                TriggerOutcome::Failed(error)
            }
        }
    }
}

impl<U: Refreshable> PageController<U> {
    /// Re-run a completed page with the current selection, replacing the
    /// cached exchange. Ignored in any other state.
    pub fn refresh(&mut self, request: U::Request, completer: &dyn Completer) -> TriggerOutcome {
        match self.state {
            PageState::Completed(_) => self.run(request, completer),
            _ => {
                log::debug!("{}: refresh ignored in state {}", U::NAME, self.state.name());
                TriggerOutcome::Ignored
            }
        }
    }
}
