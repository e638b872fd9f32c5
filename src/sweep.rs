//! The query-and-close batch.
//!
//! A sweep runs one WIQL search, then (in close mode) one update per returned
//! work item, strictly one after another and in search order:
//!
//! ```text
//! Idle -> Searching -> (Updating)* -> Done
//! ```
//!
//! A failed search ends the sweep with an error before any update is sent.
//! A failed update is recorded in the report and the sweep moves on to the
//! next work item, so the report always has one outcome per search result.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::api::error::Result;
use crate::api::{ApiError, DevOpsClient, WorkItemId};
use crate::wiql::WiqlQuery;

/// The calls a sweep makes against the work item service.
#[allow(async_fn_in_trait)]
pub trait WorkItemService {
    /// Run a query, returning matching IDs in server order.
    async fn query_work_items(&self, query: &WiqlQuery) -> Result<Vec<WorkItemId>>;

    /// Set one work item's state to closed.
    async fn close_work_item(&self, id: WorkItemId) -> Result<()>;
}

impl WorkItemService for DevOpsClient {
    async fn query_work_items(&self, query: &WiqlQuery) -> Result<Vec<WorkItemId>> {
        DevOpsClient::query_work_items(self, query).await
    }

    async fn close_work_item(&self, id: WorkItemId) -> Result<()> {
        DevOpsClient::close_work_item(self, id).await
    }
}

/// Whether a sweep only lists work items or also closes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    ListOnly,
    Close,
}

/// Where a sweep is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Searching,
    /// Updating the work item at this index of the search result.
    Updating(usize),
    Done,
}

/// What happened to one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Found by the search; no update was attempted.
    Listed,
    /// The update succeeded.
    Closed,
    /// The update failed.
    Failed {
        /// HTTP status, when the server answered.
        status: Option<u16>,
        reason: String,
    },
}

impl Outcome {
    fn from_error(err: &ApiError) -> Self {
        Outcome::Failed {
            status: err.status(),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Listed => f.write_str("open"),
            Outcome::Closed => f.write_str("closed"),
            Outcome::Failed {
                status: Some(status),
                ..
            } => write!(f, "failed ({})", status),
            Outcome::Failed { reason, .. } => write!(f, "failed: {}", reason),
        }
    }
}

/// The outcome for one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub id: WorkItemId,
    pub outcome: Outcome,
}

/// Result of a sweep: one outcome per search result, in search order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub mode: SweepMode,
    pub outcomes: Vec<ItemOutcome>,
    /// The observer declined to start updating.
    pub declined: bool,
}

impl SweepReport {
    /// Number of work items the search returned.
    pub fn found(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of work items closed.
    pub fn closed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Closed))
    }

    /// Number of work items whose update failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    /// True when no update failed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|i| pred(&i.outcome)).count()
    }
}

/// Hooks called while a sweep runs.
pub trait SweepObserver {
    /// Called once with the search result, before any update. Returning
    /// `false` ends the sweep without updating anything.
    fn searched(&mut self, _ids: &[WorkItemId]) -> bool {
        true
    }

    /// Called after each update attempt.
    fn item_finished(&mut self, _item: &ItemOutcome) {}
}

/// An observer that lets the sweep run without interruption.
pub struct Unobserved;

impl SweepObserver for Unobserved {}

/// Drives one search and the updates that follow it.
pub struct Sweeper<'a, S> {
    service: &'a S,
    mode: SweepMode,
    state: SweepState,
}

impl<'a, S: WorkItemService> Sweeper<'a, S> {
    pub fn new(service: &'a S, mode: SweepMode) -> Self {
        Self {
            service,
            mode,
            state: SweepState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Run the sweep to completion.
    pub async fn run(&mut self, query: &WiqlQuery) -> Result<SweepReport> {
        self.run_with(query, &mut Unobserved).await
    }

    /// Run the sweep to completion, reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns the search error if the search fails. Update failures are
    /// recorded in the report instead.
    #[instrument(skip_all)]
    pub async fn run_with(
        &mut self,
        query: &WiqlQuery,
        observer: &mut impl SweepObserver,
    ) -> Result<SweepReport> {
        debug!(mode = ?self.mode, "Starting sweep");
        self.state = SweepState::Searching;
        let ids = match self.service.query_work_items(query).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Search failed: {}", e);
                self.state = SweepState::Done;
                return Err(e);
            }
        };
        info!("Search returned {} work items", ids.len());

        let listed = |ids: &[WorkItemId]| {
            ids.iter()
                .map(|&id| ItemOutcome {
                    id,
                    outcome: Outcome::Listed,
                })
                .collect::<Vec<_>>()
        };

        if ids.is_empty() || self.mode == SweepMode::ListOnly {
            self.state = SweepState::Done;
            return Ok(self.report(listed(&ids), false));
        }

        if !observer.searched(&ids) {
            info!("Sweep declined before updating");
            self.state = SweepState::Done;
            return Ok(self.report(listed(&ids), true));
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        for (index, &id) in ids.iter().enumerate() {
            self.state = SweepState::Updating(index);
            let outcome = match self.service.close_work_item(id).await {
                Ok(()) => {
                    debug!(work_item_id = id, "Closed work item");
                    Outcome::Closed
                }
                Err(e) => {
                    warn!(work_item_id = id, "Failed to close work item: {}", e);
                    Outcome::from_error(&e)
                }
            };
            let item = ItemOutcome { id, outcome };
            observer.item_finished(&item);
            outcomes.push(item);
        }

        self.state = SweepState::Done;
        let report = self.report(outcomes, false);
        info!(
            closed = report.closed(),
            failed = report.failed(),
            "Sweep finished"
        );
        Ok(report)
    }

    fn report(&self, outcomes: Vec<ItemOutcome>, declined: bool) -> SweepReport {
        SweepReport {
            mode: self.mode,
            outcomes,
            declined,
        }
    }
}
