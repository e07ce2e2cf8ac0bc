//! Campaign engine: per-contact attempt tracking, bounded call dispatch,
//! the retry scheduler, and report aggregation.

mod dispatcher;
mod report;
mod scheduler;
mod tracker;
mod types;

#[cfg(test)]
mod tests;

pub use dispatcher::{AttemptOutcome, CallJob, CallTuning, Dispatcher};
pub use report::{CampaignReport, ContactReportRow};
pub use scheduler::CampaignRunner;
pub use tracker::AttemptTracker;
pub use types::{CallRecord, CampaignSettings, CampaignStatus, Outcome};

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::core::contact::{ContactRow, ValidationFailure, validate_rows};

pub fn can_transition(from: CampaignStatus, to: CampaignStatus) -> bool {
    match from {
        CampaignStatus::Created => matches!(to, CampaignStatus::Running),
        CampaignStatus::Running => {
            matches!(to, CampaignStatus::Stopped | CampaignStatus::Completed)
        }
        CampaignStatus::Stopped | CampaignStatus::Completed => false,
    }
}

/// All state for one campaign: the validated contact arena plus run
/// bookkeeping. Shared behind `Arc<Mutex<_>>` so the API can observe a run
/// while the scheduler drives it.
pub struct CampaignRun {
    pub id: String,
    pub status: CampaignStatus,
    pub settings: CampaignSettings,
    pub trackers: Vec<AttemptTracker>,
    pub validation_failures: Vec<ValidationFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CampaignRun {
    /// Validate the raw rows and build the arena. Rows that fail validation
    /// are excluded from dialing but kept for the report.
    pub fn new(rows: &[ContactRow], settings: CampaignSettings) -> Self {
        let (contacts, validation_failures) = validate_rows(rows, &settings.country_code);
        Self {
            id: Uuid::new_v4().to_string(),
            status: CampaignStatus::Created,
            settings,
            trackers: contacts.into_iter().map(AttemptTracker::new).collect(),
            validation_failures,
            started_at: None,
            finished_at: None,
        }
    }

    /// Move to `next` if the transition matrix allows it. Invalid moves are
    /// logged and leave the run untouched.
    pub fn transition(&mut self, next: CampaignStatus) -> bool {
        if !can_transition(self.status, next) {
            warn!(
                "Campaign {}: invalid transition {} -> {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            );
            return false;
        }
        match next {
            CampaignStatus::Running => self.started_at = Some(Utc::now()),
            CampaignStatus::Stopped | CampaignStatus::Completed => {
                self.finished_at = Some(Utc::now())
            }
            CampaignStatus::Created => {}
        }
        self.status = next;
        true
    }

    /// Jobs for every contact still eligible for an interactive attempt, in
    /// sheet order.
    pub fn pending_jobs(&self) -> Vec<CallJob> {
        self.trackers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.retryable(self.settings.max_attempts))
            .map(|(index, t)| CallJob {
                index,
                contact: t.contact.clone(),
                attempt_no: t.attempts + 1,
            })
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            CampaignStatus::Stopped | CampaignStatus::Completed
        )
    }

    pub fn report(&self) -> CampaignReport {
        CampaignReport::from_run(self)
    }
}
