use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::CampaignRun;
use super::types::Outcome;
use crate::core::contact::ValidationFailure;

/// Aggregated view of a campaign, built fresh from the run state whenever it
/// is requested. `status_counts` is zero-filled over every outcome so
/// consumers never have to guess at missing keys.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub campaign_id: String,
    pub status: String,
    pub total_contacts: usize,
    pub attempted: usize,
    pub completed: usize,
    pub voicemails_left: usize,
    pub status_counts: BTreeMap<String, usize>,
    /// Definitive outcomes over attempted contacts, 0.0 when nothing was
    /// attempted.
    pub success_rate: f64,
    pub total_call_seconds: u64,
    /// Mean call length over all placed attempts, 0.0 when none.
    pub average_call_seconds: f64,
    pub validation_failures: Vec<ValidationFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stopped: bool,
    pub contacts: Vec<ContactReportRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactReportRow {
    pub sheet_index: usize,
    pub patient_name: String,
    pub phone_number: String,
    pub outcome: Outcome,
    pub attempts: u32,
    pub call_seconds: u64,
    pub voicemail_left: bool,
    pub transcript_excerpt: Option<String>,
    pub last_error: Option<String>,
}

const EXCERPT_CHARS: usize = 160;

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl CampaignReport {
    pub fn from_run(run: &CampaignRun) -> Self {
        let mut status_counts: BTreeMap<String, usize> = Outcome::ALL
            .iter()
            .map(|outcome| (outcome.as_str().to_string(), 0))
            .collect();

        let mut attempted = 0;
        let mut completed = 0;
        let mut definitive = 0;
        let mut voicemails_left = 0;
        let mut total_call_seconds = 0;
        let mut total_attempts = 0u64;

        for tracker in &run.trackers {
            if let Some(count) = status_counts.get_mut(tracker.outcome.as_str()) {
                *count += 1;
            }
            if tracker.attempts > 0 {
                attempted += 1;
            }
            if tracker.done {
                completed += 1;
            }
            if tracker.outcome.is_definitive() {
                definitive += 1;
            }
            if tracker.voicemail_left {
                voicemails_left += 1;
            }
            total_call_seconds += tracker.total_call_seconds();
            total_attempts += u64::from(tracker.attempts);
        }

        let success_rate = if attempted > 0 {
            definitive as f64 / attempted as f64
        } else {
            0.0
        };
        let average_call_seconds = if total_attempts > 0 {
            total_call_seconds as f64 / total_attempts as f64
        } else {
            0.0
        };

        let contacts = run
            .trackers
            .iter()
            .map(|tracker| ContactReportRow {
                sheet_index: tracker.contact.sheet_index,
                patient_name: tracker.contact.patient_name.clone(),
                phone_number: tracker.contact.phone_number.clone(),
                outcome: tracker.outcome,
                attempts: tracker.attempts,
                call_seconds: tracker.total_call_seconds(),
                voicemail_left: tracker.voicemail_left,
                transcript_excerpt: tracker.last_transcript().map(excerpt),
                last_error: tracker.last_error(),
            })
            .collect();

        Self {
            campaign_id: run.id.clone(),
            status: run.status.as_str().to_string(),
            total_contacts: run.trackers.len(),
            attempted,
            completed,
            voicemails_left,
            status_counts,
            success_rate,
            total_call_seconds,
            average_call_seconds,
            validation_failures: run.validation_failures.clone(),
            started_at: run.started_at,
            finished_at: run.finished_at,
            stopped: run.status == super::CampaignStatus::Stopped,
            contacts,
        }
    }
}
