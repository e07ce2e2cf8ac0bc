use chrono::{DateTime, Utc};
use tracing::warn;

use super::types::{CallRecord, Outcome};
use crate::core::contact::Contact;

/// Per-contact attempt ledger. Once `done` is set the outcome is frozen and
/// late results are discarded.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AttemptTracker {
    pub contact: Contact,
    pub outcome: Outcome,
    pub attempts: u32,
    pub done: bool,
    pub voicemail_left: bool,
    pub records: Vec<CallRecord>,
    pub updated_at: DateTime<Utc>,
}

impl AttemptTracker {
    pub fn new(contact: Contact) -> Self {
        Self {
            contact,
            outcome: Outcome::Pending,
            attempts: 0,
            done: false,
            voicemail_left: false,
            records: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Whether the scheduler may place another interactive attempt.
    pub fn retryable(&self, max_attempts: u32) -> bool {
        !self.done && self.attempts < max_attempts
    }

    /// Apply one finished attempt. A definitive outcome freezes the contact;
    /// a non-definitive one records the latest classification and leaves the
    /// contact open for retry.
    pub fn apply_attempt(&mut self, outcome: Outcome, record: CallRecord) {
        if self.done {
            warn!(
                "Contact {} is already {}, discarding late {} result",
                self.contact.phone_number,
                self.outcome.as_str(),
                outcome.as_str()
            );
            return;
        }
        self.attempts += 1;
        self.records.push(record);
        self.outcome = outcome;
        if outcome.is_definitive() {
            self.done = true;
        }
        self.updated_at = Utc::now();
    }

    /// Close the contact without an interactive attempt. Used for the
    /// voicemail fallback and for fatal per-contact failures.
    pub fn complete_with(&mut self, outcome: Outcome, record: CallRecord) {
        if self.done {
            return;
        }
        self.outcome = outcome;
        self.done = true;
        self.records.push(record);
        self.updated_at = Utc::now();
    }

    /// Close the contact after a successful voicemail drop.
    pub fn close_with_voicemail(&mut self, record: CallRecord) {
        if self.done {
            return;
        }
        self.voicemail_left = true;
        self.complete_with(Outcome::BusyVoicemail, record);
    }

    pub fn last_error(&self) -> Option<String> {
        self.records.iter().rev().find_map(|r| r.error.clone())
    }

    /// Most recent non-empty transcript, if any attempt produced one.
    pub fn last_transcript(&self) -> Option<&str> {
        self.records
            .iter()
            .rev()
            .map(|r| r.transcript.trim())
            .find(|t| !t.is_empty())
    }

    pub fn total_call_seconds(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.duration_seconds))
            .sum()
    }
}
