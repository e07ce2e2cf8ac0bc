use std::time::Duration;

/// Classified result of a call attempt, and of a contact's overall campaign
/// participation once its tracker is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Confirmed,
    Cancelled,
    Rescheduled,
    NotAvailable,
    WrongNumber,
    BusyVoicemail,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Pending => "pending",
            Outcome::Confirmed => "confirmed",
            Outcome::Cancelled => "cancelled",
            Outcome::Rescheduled => "rescheduled",
            Outcome::NotAvailable => "not_available",
            Outcome::WrongNumber => "wrong_number",
            Outcome::BusyVoicemail => "busy_voicemail",
            Outcome::Failed => "failed",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Outcome::Pending),
            "confirmed" => Some(Outcome::Confirmed),
            "cancelled" => Some(Outcome::Cancelled),
            "rescheduled" => Some(Outcome::Rescheduled),
            "not_available" => Some(Outcome::NotAvailable),
            "wrong_number" => Some(Outcome::WrongNumber),
            "busy_voicemail" => Some(Outcome::BusyVoicemail),
            "failed" => Some(Outcome::Failed),
            _ => None,
        }
    }

    /// Definitive outcomes stop further retries for a contact.
    pub fn is_definitive(self) -> bool {
        matches!(
            self,
            Outcome::Confirmed
                | Outcome::Cancelled
                | Outcome::Rescheduled
                | Outcome::NotAvailable
                | Outcome::WrongNumber
        )
    }

    pub const ALL: [Outcome; 8] = [
        Outcome::Pending,
        Outcome::Confirmed,
        Outcome::Cancelled,
        Outcome::Rescheduled,
        Outcome::NotAvailable,
        Outcome::WrongNumber,
        Outcome::BusyVoicemail,
        Outcome::Failed,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Created,
    Running,
    Stopped,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Created => "created",
            CampaignStatus::Running => "running",
            CampaignStatus::Stopped => "stopped",
            CampaignStatus::Completed => "completed",
        }
    }
}

/// Immutable per-run orchestration knobs. Bounds are enforced where user
/// input enters the system (config file, CLI flags, API overrides); the
/// scheduler trusts these values.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CampaignSettings {
    pub max_attempts: u32,
    pub retry_interval_minutes: u64,
    pub country_code: String,
    pub concurrency_limit: usize,
    pub batch_size: usize,
    pub batch_delay_seconds: u64,
}

impl CampaignSettings {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.batch_delay_seconds)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_minutes * 60)
    }
}

/// Raw result of the latest call attempt for a contact, kept on the tracker
/// for the final report. `success` means the gateway accepted the call; a
/// placed call with an unretrievable transcript is still a success here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallRecord {
    pub success: bool,
    pub call_id: Option<String>,
    pub error: Option<String>,
    pub transcript: String,
    pub duration_seconds: u32,
}

impl CallRecord {
    pub fn initiation_failure(error: String) -> Self {
        Self {
            success: false,
            call_id: None,
            error: Some(error),
            transcript: String::new(),
            duration_seconds: 0,
        }
    }
}
