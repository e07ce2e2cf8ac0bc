//! Bounded fan-out of call attempts over the gateway.
//!
//! A batch of jobs is spawned onto a [`JoinSet`] behind a semaphore sized to
//! the campaign's concurrency limit, so at most that many calls are in
//! flight at once. Each attempt places the call, waits for its transcript
//! (webhook push first when configured, else polling), classifies it, and
//! reports back keyed by arena index.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::types::{CallRecord, Outcome};
use crate::core::classify::{self, Rule};
use crate::core::config::ClinicInfo;
use crate::core::contact::Contact;
use crate::core::gateway::correlation::CorrelationRegistry;
use crate::core::gateway::{CallRequest, CallTranscript, GatewayError, VoiceGateway};
use crate::core::script;

/// Timing knobs for a single call attempt. Production values follow the
/// vendor's settle and poll guidance; tests shrink them to near zero.
#[derive(Debug, Clone)]
pub struct CallTuning {
    /// Wait after placement before the first transcript fetch.
    pub settle_delay: Duration,
    /// Wait between transcript polls.
    pub poll_interval: Duration,
    /// Transcript polls before giving up on the call.
    pub poll_attempts: u32,
    /// How long to wait for a webhook push before falling back to polling.
    pub webhook_wait: Duration,
    /// Extra margin added to the retry interval between passes.
    pub retry_margin: Duration,
}

impl Default for CallTuning {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            poll_interval: Duration::from_secs(2),
            poll_attempts: 5,
            webhook_wait: Duration::from_secs(20),
            retry_margin: Duration::from_secs(30),
        }
    }
}

impl CallTuning {
    #[cfg(test)]
    pub(crate) fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            poll_attempts: 3,
            webhook_wait: Duration::from_millis(20),
            retry_margin: Duration::ZERO,
        }
    }
}

/// One unit of dispatch work: a single interactive attempt for a contact.
#[derive(Debug, Clone)]
pub struct CallJob {
    /// Index into the campaign's tracker arena.
    pub index: usize,
    pub contact: Contact,
    pub attempt_no: u32,
}

/// Result of one finished attempt, keyed back to the arena index.
#[derive(Debug)]
pub struct AttemptOutcome {
    pub index: usize,
    pub outcome: Outcome,
    pub record: CallRecord,
    pub rule: Rule,
    pub latency_ms: u128,
}

pub struct Dispatcher {
    gateway: Arc<dyn VoiceGateway>,
    clinic: ClinicInfo,
    correlations: CorrelationRegistry,
    use_webhook: bool,
    pub tuning: CallTuning,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn VoiceGateway>,
        clinic: ClinicInfo,
        correlations: CorrelationRegistry,
        use_webhook: bool,
    ) -> Self {
        Self {
            gateway,
            clinic,
            correlations,
            use_webhook,
            tuning: CallTuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: CallTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Fan a batch of jobs out over the gateway with at most
    /// `concurrency_limit` calls in flight. Results arrive in completion
    /// order.
    pub async fn dispatch_batch(
        &self,
        jobs: Vec<CallJob>,
        concurrency_limit: usize,
    ) -> Vec<AttemptOutcome> {
        let semaphore = Arc::new(Semaphore::new(concurrency_limit.max(1)));
        let mut set: JoinSet<AttemptOutcome> = JoinSet::new();

        for job in jobs {
            let semaphore = semaphore.clone();
            let gateway = self.gateway.clone();
            let clinic = self.clinic.clone();
            let correlations = self.correlations.clone();
            let use_webhook = self.use_webhook;
            let tuning = self.tuning.clone();
            set.spawn(async move {
                // The semaphore outlives the batch, so acquire cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                run_attempt(job, gateway, clinic, correlations, use_webhook, tuning).await
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!("Attempt task failed to join: {}", err),
            }
        }
        outcomes
    }

    /// Leave the voicemail fallback for a contact whose interactive attempts
    /// are exhausted. Returns the outcome to close the contact with.
    pub async fn leave_voicemail(&self, contact: &Contact) -> (Outcome, CallRecord) {
        let request = CallRequest {
            phone_number: contact.phone_number.clone(),
            script: script::voicemail_script(contact, &self.clinic),
            correlation_id: Uuid::new_v4().to_string(),
        };
        match self.gateway.leave_voicemail(&request).await {
            Ok(placed) => {
                info!(
                    "Voicemail left for {} (call {})",
                    contact.phone_number, placed.call_id
                );
                (
                    Outcome::BusyVoicemail,
                    CallRecord {
                        success: true,
                        call_id: Some(placed.call_id),
                        error: None,
                        transcript: String::new(),
                        duration_seconds: 0,
                    },
                )
            }
            Err(err) => {
                error!("Voicemail failed for {}: {}", contact.phone_number, err);
                (Outcome::Failed, CallRecord::initiation_failure(err.to_string()))
            }
        }
    }
}

async fn run_attempt(
    job: CallJob,
    gateway: Arc<dyn VoiceGateway>,
    clinic: ClinicInfo,
    correlations: CorrelationRegistry,
    use_webhook: bool,
    tuning: CallTuning,
) -> AttemptOutcome {
    let started = Instant::now();
    let correlation_id = Uuid::new_v4().to_string();
    let request = CallRequest {
        phone_number: job.contact.phone_number.clone(),
        script: script::reminder_script(&job.contact, &clinic),
        correlation_id: correlation_id.clone(),
    };

    info!(
        "Attempt {} for {} ({})",
        job.attempt_no, job.contact.patient_name, job.contact.phone_number
    );

    let waiter = if use_webhook {
        Some(correlations.register(&correlation_id).await)
    } else {
        None
    };

    let placed = match gateway.place_call(&request).await {
        Ok(placed) => placed,
        Err(err) => {
            if waiter.is_some() {
                correlations.forget(&correlation_id).await;
            }
            warn!(
                "Call initiation failed for {}: {}",
                job.contact.phone_number, err
            );
            return AttemptOutcome {
                index: job.index,
                outcome: Outcome::Failed,
                record: CallRecord::initiation_failure(err.to_string()),
                rule: Rule::Default,
                latency_ms: started.elapsed().as_millis(),
            };
        }
    };

    debug!("Call {} accepted ({})", placed.call_id, placed.status);

    match await_transcript(
        gateway.as_ref(),
        &placed.call_id,
        waiter,
        &correlations,
        &correlation_id,
        &tuning,
    )
    .await
    {
        Ok(details) => {
            let (outcome, rule) = classify::classify_detailed(&details.transcript);
            info!(
                "Attempt {} for {} classified as {} ({:?})",
                job.attempt_no,
                job.contact.phone_number,
                outcome.as_str(),
                rule
            );
            AttemptOutcome {
                index: job.index,
                outcome,
                record: CallRecord {
                    success: true,
                    call_id: Some(placed.call_id),
                    error: None,
                    transcript: details.transcript,
                    duration_seconds: details.duration_seconds,
                },
                rule,
                latency_ms: started.elapsed().as_millis(),
            }
        }
        // The call went out but its transcript never materialized. Treat it
        // like an unanswered call so the retry pass picks the contact up.
        Err(err) => {
            warn!(
                "No transcript for call {} ({}): {}",
                placed.call_id, job.contact.phone_number, err
            );
            AttemptOutcome {
                index: job.index,
                outcome: Outcome::BusyVoicemail,
                record: CallRecord {
                    success: true,
                    call_id: Some(placed.call_id),
                    error: Some(err.to_string()),
                    transcript: String::new(),
                    duration_seconds: 0,
                },
                rule: Rule::Default,
                latency_ms: started.elapsed().as_millis(),
            }
        }
    }
}

/// Wait for the call's transcript: a webhook push when one is registered,
/// otherwise settle-then-poll. `NotFound` during polling means the vendor is
/// still finalizing the call.
async fn await_transcript(
    gateway: &dyn VoiceGateway,
    call_id: &str,
    waiter: Option<oneshot::Receiver<CallTranscript>>,
    correlations: &CorrelationRegistry,
    correlation_id: &str,
    tuning: &CallTuning,
) -> Result<CallTranscript, GatewayError> {
    if let Some(rx) = waiter {
        match tokio::time::timeout(tuning.webhook_wait, rx).await {
            Ok(Ok(pushed)) => return Ok(pushed),
            Ok(Err(_)) => {}
            Err(_) => {
                debug!(
                    "No webhook push for call {} within {:?}, falling back to polling",
                    call_id, tuning.webhook_wait
                );
            }
        }
        correlations.forget(correlation_id).await;
    }

    if !tuning.settle_delay.is_zero() {
        tokio::time::sleep(tuning.settle_delay).await;
    }

    for poll in 0..tuning.poll_attempts {
        match gateway.fetch_transcript(call_id).await {
            Ok(details) if details.completed || !details.transcript.trim().is_empty() => {
                return Ok(details);
            }
            Ok(_) => {
                // Call still in progress.
            }
            Err(GatewayError::NotFound) => {}
            Err(err) => return Err(err),
        }
        if poll + 1 < tuning.poll_attempts {
            tokio::time::sleep(tuning.poll_interval).await;
        }
    }
    Err(GatewayError::NotFound)
}
