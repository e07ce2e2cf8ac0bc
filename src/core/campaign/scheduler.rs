//! Campaign retry loop.
//!
//! Repeats dispatch passes over the still-open contacts until everyone has a
//! definitive outcome or their attempts run out, then closes the stragglers
//! with one voicemail each. All sleeps lose to the cancellation token;
//! in-flight batches are allowed to finish so no call result is dropped.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::CampaignRun;
use super::dispatcher::{AttemptOutcome, CallJob, Dispatcher};
use super::report::CampaignReport;
use super::types::{CampaignSettings, CampaignStatus};
use crate::core::contact::Contact;

pub struct CampaignRunner {
    dispatcher: Dispatcher,
}

impl CampaignRunner {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Drive the campaign to completion. The run is shared behind a mutex so
    /// callers can observe progress while it executes; locks are held only
    /// around state snapshots and updates, never across a dispatch.
    pub async fn run(
        &self,
        run: &Arc<Mutex<CampaignRun>>,
        cancel: &CancellationToken,
    ) -> CampaignReport {
        let (campaign_id, settings) = {
            let mut guard = run.lock().await;
            if guard.status == CampaignStatus::Created {
                guard.transition(CampaignStatus::Running);
            }
            if guard.status != CampaignStatus::Running {
                return guard.report();
            }
            (guard.id.clone(), guard.settings.clone())
        };

        let mut pass = 0u32;
        'passes: loop {
            if cancel.is_cancelled() {
                break;
            }
            let jobs = { run.lock().await.pending_jobs() };
            if jobs.is_empty() {
                break;
            }
            pass += 1;
            info!(
                "Campaign {}: pass {} with {} contact(s) pending",
                campaign_id,
                pass,
                jobs.len()
            );

            let batch_size = settings.batch_size.max(1);
            let batches: Vec<Vec<CallJob>> = jobs.chunks(batch_size).map(|c| c.to_vec()).collect();
            let total = batches.len();
            for (i, batch) in batches.into_iter().enumerate() {
                let outcomes = self
                    .dispatcher
                    .dispatch_batch(batch, settings.concurrency_limit)
                    .await;
                self.apply_outcomes(run, outcomes).await;
                if cancel.is_cancelled() {
                    break 'passes;
                }
                if i + 1 < total && !sleep_unless_cancelled(settings.batch_delay(), cancel).await {
                    break 'passes;
                }
            }

            let remaining = { run.lock().await.pending_jobs().len() };
            if remaining == 0 {
                break;
            }
            let delay = retry_delay(&settings, self.dispatcher.tuning.retry_margin);
            info!(
                "Campaign {}: {} contact(s) unresolved, next pass in {:?}",
                campaign_id, remaining, delay
            );
            if !sleep_unless_cancelled(delay, cancel).await {
                break;
            }
        }

        if !cancel.is_cancelled() {
            self.voicemail_sweep(run, &campaign_id, cancel).await;
        }

        let mut guard = run.lock().await;
        let next = if cancel.is_cancelled() {
            CampaignStatus::Stopped
        } else {
            CampaignStatus::Completed
        };
        guard.transition(next);
        info!("Campaign {} {}", guard.id, guard.status.as_str());
        guard.report()
    }

    async fn apply_outcomes(&self, run: &Arc<Mutex<CampaignRun>>, outcomes: Vec<AttemptOutcome>) {
        let mut guard = run.lock().await;
        for result in outcomes {
            debug!(
                "Contact #{} -> {} in {} ms ({:?})",
                guard.trackers[result.index].contact.sheet_index,
                result.outcome.as_str(),
                result.latency_ms,
                result.rule
            );
            guard.trackers[result.index].apply_attempt(result.outcome, result.record);
        }
    }

    /// Contacts that exhausted their attempts without a definitive outcome
    /// get exactly one voicemail before the campaign closes.
    async fn voicemail_sweep(
        &self,
        run: &Arc<Mutex<CampaignRun>>,
        campaign_id: &str,
        cancel: &CancellationToken,
    ) {
        let exhausted: Vec<(usize, Contact)> = {
            let guard = run.lock().await;
            guard
                .trackers
                .iter()
                .enumerate()
                .filter(|(_, t)| !t.done)
                .map(|(i, t)| (i, t.contact.clone()))
                .collect()
        };
        if exhausted.is_empty() {
            return;
        }
        info!(
            "Campaign {}: leaving voicemail for {} exhausted contact(s)",
            campaign_id,
            exhausted.len()
        );
        for (index, contact) in exhausted {
            if cancel.is_cancelled() {
                break;
            }
            let (outcome, record) = self.dispatcher.leave_voicemail(&contact).await;
            let mut guard = run.lock().await;
            if record.success {
                guard.trackers[index].close_with_voicemail(record);
            } else {
                guard.trackers[index].complete_with(outcome, record);
            }
        }
    }
}

/// Delay before the next retry pass: the configured interval plus margin,
/// with up to 10% jitter.
fn retry_delay(settings: &CampaignSettings, margin: Duration) -> Duration {
    let base = settings.retry_interval() + margin;
    if base.is_zero() {
        return base;
    }
    let jitter = rand::thread_rng().gen_range(0.0..0.10);
    base.mul_f64(1.0 + jitter)
}

/// Sleep that loses to cancellation. Returns false when cancelled.
async fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
