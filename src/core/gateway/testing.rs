//! Scripted gateway double for unit tests. Each phone number gets a queue of
//! planned calls; unplanned calls behave like nobody answered.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CallRequest, CallTranscript, GatewayError, PlacedCall, VoiceGateway};

#[derive(Debug, Clone)]
pub(crate) enum PlannedCall {
    /// Call connects and yields this transcript.
    Answered {
        transcript: &'static str,
        duration_seconds: u32,
    },
    /// Call connects but the transcript comes back empty.
    NoAnswer,
    /// `place_call` fails with a server error.
    PlacementFails,
    /// `place_call` fails with a rate limit.
    RateLimited,
    /// Transcript fetch returns NotFound this many times before succeeding.
    SlowTranscript {
        not_found: u32,
        transcript: &'static str,
        duration_seconds: u32,
    },
    /// Call is placed but every transcript fetch fails.
    FetchFails,
}

enum ActiveCall {
    Pending {
        remaining_not_found: u32,
        transcript: String,
        duration_seconds: u32,
    },
    FetchFails,
}

pub(crate) struct ScriptedGateway {
    plans: Mutex<HashMap<String, VecDeque<PlannedCall>>>,
    active: Mutex<HashMap<String, ActiveCall>>,
    placed: Mutex<Vec<CallRequest>>,
    voicemails: Mutex<Vec<CallRequest>>,
    fail_voicemail: AtomicBool,
    call_delay: Duration,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_call_delay(Duration::ZERO)
    }

    /// Hold each placed call open for `delay` so tests can observe how many
    /// run at once.
    pub(crate) fn with_call_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            plans: Mutex::new(HashMap::new()),
            active: Mutex::new(HashMap::new()),
            placed: Mutex::new(Vec::new()),
            voicemails: Mutex::new(Vec::new()),
            fail_voicemail: AtomicBool::new(false),
            call_delay: delay,
            next_id: AtomicUsize::new(1),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub(crate) async fn plan(&self, phone_number: &str, calls: Vec<PlannedCall>) {
        self.plans
            .lock()
            .await
            .insert(phone_number.to_string(), calls.into());
    }

    pub(crate) fn fail_voicemails(&self) {
        self.fail_voicemail.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn placed_calls(&self) -> Vec<CallRequest> {
        self.placed.lock().await.clone()
    }

    pub(crate) async fn voicemail_requests(&self) -> Vec<CallRequest> {
        self.voicemails.lock().await.clone()
    }

    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn next_plan(&self, phone_number: &str) -> PlannedCall {
        self.plans
            .lock()
            .await
            .get_mut(phone_number)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(PlannedCall::NoAnswer)
    }
}

#[async_trait]
impl VoiceGateway for ScriptedGateway {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError> {
        self.placed.lock().await.push(request.clone());
        let plan = self.next_plan(&request.phone_number).await;

        let (remaining_not_found, transcript, duration_seconds) = match plan {
            PlannedCall::PlacementFails => {
                return Err(GatewayError::Api {
                    status: 500,
                    body: "scripted placement failure".to_string(),
                });
            }
            PlannedCall::RateLimited => return Err(GatewayError::RateLimited),
            PlannedCall::Answered {
                transcript,
                duration_seconds,
            } => (0, transcript.to_string(), duration_seconds),
            PlannedCall::NoAnswer => (0, String::new(), 0),
            PlannedCall::SlowTranscript {
                not_found,
                transcript,
                duration_seconds,
            } => (not_found, transcript.to_string(), duration_seconds),
            PlannedCall::FetchFails => {
                let call_id = format!("call-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                self.active
                    .lock()
                    .await
                    .insert(call_id.clone(), ActiveCall::FetchFails);
                return Ok(PlacedCall {
                    call_id,
                    status: "queued".to_string(),
                });
            }
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let call_id = format!("call-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.active.lock().await.insert(
            call_id.clone(),
            ActiveCall::Pending {
                remaining_not_found,
                transcript,
                duration_seconds,
            },
        );
        Ok(PlacedCall {
            call_id,
            status: "queued".to_string(),
        })
    }

    async fn fetch_transcript(&self, call_id: &str) -> Result<CallTranscript, GatewayError> {
        let mut active = self.active.lock().await;
        match active.get_mut(call_id) {
            None => Err(GatewayError::NotFound),
            Some(ActiveCall::FetchFails) => Err(GatewayError::Api {
                status: 500,
                body: "scripted fetch failure".to_string(),
            }),
            Some(ActiveCall::Pending {
                remaining_not_found,
                ..
            }) if *remaining_not_found > 0 => {
                *remaining_not_found -= 1;
                Err(GatewayError::NotFound)
            }
            Some(ActiveCall::Pending {
                transcript,
                duration_seconds,
                ..
            }) => Ok(CallTranscript {
                transcript: transcript.clone(),
                duration_seconds: *duration_seconds,
                completed: true,
            }),
        }
    }

    async fn leave_voicemail(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError> {
        if self.fail_voicemail.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 500,
                body: "scripted voicemail failure".to_string(),
            });
        }
        self.voicemails.lock().await.push(request.clone());
        Ok(PlacedCall {
            call_id: format!("vm-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            status: "queued".to_string(),
        })
    }
}
