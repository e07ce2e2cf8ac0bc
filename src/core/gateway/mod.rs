//! Telephony gateway boundary.
//!
//! The campaign engine only ever talks to [`VoiceGateway`], so the vendor
//! adapter ([`bland::BlandGateway`]) can be swapped for a scripted double in
//! tests. Transcript delivery is two-path: webhook pushes resolve through the
//! [`correlation::CorrelationRegistry`], and polling covers gateways without
//! a reachable webhook endpoint.

pub mod bland;
pub mod correlation;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway rate limit exceeded")]
    RateLimited,

    #[error("gateway authentication failed (status {0})")]
    AuthError(u16),

    #[error("call not found")]
    NotFound,

    #[error("gateway request timed out")]
    Timeout,

    #[error("gateway error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("gateway transport error: {0}")]
    Transport(String),

    #[error("malformed gateway response: {0}")]
    Malformed(&'static str),
}

impl GatewayError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited,
            401 | 403 => Self::AuthError(status),
            404 => Self::NotFound,
            _ => Self::Api { status, body },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// One outbound call to place.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub phone_number: String,
    pub script: String,
    /// Campaign-issued id echoed back by webhook pushes so a completion can
    /// be matched to the attempt that placed the call.
    pub correlation_id: String,
}

/// Acknowledgement that the gateway accepted a call.
#[derive(Debug, Clone)]
pub struct PlacedCall {
    pub call_id: String,
    pub status: String,
}

/// Transcript and timing for a finished call.
#[derive(Debug, Clone, Default)]
pub struct CallTranscript {
    pub transcript: String,
    pub duration_seconds: u32,
    pub completed: bool,
}

#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Start an interactive reminder call.
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError>;

    /// Fetch the transcript for a placed call. `NotFound` is expected while
    /// the vendor is still finalizing the call, so callers poll through it.
    async fn fetch_transcript(&self, call_id: &str) -> Result<CallTranscript, GatewayError>;

    /// Drop a non-interactive voicemail message.
    async fn leave_voicemail(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError>;
}
