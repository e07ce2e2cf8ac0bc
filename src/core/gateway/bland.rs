//! Bland.ai adapter for the [`VoiceGateway`] contract.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CallRequest, CallTranscript, GatewayError, PlacedCall, VoiceGateway};
use crate::core::config::AppConfig;

const VOICE: &str = "maya";
const LANGUAGE: &str = "en-US";
const CALL_MAX_DURATION_SECS: u32 = 300;
const VOICEMAIL_MAX_DURATION_SECS: u32 = 120;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Wire request/response ──

#[derive(Serialize)]
struct PlaceCallBody<'a> {
    phone_number: &'a str,
    task: &'a str,
    voice: &'a str,
    language: &'a str,
    max_duration: u32,
    answered_by_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for_greeting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voicemail_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook: Option<&'a str>,
    metadata: CallMetadata<'a>,
}

#[derive(Serialize)]
struct CallMetadata<'a> {
    correlation_id: &'a str,
}

#[derive(Deserialize)]
struct PlaceCallResponse {
    #[serde(default)]
    call_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct CallDetailsResponse {
    #[serde(default)]
    concatenated_transcript: Option<String>,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    transcripts: Option<Vec<TranscriptTurn>>,
    #[serde(default)]
    call_length: Option<f64>,
    #[serde(default)]
    completed: Option<bool>,
}

#[derive(Deserialize)]
struct TranscriptTurn {
    #[serde(default)]
    text: String,
}

impl CallDetailsResponse {
    /// The vendor exposes the transcript in three shapes depending on call
    /// age; prefer the concatenated form, then the flat field, then the
    /// per-turn array joined.
    fn into_transcript(self) -> CallTranscript {
        let transcript = self
            .concatenated_transcript
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.transcript.filter(|t| !t.trim().is_empty()))
            .or_else(|| {
                self.transcripts
                    .map(|turns| {
                        turns
                            .into_iter()
                            .map(|turn| turn.text)
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .filter(|t| !t.trim().is_empty())
            })
            .unwrap_or_default();
        CallTranscript {
            transcript,
            duration_seconds: self.call_length.unwrap_or(0.0).round() as u32,
            completed: self.completed.unwrap_or(false),
        }
    }
}

enum CallKind {
    Interactive,
    Voicemail,
}

fn call_body<'a>(
    request: &'a CallRequest,
    kind: &CallKind,
    webhook: Option<&'a str>,
) -> PlaceCallBody<'a> {
    match kind {
        CallKind::Interactive => PlaceCallBody {
            phone_number: &request.phone_number,
            task: &request.script,
            voice: VOICE,
            language: LANGUAGE,
            max_duration: CALL_MAX_DURATION_SECS,
            answered_by_enabled: true,
            wait_for_greeting: Some(true),
            record: Some(true),
            amd: Some(true),
            voicemail_message: None,
            webhook,
            metadata: CallMetadata {
                correlation_id: &request.correlation_id,
            },
        },
        CallKind::Voicemail => PlaceCallBody {
            phone_number: &request.phone_number,
            task: &request.script,
            voice: VOICE,
            language: LANGUAGE,
            max_duration: VOICEMAIL_MAX_DURATION_SECS,
            answered_by_enabled: true,
            wait_for_greeting: None,
            record: None,
            amd: None,
            voicemail_message: Some(&request.script),
            webhook: None,
            metadata: CallMetadata {
                correlation_id: &request.correlation_id,
            },
        },
    }
}

// ── Adapter ──

pub struct BlandGateway {
    client: Client,
    base_url: String,
    api_key: String,
    webhook_url: Option<String>,
}

impl BlandGateway {
    pub fn new(base_url: &str, api_key: &str, webhook_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            webhook_url,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(
            &config.gateway.base_url,
            api_key,
            config.gateway.webhook_url.clone(),
        ))
    }

    async fn start_call(
        &self,
        request: &CallRequest,
        kind: CallKind,
    ) -> Result<PlacedCall, GatewayError> {
        let body = call_body(request, &kind, self.webhook_url.as_deref());
        let res = self
            .client
            .post(format!("{}/v1/calls", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status.as_u16(), body));
        }
        let parsed: PlaceCallResponse = res.json().await?;
        let call_id = parsed
            .call_id
            .filter(|id| !id.is_empty())
            .ok_or(GatewayError::Malformed("response missing call_id"))?;
        Ok(PlacedCall {
            call_id,
            status: parsed.status.unwrap_or_else(|| "queued".to_string()),
        })
    }
}

#[async_trait]
impl VoiceGateway for BlandGateway {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError> {
        self.start_call(request, CallKind::Interactive).await
    }

    async fn fetch_transcript(&self, call_id: &str) -> Result<CallTranscript, GatewayError> {
        let res = self
            .client
            .get(format!("{}/v1/calls/{}", self.base_url, call_id))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status.as_u16(), body));
        }
        let parsed: CallDetailsResponse = res.json().await?;
        Ok(parsed.into_transcript())
    }

    async fn leave_voicemail(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError> {
        self.start_call(request, CallKind::Voicemail).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CallRequest {
        CallRequest {
            phone_number: "+12105550123".to_string(),
            script: "Hello, this is a reminder.".to_string(),
            correlation_id: "corr-1".to_string(),
        }
    }

    #[test]
    fn interactive_body_carries_call_flags() {
        let req = request();
        let body = call_body(&req, &CallKind::Interactive, Some("https://example.com/hook"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["phone_number"], "+12105550123");
        assert_eq!(json["voice"], "maya");
        assert_eq!(json["language"], "en-US");
        assert_eq!(json["max_duration"], 300);
        assert_eq!(json["wait_for_greeting"], true);
        assert_eq!(json["record"], true);
        assert_eq!(json["amd"], true);
        assert_eq!(json["webhook"], "https://example.com/hook");
        assert_eq!(json["metadata"]["correlation_id"], "corr-1");
        assert!(json.get("voicemail_message").is_none());
    }

    #[test]
    fn voicemail_body_swaps_flags_for_message() {
        let req = request();
        let body = call_body(&req, &CallKind::Voicemail, Some("https://example.com/hook"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_duration"], 120);
        assert_eq!(json["voicemail_message"], "Hello, this is a reminder.");
        assert!(json.get("wait_for_greeting").is_none());
        assert!(json.get("amd").is_none());
        assert!(json.get("webhook").is_none());
    }

    #[test]
    fn details_prefer_concatenated_transcript() {
        let parsed: CallDetailsResponse = serde_json::from_str(
            r#"{
                "concatenated_transcript": "Yes, I will be there.",
                "transcript": "stale",
                "call_length": 42.6,
                "completed": true
            }"#,
        )
        .unwrap();
        let details = parsed.into_transcript();
        assert_eq!(details.transcript, "Yes, I will be there.");
        assert_eq!(details.duration_seconds, 43);
        assert!(details.completed);
    }

    #[test]
    fn details_join_turns_when_flat_fields_missing() {
        let parsed: CallDetailsResponse = serde_json::from_str(
            r#"{
                "transcripts": [
                    {"user": "assistant", "text": "Hello."},
                    {"user": "user", "text": "Yes, see you then."}
                ]
            }"#,
        )
        .unwrap();
        let details = parsed.into_transcript();
        assert_eq!(details.transcript, "Hello. Yes, see you then.");
        assert_eq!(details.duration_seconds, 0);
        assert!(!details.completed);
    }

    #[test]
    fn empty_details_yield_empty_transcript() {
        let parsed: CallDetailsResponse = serde_json::from_str("{}").unwrap();
        let details = parsed.into_transcript();
        assert!(details.transcript.is_empty());
        assert!(!details.completed);
    }
}
