use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use tracing::{debug, warn};

use super::super::AppState;
use crate::core::gateway::CallTranscript;

/// Completion push from the gateway. `correlation_id` is the id this side
/// attached to the original call request.
#[derive(serde::Deserialize)]
pub struct GatewayCallback {
    call_id: Option<String>,
    correlation_id: String,
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    duration_seconds: u32,
    status: Option<String>,
}

/// Receives call completions pushed by the gateway. The raw body is needed
/// for signature verification, so JSON parsing happens after the check.
pub async fn gateway_webhook_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(secret) = state.config.gateway.webhook_secret.as_deref()
        && !secret.is_empty()
        && !verify_signature(&headers, &body, secret)
    {
        warn!("Rejected gateway webhook: missing or invalid signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "success": false,
                "error": "Signature verification failed"
            })),
        );
    }

    let payload: GatewayCallback = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "success": false,
                    "error": format!("Invalid webhook payload: {}", e)
                })),
            );
        }
    };

    let completed = payload
        .status
        .as_deref()
        .map_or(true, |s| s.eq_ignore_ascii_case("completed"));
    let transcript = CallTranscript {
        transcript: payload.transcript,
        duration_seconds: payload.duration_seconds,
        completed,
    };

    if state
        .correlations
        .resolve(&payload.correlation_id, transcript)
        .await
    {
        debug!(
            "Webhook push delivered for correlation {} (call {})",
            payload.correlation_id,
            payload.call_id.as_deref().unwrap_or("unknown")
        );
        (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "message": "Call result delivered" })),
        )
    } else {
        // Acknowledge anyway so the gateway does not keep retrying pushes for
        // attempts that already fell back to polling.
        warn!(
            "No attempt waiting on correlation {} (call {})",
            payload.correlation_id,
            payload.call_id.as_deref().unwrap_or("unknown")
        );
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "No attempt waiting on this correlation id"
            })),
        )
    }
}

/// Verify `X-Signature: sha256=<hex>` as HMAC-SHA256 over the raw body.
/// Fails closed: no recognized header, no delivery.
fn verify_signature(headers: &HeaderMap, body: &str, secret: &str) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let Some(sig) = headers.get("x-signature").and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let hex_sig = sig.strip_prefix("sha256=").unwrap_or(sig);

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(hex_sig.as_bytes(), expected.as_bytes())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
