pub mod campaigns;
pub mod webhooks;

use axum::{Json, extract::State};

use super::AppState;

pub async fn health_endpoint(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "waiting_calls": state.correlations.waiting().await,
    }))
}
