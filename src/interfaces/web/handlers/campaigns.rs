use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use tokio::sync::Mutex;
use tracing::info;

use super::super::{AppState, CampaignHandle};
use crate::core::campaign::{CampaignRun, CampaignRunner, CampaignStatus, Dispatcher};
use crate::core::contact::ContactRow;

#[derive(serde::Deserialize)]
pub struct CreateCampaignRequest {
    rows: Vec<ContactRow>,
    max_attempts: Option<u32>,
    retry_interval_minutes: Option<u64>,
    concurrency_limit: Option<usize>,
    batch_size: Option<usize>,
    batch_delay_seconds: Option<u64>,
}

pub async fn create_campaign_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<CreateCampaignRequest>,
) -> Json<serde_json::Value> {
    let mut defaults = state.config.campaign.clone();
    if let Some(v) = payload.max_attempts {
        defaults.max_attempts = v;
    }
    if let Some(v) = payload.retry_interval_minutes {
        defaults.retry_interval_minutes = v;
    }
    if let Some(v) = payload.concurrency_limit {
        defaults.concurrency_limit = v;
    }
    if let Some(v) = payload.batch_size {
        defaults.batch_size = v;
    }
    if let Some(v) = payload.batch_delay_seconds {
        defaults.batch_delay_seconds = v;
    }
    defaults.clamp();

    let run = CampaignRun::new(&payload.rows, defaults.settings());
    let campaign_id = run.id.clone();
    let total_contacts = run.trackers.len();
    let validation_failures = run.validation_failures.clone();
    info!(
        "Campaign {} created: {} contact(s), {} rejected row(s)",
        campaign_id,
        total_contacts,
        validation_failures.len()
    );

    let handle = CampaignHandle {
        run: Arc::new(Mutex::new(run)),
        cancel: tokio_util::sync::CancellationToken::new(),
    };
    state
        .campaigns
        .lock()
        .await
        .insert(campaign_id.clone(), handle);

    Json(serde_json::json!({
        "success": true,
        "campaign_id": campaign_id,
        "total_contacts": total_contacts,
        "validation_failures": validation_failures,
    }))
}

pub async fn start_campaign_endpoint(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    let handle = {
        let campaigns = state.campaigns.lock().await;
        match campaigns.get(&id) {
            Some(handle) => handle.clone(),
            None => {
                return Json(
                    serde_json::json!({ "success": false, "error": "Campaign not found" }),
                );
            }
        }
    };

    // Transition under the lock so a racing second start sees Running.
    {
        let mut run = handle.run.lock().await;
        if run.status != CampaignStatus::Created {
            return Json(serde_json::json!({
                "success": false,
                "error": format!("Campaign is already {}", run.status.as_str())
            }));
        }
        run.transition(CampaignStatus::Running);
    }

    let dispatcher = Dispatcher::new(
        state.gateway.clone(),
        state.config.clinic.clone(),
        state.correlations.clone(),
        state.config.gateway.webhook_url.is_some(),
    )
    .with_tuning(state.tuning.clone());
    let runner = CampaignRunner::new(dispatcher);
    let run = handle.run.clone();
    let cancel = handle.cancel.clone();
    tokio::spawn(async move {
        let report = runner.run(&run, &cancel).await;
        info!(
            "Campaign {} {}: {}/{} contact(s) resolved",
            report.campaign_id, report.status, report.completed, report.total_contacts
        );
    });

    Json(serde_json::json!({ "success": true, "message": "Campaign started" }))
}

pub async fn stop_campaign_endpoint(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    let campaigns = state.campaigns.lock().await;
    match campaigns.get(&id) {
        Some(handle) => {
            if handle.run.lock().await.is_finished() {
                return Json(
                    serde_json::json!({ "success": false, "error": "Campaign already finished" }),
                );
            }
            handle.cancel.cancel();
            info!("Campaign {}: stop requested", id);
            Json(serde_json::json!({ "success": true, "message": "Stop requested" }))
        }
        None => Json(serde_json::json!({ "success": false, "error": "Campaign not found" })),
    }
}

pub async fn get_campaign_endpoint(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    let campaigns = state.campaigns.lock().await;
    match campaigns.get(&id) {
        Some(handle) => {
            let report = handle.run.lock().await.report();
            Json(serde_json::json!({
                "success": true,
                "campaign_id": report.campaign_id,
                "status": report.status,
                "total_contacts": report.total_contacts,
                "attempted": report.attempted,
                "completed": report.completed,
                "status_counts": report.status_counts,
            }))
        }
        None => Json(serde_json::json!({ "success": false, "error": "Campaign not found" })),
    }
}

pub async fn get_report_endpoint(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    let campaigns = state.campaigns.lock().await;
    match campaigns.get(&id) {
        Some(handle) => {
            let report = handle.run.lock().await.report();
            Json(serde_json::json!({ "success": true, "report": report }))
        }
        None => Json(serde_json::json!({ "success": false, "error": "Campaign not found" })),
    }
}

pub async fn list_campaigns_endpoint(State(state): State<AppState>) -> Json<serde_json::Value> {
    let campaigns = state.campaigns.lock().await;
    let mut summaries = Vec::with_capacity(campaigns.len());
    for handle in campaigns.values() {
        let run = handle.run.lock().await;
        summaries.push(serde_json::json!({
            "campaign_id": run.id,
            "status": run.status.as_str(),
            "total_contacts": run.trackers.len(),
        }));
    }
    Json(serde_json::json!({ "success": true, "campaigns": summaries }))
}
