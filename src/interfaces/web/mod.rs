//! HTTP surface: the campaign JSON API plus the gateway webhook receiver.
//!
//! Campaigns live in an in-memory registry keyed by id. Each entry pairs the
//! shared run state with the cancellation token that stops its scheduler, so
//! API reads can observe a run while the spawned runner drives it.

mod handlers;
mod router;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::campaign::{CallTuning, CampaignRun};
use crate::core::config::AppConfig;
use crate::core::gateway::VoiceGateway;
use crate::core::gateway::correlation::CorrelationRegistry;

pub(crate) type CampaignRegistry = Arc<Mutex<HashMap<String, CampaignHandle>>>;

/// One campaign as the API tracks it.
#[derive(Clone)]
pub(crate) struct CampaignHandle {
    pub(crate) run: Arc<Mutex<CampaignRun>>,
    pub(crate) cancel: CancellationToken,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) campaigns: CampaignRegistry,
    pub(crate) correlations: CorrelationRegistry,
    pub(crate) gateway: Arc<dyn VoiceGateway>,
    pub(crate) config: Arc<AppConfig>,
    pub(crate) tuning: CallTuning,
}

pub struct ApiServer {
    state: AppState,
    host: String,
    port: u16,
}

impl ApiServer {
    pub fn new(config: Arc<AppConfig>, gateway: Arc<dyn VoiceGateway>) -> Self {
        let host = config.server.host.clone();
        let port = config.server.port;
        Self {
            state: AppState {
                campaigns: Arc::new(Mutex::new(HashMap::new())),
                correlations: CorrelationRegistry::new(),
                gateway,
                config,
                tuning: CallTuning::default(),
            },
            host,
            port,
        }
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let app = router::build_api_router(self.state);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Campaign API running at http://{}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
