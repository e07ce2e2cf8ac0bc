//! API server mode.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use console::style;

use super::ServeCommandArgs;
use crate::core::config::AppConfig;
use crate::core::gateway::bland::BlandGateway;
use crate::core::terminal::{GuideSection, print_link};
use crate::interfaces::web::ApiServer;
use crate::logging::init_logging;

pub async fn run_server(args: ServeCommandArgs) -> Result<()> {
    init_logging(args.verbose);

    let mut config = AppConfig::load(args.config.as_deref().map(Path::new)).await?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let gateway = Arc::new(BlandGateway::from_config(&config)?);

    let endpoint = format!("http://{}:{}", config.server.host, config.server.port);
    GuideSection::new("Campaign API")
        .status(
            "Endpoint",
            &format!("{}", style(&endpoint).underlined().cyan()),
        )
        .status(
            "Transcripts",
            if config.gateway.webhook_url.is_some() {
                "webhook push"
            } else {
                "polling"
            },
        )
        .status(
            "Webhook auth",
            if config.gateway.webhook_secret.is_some() {
                "HMAC signature required"
            } else {
                "open"
            },
        )
        .blank()
        .text(&format!(
            "Press {} to stop the server.",
            style("Ctrl+C").bold().yellow()
        ))
        .print();
    println!();
    print_link("Health check", &format!("{}/api/health", endpoint));
    println!();

    ApiServer::new(Arc::new(config), gateway).serve().await
}
