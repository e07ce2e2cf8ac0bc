//! Environment checks before a campaign spends money on real calls.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use url::Url;

use super::DoctorCommandArgs;
use crate::core::config::{API_KEY_ENV, AppConfig};
use crate::core::terminal::{
    self, print_error, print_info, print_status, print_step, print_success, print_warn,
};
use crate::logging::init_logging;

pub async fn run_doctor(args: DoctorCommandArgs) -> Result<()> {
    init_logging(false);
    print_step("callminder doctor: checking campaign prerequisites...");
    println!();

    let mut failed = false;

    // 1. Config file
    let config = match AppConfig::load(args.config.as_deref().map(Path::new)).await {
        Ok(config) => {
            print_success("Configuration loaded.");
            config
        }
        Err(e) => {
            print_error(&format!("Configuration is unreadable: {}", e));
            failed = true;
            AppConfig::default()
        }
    };

    // 2. API key
    match config.require_api_key() {
        Ok(_) => print_success("Gateway API key is configured."),
        Err(_) => {
            print_error(&format!(
                "No gateway API key. Set {} or gateway.api_key in config.toml.",
                API_KEY_ENV
            ));
            failed = true;
        }
    }

    // 3. Base URL
    match Url::parse(&config.gateway.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            print_success(&format!(
                "Gateway base URL is well-formed: {}",
                config.gateway.base_url
            ));
        }
        Ok(url) => {
            print_error(&format!(
                "Gateway base URL has scheme '{}', expected http or https.",
                url.scheme()
            ));
            failed = true;
        }
        Err(e) => {
            print_error(&format!("Gateway base URL will not parse: {}", e));
            failed = true;
        }
    }

    // 4. Webhook URL, when configured
    if let Some(webhook_url) = config.gateway.webhook_url.as_deref() {
        match Url::parse(webhook_url) {
            Ok(_) => print_success(&format!("Webhook URL is well-formed: {}", webhook_url)),
            Err(e) => {
                print_error(&format!("Webhook URL will not parse: {}", e));
                failed = true;
            }
        }
        if config.gateway.webhook_secret.is_none() {
            print_warn("Webhook pushes are unsigned: no gateway.webhook_secret configured.");
        }
    } else {
        print_info("No webhook URL configured; transcripts will be polled.");
    }

    // 5. Optional reachability probe
    if args.probe {
        probe_gateway(&config.gateway.base_url).await;
    }

    // 6. What dialed contacts will hear
    println!();
    print_status("Clinic", &config.clinic.name);
    print_status("Callback", &config.clinic.callback_number);
    print_status(
        "Attempts",
        &format!(
            "{} max, retry every {} minutes",
            config.campaign.max_attempts, config.campaign.retry_interval_minutes
        ),
    );

    println!();
    if failed {
        print_error("Some checks failed. Fix the items above before running a campaign.");
    } else {
        println!(
            "{} All checks passed. Ready to place calls.",
            terminal::PHONE
        );
    }

    Ok(())
}

/// Any HTTP response counts as reachable; the gateway answers its root with
/// an auth error rather than a timeout when it is up.
async fn probe_gateway(base_url: &str) {
    let client = reqwest::Client::new();
    match client
        .get(base_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(res) => print_success(&format!(
            "Gateway endpoint is reachable (HTTP {}).",
            res.status().as_u16()
        )),
        Err(e) => print_warn(&format!("Gateway endpoint is not reachable: {}", e)),
    }
}
