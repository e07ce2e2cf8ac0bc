//! One-shot campaign execution from a contacts file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::RunCommandArgs;
use crate::core::campaign::{CampaignReport, CampaignRun, CampaignRunner, Dispatcher, Outcome};
use crate::core::config::AppConfig;
use crate::core::contact::{ContactRow, validate_rows};
use crate::core::gateway::bland::BlandGateway;
use crate::core::gateway::correlation::CorrelationRegistry;
use crate::core::script;
use crate::core::terminal::{GuideSection, print_step, print_success, print_warn};
use crate::logging::init_logging;

pub async fn run_campaign(args: RunCommandArgs) -> Result<()> {
    init_logging(args.verbose);

    let Some(contacts_path) = args.contacts.as_deref() else {
        anyhow::bail!("--contacts <file> is required");
    };

    let mut config = AppConfig::load(args.config.as_deref().map(Path::new)).await?;
    if let Some(n) = args.max_attempts {
        config.campaign.max_attempts = n;
        config.campaign.clamp();
    }

    let raw = tokio::fs::read_to_string(contacts_path)
        .await
        .with_context(|| format!("reading contacts file {}", contacts_path))?;
    let rows: Vec<ContactRow> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing contacts file {}", contacts_path))?;

    if args.dry_run {
        preview_campaign(&rows, &config);
        return Ok(());
    }

    let api_key = config.require_api_key()?;
    // The one-shot process has no HTTP listener, so transcripts are polled
    // rather than pushed; no webhook URL is advertised to the gateway.
    let gateway = Arc::new(BlandGateway::new(&config.gateway.base_url, api_key, None));
    let dispatcher = Dispatcher::new(
        gateway,
        config.clinic.clone(),
        CorrelationRegistry::new(),
        false,
    );
    let runner = CampaignRunner::new(dispatcher);

    let run = Arc::new(Mutex::new(CampaignRun::new(&rows, config.settings())));
    {
        let guard = run.lock().await;
        print_step(&format!(
            "Campaign {}: {} contacts to call, {} rows rejected.",
            guard.id,
            guard.trackers.len(),
            guard.validation_failures.len()
        ));
        println!();
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_warn("Stop requested. Letting in-flight calls finish...");
            signal_cancel.cancel();
        }
    });

    let report = runner.run(&run, &cancel).await;
    print_report(&report);

    if let Some(path) = args.report.as_deref() {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing report to {}", path))?;
        print_success(&format!("Full report written to {}", path));
    }

    Ok(())
}

/// Validate the sheet and show what would be dialed, without placing calls.
fn preview_campaign(rows: &[ContactRow], config: &AppConfig) {
    let (contacts, failures) = validate_rows(rows, &config.campaign.country_code);

    print_step("Dry run: validating contacts without placing calls.");

    let mut sheet = GuideSection::new("Contact Sheet")
        .status("Dialable", &contacts.len().to_string())
        .status("Rejected", &failures.len().to_string())
        .blank();
    for contact in &contacts {
        sheet = sheet.status(&contact.phone_number, &contact.patient_name);
    }
    sheet.print();

    if !failures.is_empty() {
        println!();
        for failure in &failures {
            print_warn(&format!(
                "Row {} ({}) skipped: {}",
                failure.sheet_index,
                failure.patient_name.as_deref().unwrap_or("unknown"),
                failure.reason
            ));
        }
    }

    if let Some(first) = contacts.first() {
        GuideSection::new("Script Preview")
            .text(&script::reminder_script(first, &config.clinic))
            .print();
    }
    println!();
}

fn print_report(report: &CampaignReport) {
    let mut summary = GuideSection::new("Campaign Summary")
        .status("Campaign", &report.campaign_id)
        .status("Status", &report.status)
        .status("Contacts", &report.total_contacts.to_string())
        .status("Attempted", &report.attempted.to_string())
        .status("Completed", &report.completed.to_string())
        .status("Voicemails", &report.voicemails_left.to_string())
        .status(
            "Success rate",
            &format!("{:.0}%", report.success_rate * 100.0),
        )
        .status(
            "Talk time",
            &format!(
                "{}s total, {:.1}s average",
                report.total_call_seconds, report.average_call_seconds
            ),
        )
        .blank();
    // Definitive outcomes are the ones that needed no further calls; render
    // them green so the resolved share stands out.
    for (outcome, count) in &report.status_counts {
        if *count == 0 {
            continue;
        }
        let definitive =
            Outcome::from_status(outcome).is_some_and(|o| o.is_definitive());
        let value = if definitive {
            format!("{}", style(count).green())
        } else {
            count.to_string()
        };
        summary = summary.status(outcome, &value);
    }
    summary.print();

    if !report.validation_failures.is_empty() {
        println!();
        for failure in &report.validation_failures {
            print_warn(&format!(
                "Row {} ({}) skipped: {}",
                failure.sheet_index,
                failure.patient_name.as_deref().unwrap_or("unknown"),
                failure.reason
            ));
        }
    }
    println!();
}
