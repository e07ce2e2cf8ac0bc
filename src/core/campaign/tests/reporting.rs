use super::{row, test_settings};
use crate::core::campaign::{CallRecord, CampaignRun, CampaignStatus, Outcome};
use crate::core::contact::ContactRow;

fn rec(transcript: &str, duration_seconds: u32) -> CallRecord {
    CallRecord {
        success: true,
        call_id: Some("call-1".to_string()),
        error: None,
        transcript: transcript.to_string(),
        duration_seconds,
    }
}

#[test]
fn report_zero_fills_every_outcome() {
    let rows = vec![
        row("Maria Lopez", "2105550111"),
        ContactRow {
            patient_name: Some("No Phone".to_string()),
            ..Default::default()
        },
    ];
    let run = CampaignRun::new(&rows, test_settings());
    let report = run.report();

    assert_eq!(report.total_contacts, 1);
    assert_eq!(report.validation_failures.len(), 1);
    for outcome in Outcome::ALL {
        assert!(
            report.status_counts.contains_key(outcome.as_str()),
            "missing key {}",
            outcome.as_str()
        );
    }
    assert_eq!(report.status_counts["pending"], 1);
    assert_eq!(report.success_rate, 0.0);
    assert_eq!(report.average_call_seconds, 0.0);
    assert_eq!(report.status, "created");
    assert!(!report.stopped);
    assert!(report.started_at.is_none());
}

#[test]
fn success_rate_is_definitive_over_attempted() {
    let rows = vec![
        row("A", "2105550111"),
        row("B", "2105550112"),
        row("C", "2105550113"),
    ];
    let mut run = CampaignRun::new(&rows, test_settings());
    run.trackers[0].apply_attempt(Outcome::Confirmed, rec("Yes.", 30));
    run.trackers[1].apply_attempt(Outcome::BusyVoicemail, rec("", 0));

    let report = run.report();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.completed, 1);
    assert!((report.success_rate - 0.5).abs() < 1e-9);
    assert_eq!(report.total_call_seconds, 30);
    assert!((report.average_call_seconds - 15.0).abs() < 1e-9);
    assert_eq!(report.status_counts["confirmed"], 1);
    assert_eq!(report.status_counts["busy_voicemail"], 1);
    assert_eq!(report.status_counts["pending"], 1);
}

#[test]
fn report_rows_carry_attempts_and_errors() {
    let rows = vec![row("Maria Lopez", "2105550111")];
    let mut run = CampaignRun::new(&rows, test_settings());
    run.trackers[0].apply_attempt(
        Outcome::Failed,
        CallRecord::initiation_failure("gateway transport error: refused".to_string()),
    );
    run.trackers[0].apply_attempt(Outcome::Confirmed, rec("Yes, I confirm.", 45));

    let report = run.report();
    let contact = &report.contacts[0];
    assert_eq!(contact.sheet_index, 0);
    assert_eq!(contact.patient_name, "Maria Lopez");
    assert_eq!(contact.attempts, 2);
    assert_eq!(contact.outcome, Outcome::Confirmed);
    assert_eq!(contact.call_seconds, 45);
    assert_eq!(contact.transcript_excerpt.as_deref(), Some("Yes, I confirm."));
    assert!(contact.last_error.as_deref().unwrap().contains("refused"));
    assert_eq!(report.total_call_seconds, 45);
}

#[test]
fn long_transcripts_are_excerpted() {
    let rows = vec![row("Maria Lopez", "2105550111")];
    let mut run = CampaignRun::new(&rows, test_settings());
    let rambling = "well ".repeat(80);
    run.trackers[0].apply_attempt(Outcome::BusyVoicemail, rec(&rambling, 10));

    let report = run.report();
    let excerpt = report.contacts[0].transcript_excerpt.as_deref().unwrap();
    assert!(excerpt.ends_with("..."));
    assert!(excerpt.chars().count() < rambling.len());
}

#[test]
fn stopped_flag_follows_status() {
    let mut run = CampaignRun::new(&[row("Maria Lopez", "2105550111")], test_settings());
    run.transition(CampaignStatus::Running);
    run.transition(CampaignStatus::Stopped);

    let report = run.report();
    assert_eq!(report.status, "stopped");
    assert!(report.stopped);
    assert!(report.finished_at.is_some());
}

#[test]
fn report_serializes_with_snake_case_outcomes() {
    let mut run = CampaignRun::new(&[row("Maria Lopez", "2105550111")], test_settings());
    run.trackers[0].apply_attempt(Outcome::WrongNumber, rec("You have the wrong number.", 8));

    let json = serde_json::to_value(run.report()).unwrap();
    assert_eq!(json["status_counts"]["wrong_number"], 1);
    assert_eq!(json["status_counts"]["confirmed"], 0);
    assert_eq!(json["contacts"][0]["outcome"], "wrong_number");
    assert_eq!(json["total_contacts"], 1);
    assert!(json["campaign_id"].as_str().is_some());
}
