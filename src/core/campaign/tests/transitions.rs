use super::{row, test_settings};
use crate::core::campaign::{
    AttemptTracker, CallRecord, CampaignRun, CampaignStatus, Outcome, can_transition,
};
use crate::core::contact::Contact;

fn contact() -> Contact {
    Contact {
        sheet_index: 0,
        phone_number: "+12105550111".to_string(),
        patient_name: "Maria Lopez".to_string(),
        provider_name: "Dr. Shah".to_string(),
        appointment_date: "2026-09-03".to_string(),
        appointment_time: "10:30 AM".to_string(),
        office_location: "Main St Clinic".to_string(),
    }
}

fn answered(transcript: &str) -> CallRecord {
    CallRecord {
        success: true,
        call_id: Some("call-1".to_string()),
        error: None,
        transcript: transcript.to_string(),
        duration_seconds: 30,
    }
}

#[test]
fn lifecycle_happy_path_transitions_are_allowed() {
    assert!(can_transition(
        CampaignStatus::Created,
        CampaignStatus::Running
    ));
    assert!(can_transition(
        CampaignStatus::Running,
        CampaignStatus::Completed
    ));
    assert!(can_transition(
        CampaignStatus::Running,
        CampaignStatus::Stopped
    ));
}

#[test]
fn terminal_states_reject_every_transition() {
    for from in [CampaignStatus::Stopped, CampaignStatus::Completed] {
        for to in [
            CampaignStatus::Created,
            CampaignStatus::Running,
            CampaignStatus::Stopped,
            CampaignStatus::Completed,
        ] {
            assert!(!can_transition(from, to), "expected {from:?} -> {to:?} rejected");
        }
    }
}

#[test]
fn created_campaign_cannot_jump_to_terminal() {
    assert!(!can_transition(
        CampaignStatus::Created,
        CampaignStatus::Completed
    ));
    assert!(!can_transition(
        CampaignStatus::Created,
        CampaignStatus::Stopped
    ));
}

#[test]
fn invalid_transition_leaves_run_untouched() {
    let mut run = CampaignRun::new(&[row("Maria Lopez", "2105550111")], test_settings());
    assert!(!run.transition(CampaignStatus::Completed));
    assert_eq!(run.status, CampaignStatus::Created);
    assert!(run.finished_at.is_none());

    assert!(run.transition(CampaignStatus::Running));
    assert!(run.started_at.is_some());
    assert!(run.transition(CampaignStatus::Completed));
    assert!(run.finished_at.is_some());
}

#[test]
fn definitive_outcome_freezes_the_tracker() {
    let mut tracker = AttemptTracker::new(contact());
    tracker.apply_attempt(Outcome::Confirmed, answered("Yes, I confirm."));
    assert!(tracker.done);
    assert_eq!(tracker.attempts, 1);

    // A late result for a frozen contact is discarded entirely.
    tracker.apply_attempt(Outcome::Cancelled, answered("Cancel it."));
    assert_eq!(tracker.outcome, Outcome::Confirmed);
    assert_eq!(tracker.attempts, 1);
    assert_eq!(tracker.records.len(), 1);
}

#[test]
fn non_definitive_outcomes_stay_retryable() {
    let mut tracker = AttemptTracker::new(contact());
    tracker.apply_attempt(Outcome::BusyVoicemail, answered(""));
    assert!(!tracker.done);
    assert_eq!(tracker.outcome, Outcome::BusyVoicemail);
    assert!(tracker.retryable(3));

    tracker.apply_attempt(
        Outcome::Failed,
        CallRecord::initiation_failure("gateway error".to_string()),
    );
    assert!(!tracker.done);
    assert_eq!(tracker.outcome, Outcome::Failed);
    assert!(tracker.retryable(3));

    tracker.apply_attempt(Outcome::BusyVoicemail, answered(""));
    assert_eq!(tracker.attempts, 3);
    assert!(!tracker.retryable(3));
}

#[test]
fn voicemail_closure_happens_once() {
    let mut tracker = AttemptTracker::new(contact());
    tracker.close_with_voicemail(answered(""));
    assert!(tracker.done);
    assert!(tracker.voicemail_left);
    assert_eq!(tracker.outcome, Outcome::BusyVoicemail);
    assert_eq!(tracker.records.len(), 1);

    tracker.close_with_voicemail(answered(""));
    tracker.complete_with(Outcome::Failed, answered(""));
    assert_eq!(tracker.records.len(), 1);
    assert_eq!(tracker.outcome, Outcome::BusyVoicemail);
}

#[test]
fn pending_jobs_follow_sheet_order() {
    let rows = vec![
        row("Maria Lopez", "2105550111"),
        row("James Carter", "2105550112"),
        row("Dana Whitfield", "2105550113"),
    ];
    let mut run = CampaignRun::new(&rows, test_settings());
    let jobs = run.pending_jobs();
    assert_eq!(jobs.len(), 3);
    assert_eq!(
        jobs.iter().map(|j| j.contact.sheet_index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(jobs.iter().all(|j| j.attempt_no == 1));

    // Freezing the middle contact removes it without reordering the rest.
    run.trackers[1].apply_attempt(
        Outcome::Confirmed,
        CallRecord {
            success: true,
            call_id: None,
            error: None,
            transcript: "Yes.".to_string(),
            duration_seconds: 10,
        },
    );
    let jobs = run.pending_jobs();
    assert_eq!(
        jobs.iter().map(|j| j.contact.sheet_index).collect::<Vec<_>>(),
        vec![0, 2]
    );
}
