mod reporting;
mod transitions;

use crate::core::campaign::CampaignSettings;
use crate::core::contact::ContactRow;

pub(crate) fn test_settings() -> CampaignSettings {
    CampaignSettings {
        max_attempts: 3,
        retry_interval_minutes: 0,
        country_code: "+1".to_string(),
        concurrency_limit: 3,
        batch_size: 10,
        batch_delay_seconds: 0,
    }
}

pub(crate) fn row(name: &str, phone: &str) -> ContactRow {
    ContactRow {
        phone_number: Some(phone.to_string()),
        patient_name: Some(name.to_string()),
        date: Some("2026-09-03".to_string()),
        time: Some("10:30 AM".to_string()),
        provider_name: Some("Dr. Shah".to_string()),
        office_location: Some("Main St Clinic".to_string()),
    }
}
