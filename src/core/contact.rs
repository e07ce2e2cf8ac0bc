//! Contact rows and validation.
//!
//! Rows arrive from an external sheet parser as loosely-typed JSON. A row
//! either becomes a [Contact] (immutable, ready to dial) or a
//! [ValidationFailure] that is surfaced in the final report without ever
//! reaching the dialing loop.

use tracing::warn;

/// One raw input row. Every field is optional so that incomplete rows can be
/// rejected with a precise reason instead of a deserialization error.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ContactRow {
    #[serde(default, alias = "phone")]
    pub phone_number: Option<String>,
    #[serde(default, alias = "name")]
    pub patient_name: Option<String>,
    #[serde(default, alias = "appointment_date")]
    pub date: Option<String>,
    #[serde(default, alias = "appointment_time")]
    pub time: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub office_location: Option<String>,
}

/// A validated contact. `sheet_index` is the ordinal of the row in the input
/// sheet and stays stable for the life of the campaign.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Contact {
    pub sheet_index: usize,
    pub phone_number: String,
    pub patient_name: String,
    pub provider_name: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub office_location: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationFailure {
    pub sheet_index: usize,
    pub patient_name: Option<String>,
    pub reason: String,
}

fn required(value: &Option<String>, field: &str) -> Result<String, String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("missing required field '{}'", field)),
    }
}

/// Normalize a raw phone number: keep digits, prefix the campaign country
/// code unless the number already carries an explicit `+` prefix. Returns
/// None when too few digits remain to be dialable.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 {
        return None;
    }
    if raw.trim_start().starts_with('+') {
        return Some(format!("+{}", digits));
    }
    Some(format!("{}{}", country_code, digits))
}

/// Validate one row into a Contact. Errors carry the sheet index and the
/// best-effort patient name so the report can still identify the row.
pub fn validate_row(
    sheet_index: usize,
    row: &ContactRow,
    country_code: &str,
) -> Result<Contact, ValidationFailure> {
    let fail = |reason: String| ValidationFailure {
        sheet_index,
        patient_name: row.patient_name.clone().filter(|n| !n.trim().is_empty()),
        reason,
    };

    let raw_phone = required(&row.phone_number, "phone_number").map_err(&fail)?;
    let patient_name = required(&row.patient_name, "patient_name").map_err(&fail)?;
    let appointment_date = required(&row.date, "date").map_err(&fail)?;
    let appointment_time = required(&row.time, "time").map_err(&fail)?;
    let provider_name = required(&row.provider_name, "provider_name").map_err(&fail)?;
    let office_location = required(&row.office_location, "office_location").map_err(&fail)?;

    let phone_number = normalize_phone(&raw_phone, country_code)
        .ok_or_else(|| fail(format!("phone number '{}' is not dialable", raw_phone)))?;

    Ok(Contact {
        sheet_index,
        phone_number,
        patient_name,
        provider_name,
        appointment_date,
        appointment_time,
        office_location,
    })
}

/// Split a sheet of rows into validated contacts and rejected rows, logging
/// each rejection. Row order (and thereby `sheet_index`) is preserved.
pub fn validate_rows(
    rows: &[ContactRow],
    country_code: &str,
) -> (Vec<Contact>, Vec<ValidationFailure>) {
    let mut contacts = Vec::new();
    let mut failures = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match validate_row(index, row, country_code) {
            Ok(contact) => contacts.push(contact),
            Err(failure) => {
                warn!(
                    sheet_index = failure.sheet_index,
                    reason = %failure.reason,
                    "rejecting contact row"
                );
                failures.push(failure);
            }
        }
    }
    (contacts, failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row() -> ContactRow {
        ContactRow {
            phone_number: Some("210-555-0187".to_string()),
            patient_name: Some("Alice Becker".to_string()),
            date: Some("March 4".to_string()),
            time: Some("10:30 AM".to_string()),
            provider_name: Some("Dr. Navarro".to_string()),
            office_location: Some("Downtown".to_string()),
        }
    }

    #[test]
    fn valid_row_becomes_contact() {
        let contact = validate_row(3, &full_row(), "+1").unwrap();
        assert_eq!(contact.sheet_index, 3);
        assert_eq!(contact.phone_number, "+12105550187");
        assert_eq!(contact.patient_name, "Alice Becker");
    }

    #[test]
    fn missing_phone_is_rejected() {
        let mut row = full_row();
        row.phone_number = None;
        let failure = validate_row(0, &row, "+1").unwrap_err();
        assert!(failure.reason.contains("phone_number"));
        assert_eq!(failure.patient_name.as_deref(), Some("Alice Becker"));
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let mut row = full_row();
        row.provider_name = Some("   ".to_string());
        let failure = validate_row(0, &row, "+1").unwrap_err();
        assert!(failure.reason.contains("provider_name"));
    }

    #[test]
    fn explicit_plus_prefix_is_kept() {
        assert_eq!(
            normalize_phone("+44 20 7946 0958", "+1").as_deref(),
            Some("+442079460958")
        );
    }

    #[test]
    fn bare_digits_get_country_code() {
        assert_eq!(
            normalize_phone("(210) 555-0187", "+1").as_deref(),
            Some("+12105550187")
        );
    }

    #[test]
    fn short_number_is_not_dialable() {
        assert!(normalize_phone("12345", "+1").is_none());
        let mut row = full_row();
        row.phone_number = Some("911".to_string());
        let failure = validate_row(0, &row, "+1").unwrap_err();
        assert!(failure.reason.contains("not dialable"));
    }

    #[test]
    fn validate_rows_preserves_sheet_order() {
        let mut bad = full_row();
        bad.phone_number = Some(String::new());
        let rows = vec![full_row(), bad, full_row()];
        let (contacts, failures) = validate_rows(&rows, "+1");
        assert_eq!(contacts.len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(contacts[0].sheet_index, 0);
        assert_eq!(contacts[1].sheet_index, 2);
        assert_eq!(failures[0].sheet_index, 1);
    }

    #[test]
    fn row_aliases_are_accepted() {
        let row: ContactRow =
            serde_json::from_str(r#"{"phone":"2105550187","name":"Bo"}"#).unwrap();
        assert_eq!(row.phone_number.as_deref(), Some("2105550187"));
        assert_eq!(row.patient_name.as_deref(), Some("Bo"));
    }
}
