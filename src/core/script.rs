//! Call script rendering.
//!
//! The reminder script is the interactive prompt read by the voice agent;
//! the voicemail script is the shorter non-interactive variant used after
//! retries are exhausted. Clinic identity (name, callback number) comes from
//! configuration so one deployment can serve different practices.

use crate::core::config::ClinicInfo;
use crate::core::contact::Contact;

/// Interactive reminder script for a live call.
pub fn reminder_script(contact: &Contact, clinic: &ClinicInfo) -> String {
    format!(
        "Hi, good morning! I'm calling from {clinic}. This call is for {patient} to remind \
         you of an upcoming appointment on {date} at {time} with {provider} at our {location} \
         office. Please confirm if you'll be able to attend this appointment, or let me know \
         if you need to reschedule or cancel. Please make sure to arrive 15 minutes prior to \
         your appointment, and email us your insurance information ahead of time so we can get \
         it verified and avoid any delays on the day of your appointment. If you wish to \
         cancel or reschedule, please inform us at least 24 hours in advance to avoid a \
         cancellation charge of $25.00. For more information, you can call us back on \
         {callback}. Thank you and have a blessed day.",
        clinic = clinic.name,
        patient = contact.patient_name,
        date = contact.appointment_date,
        time = contact.appointment_time,
        provider = contact.provider_name,
        location = contact.office_location,
        callback = clinic.callback_number,
    )
}

/// Non-interactive script left as a voicemail message.
pub fn voicemail_script(contact: &Contact, clinic: &ClinicInfo) -> String {
    format!(
        "Hi, good morning! I'm calling from {clinic}. This message is for {patient} to remind \
         you of an upcoming appointment on {date} at {time} with {provider} at our {location} \
         office. Please make sure to arrive 15 minutes prior to your appointment. To confirm, \
         reschedule, or cancel, please call us back on {callback} at least 24 hours in advance \
         to avoid a cancellation charge of $25.00. Thank you and have a blessed day.",
        clinic = clinic.name,
        patient = contact.patient_name,
        date = contact.appointment_date,
        time = contact.appointment_time,
        provider = contact.provider_name,
        location = contact.office_location,
        callback = clinic.callback_number,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            sheet_index: 0,
            phone_number: "+12105550187".to_string(),
            patient_name: "Alice Becker".to_string(),
            provider_name: "Dr. Navarro".to_string(),
            appointment_date: "March 4".to_string(),
            appointment_time: "10:30 AM".to_string(),
            office_location: "Downtown".to_string(),
        }
    }

    #[test]
    fn reminder_script_mentions_every_appointment_field() {
        let clinic = ClinicInfo::default();
        let script = reminder_script(&contact(), &clinic);
        for needle in [
            "Alice Becker",
            "Dr. Navarro",
            "March 4",
            "10:30 AM",
            "Downtown",
            &clinic.name,
            &clinic.callback_number,
        ] {
            assert!(script.contains(needle), "missing {needle:?} in script");
        }
        assert!(script.contains("reschedule or cancel"));
    }

    #[test]
    fn voicemail_script_is_non_interactive() {
        let clinic = ClinicInfo::default();
        let script = voicemail_script(&contact(), &clinic);
        assert!(script.contains("This message is for"));
        assert!(!script.contains("Please confirm if you'll be able to attend"));
        assert!(script.contains(&clinic.callback_number));
    }
}
