use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{
    AppointmentField, AppointmentRecord, ConversationContext, PendingAppointment,
    EMAIL_NOT_PROVIDED, INSURANCE_TYPES,
};

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\s]{2,50}$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.+-]+@[\w.-]+\.\w+$").unwrap());
static MOBILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

// ── Field validators ──
//
// Each returns Ok(normalized value) or Err(retry message). The flow loops
// on Err; malformed input is never accepted and never a hard failure.

pub fn validate_name(input: &str) -> Result<String, String> {
    let name = input.trim();
    if NAME_RE.is_match(name) {
        Ok(name.to_string())
    } else {
        Err("Invalid name. Use only alphabets (2-50 characters).".to_string())
    }
}

/// Email is optional: an empty reply or "skip" records the sentinel.
pub fn validate_email(input: &str) -> Result<String, String> {
    let email = input.trim();
    if email.is_empty() || email.eq_ignore_ascii_case("skip") {
        return Ok(EMAIL_NOT_PROVIDED.to_string());
    }
    if EMAIL_RE.is_match(email) {
        Ok(email.to_string())
    } else {
        Err("Invalid email format. Please try again, or reply 'skip'.".to_string())
    }
}

pub fn validate_mobile(input: &str) -> Result<String, String> {
    let mobile = input.trim();
    if MOBILE_RE.is_match(mobile) {
        Ok(mobile.to_string())
    } else {
        Err("Invalid mobile number. Use 10 digits.".to_string())
    }
}

/// 1-based index into the fixed insurance type list.
pub fn parse_insurance_choice(input: &str) -> Result<String, String> {
    let choice: usize = input
        .trim()
        .parse()
        .map_err(|_| "Invalid selection. Please choose a number from the list.".to_string())?;
    INSURANCE_TYPES
        .get(choice.wrapping_sub(1))
        .map(|t| t.to_string())
        .ok_or_else(|| "Invalid selection. Please choose a number from the list.".to_string())
}

pub fn validate_date(input: &str) -> Result<String, String> {
    let date = input.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| date.to_string())
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

pub fn validate_time(input: &str) -> Result<String, String> {
    let time = input.trim();
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|_| time.to_string())
        .map_err(|_| "Invalid time format. Use HH:MM in 24-hour format.".to_string())
}

// ── Collection flow ──

/// Start a collection flow, pre-filling fields the conversation already
/// established so they are skipped.
pub fn start_flow(ctx: &ConversationContext) -> PendingAppointment {
    PendingAppointment {
        name: ctx.user_name.clone(),
        insurance_type: ctx.insurance_type.clone(),
        ..PendingAppointment::default()
    }
}

/// The next field still missing, in the fixed collection order.
pub fn next_field(pending: &PendingAppointment) -> Option<AppointmentField> {
    if pending.name.is_none() {
        Some(AppointmentField::Name)
    } else if pending.email.is_none() {
        Some(AppointmentField::Email)
    } else if pending.mobile.is_none() {
        Some(AppointmentField::Mobile)
    } else if pending.insurance_type.is_none() {
        Some(AppointmentField::InsuranceType)
    } else if pending.preferred_date.is_none() {
        Some(AppointmentField::Date)
    } else if pending.preferred_time.is_none() {
        Some(AppointmentField::Time)
    } else {
        None
    }
}

pub fn prompt_for(field: AppointmentField) -> String {
    match field {
        AppointmentField::Name => "Full Name:".to_string(),
        AppointmentField::Email => "Email (optional, reply 'skip' to skip):".to_string(),
        AppointmentField::Mobile => "Mobile Number (10 digits):".to_string(),
        AppointmentField::InsuranceType => {
            let mut prompt = String::from("Select Insurance Type:\n");
            for (i, ins_type) in INSURANCE_TYPES.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, ins_type));
            }
            prompt.push_str("Enter the number of your insurance type:");
            prompt
        }
        AppointmentField::Date => "Preferred Date (YYYY-MM-DD):".to_string(),
        AppointmentField::Time => "Preferred Time (HH:MM, 24-hour format):".to_string(),
    }
}

/// Validate `input` for `field` and store it on success.
pub fn apply_input(
    pending: &mut PendingAppointment,
    field: AppointmentField,
    input: &str,
) -> Result<(), String> {
    match field {
        AppointmentField::Name => pending.name = Some(validate_name(input)?),
        AppointmentField::Email => pending.email = Some(validate_email(input)?),
        AppointmentField::Mobile => pending.mobile = Some(validate_mobile(input)?),
        AppointmentField::InsuranceType => {
            pending.insurance_type = Some(parse_insurance_choice(input)?)
        }
        AppointmentField::Date => pending.preferred_date = Some(validate_date(input)?),
        AppointmentField::Time => pending.preferred_time = Some(validate_time(input)?),
    }
    Ok(())
}

/// Build the immutable record once every field is present.
pub fn into_record(pending: &PendingAppointment) -> Option<AppointmentRecord> {
    Some(AppointmentRecord {
        name: pending.name.clone()?,
        email: pending
            .email
            .clone()
            .unwrap_or_else(|| EMAIL_NOT_PROVIDED.to_string()),
        mobile: pending.mobile.clone()?,
        insurance_type: pending.insurance_type.clone()?,
        preferred_date: pending.preferred_date.clone()?,
        preferred_time: pending.preferred_time.clone()?,
        appointment_needed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_accepts_letters_and_spaces() {
        assert_eq!(validate_name("Kofi Mensah").unwrap(), "Kofi Mensah");
        assert!(validate_name("K").is_err());
        assert!(validate_name("Kofi99").is_err());
        let too_long = "a".repeat(51);
        assert!(validate_name(&too_long).is_err());
    }

    #[test]
    fn test_email_optional_with_sentinel() {
        assert_eq!(validate_email("").unwrap(), EMAIL_NOT_PROVIDED);
        assert_eq!(validate_email("skip").unwrap(), EMAIL_NOT_PROVIDED);
        assert_eq!(validate_email("a@b.com").unwrap(), "a@b.com");
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_mobile_requires_exactly_ten_digits() {
        assert!(validate_mobile("123456789").is_err());
        assert!(validate_mobile("12345678901").is_err());
        assert!(validate_mobile("12345abcde").is_err());
        assert_eq!(validate_mobile("0244123456").unwrap(), "0244123456");
    }

    #[test]
    fn test_insurance_choice_is_one_based() {
        assert_eq!(parse_insurance_choice("1").unwrap(), "Health Insurance");
        assert_eq!(parse_insurance_choice("6").unwrap(), "Business Insurance");
        assert!(parse_insurance_choice("0").is_err());
        assert!(parse_insurance_choice("7").is_err());
        assert!(parse_insurance_choice("two").is_err());
    }

    #[test]
    fn test_date_rejects_impossible_dates() {
        assert!(validate_date("2024-13-40").is_err());
        assert!(validate_date("15-03-2024").is_err());
        assert_eq!(validate_date("2024-03-15").unwrap(), "2024-03-15");
    }

    #[test]
    fn test_time_is_24_hour() {
        assert_eq!(validate_time("14:30").unwrap(), "14:30");
        assert!(validate_time("2pm").is_err());
        assert!(validate_time("25:00").is_err());
    }

    #[test]
    fn test_flow_skips_prefilled_fields() {
        let mut ctx = ConversationContext::new();
        ctx.set_user_name("Ama");
        ctx.set_insurance_type("Travel Insurance");

        let mut pending = start_flow(&ctx);
        assert_eq!(next_field(&pending), Some(AppointmentField::Email));

        apply_input(&mut pending, AppointmentField::Email, "skip").unwrap();
        assert_eq!(next_field(&pending), Some(AppointmentField::Mobile));
        apply_input(&mut pending, AppointmentField::Mobile, "0244123456").unwrap();
        // insurance type was prefilled, flow jumps straight to the date
        assert_eq!(next_field(&pending), Some(AppointmentField::Date));
        apply_input(&mut pending, AppointmentField::Date, "2024-03-15").unwrap();
        apply_input(&mut pending, AppointmentField::Time, "10:00").unwrap();
        assert_eq!(next_field(&pending), None);

        let record = into_record(&pending).unwrap();
        assert_eq!(record.name, "Ama");
        assert_eq!(record.insurance_type, "Travel Insurance");
        assert_eq!(record.email, EMAIL_NOT_PROVIDED);
        assert!(record.appointment_needed);
    }

    #[test]
    fn test_invalid_input_does_not_advance_flow() {
        let ctx = ConversationContext::new();
        let mut pending = start_flow(&ctx);
        assert_eq!(next_field(&pending), Some(AppointmentField::Name));

        let err = apply_input(&mut pending, AppointmentField::Name, "42").unwrap_err();
        assert!(err.contains("Invalid name"));
        assert_eq!(next_field(&pending), Some(AppointmentField::Name));
    }
}
