use serde::{Deserialize, Serialize};

/// The fixed set of insurance products a consultation can be booked for.
pub const INSURANCE_TYPES: [&str; 6] = [
    "Health Insurance",
    "Life Insurance",
    "Auto Insurance",
    "Home Insurance",
    "Travel Insurance",
    "Business Insurance",
];

/// Sentinel recorded when the customer skips the optional email field.
pub const EMAIL_NOT_PROVIDED: &str = "Not Provided";

/// A completed consultation booking. Built once by the collection flow
/// (or the direct schedule action) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRecord {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub insurance_type: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub appointment_needed: bool,
}

/// The ordered fields the collection flow walks through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentField {
    Name,
    Email,
    Mobile,
    InsuranceType,
    Date,
    Time,
}

/// Partially collected appointment details, carried on the conversation
/// context while the scheduling flow is in progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingAppointment {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub insurance_type: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
}
