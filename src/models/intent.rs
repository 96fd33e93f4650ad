use serde::{Deserialize, Serialize};

/// Categorical label describing the purpose of a user utterance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Farewell,
    InsuranceInquiry,
    AppointmentRequest,
    ProblemDescription,
    ClaimRelated,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Farewell => "farewell",
            Intent::InsuranceInquiry => "insurance_inquiry",
            Intent::AppointmentRequest => "appointment_request",
            Intent::ProblemDescription => "problem_description",
            Intent::ClaimRelated => "claim_related",
            Intent::General => "general",
        }
    }
}
