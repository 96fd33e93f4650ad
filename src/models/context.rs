use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::appointment::PendingAppointment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    CollectingName,
    UnderstandingNeed,
    InsuranceDiscussion,
    SchedulingAppointment,
    Farewell,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Greeting => "greeting",
            ConversationState::CollectingName => "collecting_name",
            ConversationState::UnderstandingNeed => "understanding_need",
            ConversationState::InsuranceDiscussion => "insurance_discussion",
            ConversationState::SchedulingAppointment => "scheduling_appointment",
            ConversationState::Farewell => "farewell",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub role: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

/// Mutable per-session conversational state. A passive record: mutators do
/// no domain validation, that is the orchestrator's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub user_name: Option<String>,
    pub insurance_type: Option<String>,
    pub current_state: ConversationState,
    pub collected_info: HashMap<String, String>,
    pub history: Vec<TurnRecord>,
    pub appointment_scheduled: bool,
    pub appointment_suggested: bool,
    pub pending_appointment: Option<PendingAppointment>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            user_name: None,
            insurance_type: None,
            current_state: ConversationState::Greeting,
            collected_info: HashMap::new(),
            history: Vec::new(),
            appointment_scheduled: false,
            appointment_suggested: false,
            pending_appointment: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn set_user_name(&mut self, name: &str) {
        self.user_name = Some(name.to_string());
        self.collected_info
            .insert("name".to_string(), name.to_string());
    }

    pub fn set_insurance_type(&mut self, insurance_type: &str) {
        self.insurance_type = Some(insurance_type.to_string());
        self.collected_info
            .insert("insurance_type".to_string(), insurance_type.to_string());
    }

    pub fn update_state(&mut self, new_state: ConversationState) {
        self.current_state = new_state;
    }

    /// History is append-only and never pruned; unbounded growth is an
    /// accepted limitation of the design.
    pub fn add_to_history(&mut self, role: &str, content: &str) {
        self.history.push(TurnRecord {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().naive_utc(),
        });
    }

    pub fn update_collected_info<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.collected_info.extend(fields);
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}
