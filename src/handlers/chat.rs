use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AppointmentRecord, ConversationState, Intent, INSURANCE_TYPES};
use crate::services::appointment;
use crate::services::conversation;
use crate::state::{AppState, Session};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub action: Option<String>,
    pub session_id: Option<String>,
    // pre-collected appointment fields for the "schedule" action
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    #[serde(rename = "insuranceType")]
    pub insurance_type: Option<String>,
    #[serde(rename = "preferredDate")]
    pub preferred_date: Option<String>,
    #[serde(rename = "preferredTime")]
    pub preferred_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub state: ConversationState,
    #[serde(rename = "appointmentScheduled")]
    pub appointment_scheduled: bool,
    pub session_id: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session_id = req
        .session_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    match req.action.as_deref().unwrap_or("chat") {
        "chat" => {
            let message = req
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .ok_or(AppError::MissingMessage)?;

            let out = conversation::process_message(&state, &session_id, message).await?;
            Ok(Json(ChatResponse {
                response: out.response,
                intent: Some(out.intent),
                state: out.state,
                appointment_scheduled: out.appointment_scheduled,
                session_id,
            }))
        }
        "schedule" => schedule(&state, session_id, &req),
        "reset" => {
            let mut sessions = state.sessions.lock().unwrap();
            sessions.insert(session_id.clone(), Session::default());
            Ok(Json(ChatResponse {
                response: "Conversation reset successfully".to_string(),
                intent: None,
                state: ConversationState::Greeting,
                appointment_scheduled: false,
                session_id,
            }))
        }
        other => Err(AppError::BadRequest(format!("Unknown action: {other}"))),
    }
}

/// Direct scheduling with pre-collected fields, bypassing the conversational
/// flow. The same field validators apply; the record is persisted
/// immediately and the session context is pre-filled to match.
fn schedule(
    state: &AppState,
    session_id: String,
    req: &ChatRequest,
) -> Result<Json<ChatResponse>, AppError> {
    let name = appointment::validate_name(req.name.as_deref().unwrap_or(""))
        .map_err(AppError::BadRequest)?;
    let email = appointment::validate_email(req.email.as_deref().unwrap_or(""))
        .map_err(AppError::BadRequest)?;
    let mobile = appointment::validate_mobile(req.mobile.as_deref().unwrap_or(""))
        .map_err(AppError::BadRequest)?;

    let insurance_type = req
        .insurance_type
        .as_deref()
        .map(str::trim)
        .and_then(|t| {
            INSURANCE_TYPES
                .iter()
                .find(|known| known.eq_ignore_ascii_case(t))
        })
        .map(|t| t.to_string())
        .ok_or_else(|| AppError::BadRequest("Invalid insurance type".to_string()))?;

    let preferred_date = appointment::validate_date(req.preferred_date.as_deref().unwrap_or(""))
        .map_err(AppError::BadRequest)?;
    let preferred_time = appointment::validate_time(req.preferred_time.as_deref().unwrap_or(""))
        .map_err(AppError::BadRequest)?;

    let record = AppointmentRecord {
        name,
        email,
        mobile,
        insurance_type,
        preferred_date,
        preferred_time,
        appointment_needed: true,
    };
    state.store.append_appointment(&record)?;

    let response = format!(
        "Appointment scheduled for {} at {}",
        record.preferred_date, record.preferred_time
    );

    let mut sessions = state.sessions.lock().unwrap();
    let session = sessions.entry(session_id.clone()).or_default();
    session.context.set_user_name(&record.name);
    session.context.set_insurance_type(&record.insurance_type);
    session.context.update_collected_info([
        ("email".to_string(), record.email.clone()),
        ("mobile".to_string(), record.mobile.clone()),
        ("preferred_date".to_string(), record.preferred_date.clone()),
        ("preferred_time".to_string(), record.preferred_time.clone()),
    ]);
    session.context.appointment_scheduled = true;
    let current_state = session.context.current_state;

    Ok(Json(ChatResponse {
        response,
        intent: None,
        state: current_state,
        appointment_scheduled: true,
        session_id,
    }))
}
