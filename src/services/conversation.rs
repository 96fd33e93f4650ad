use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::models::{
    AppointmentRecord, ConversationContext, ConversationState, Intent, INSURANCE_TYPES,
};
use crate::services::ai::{Message, SYSTEM_PROMPT};
use crate::services::appointment;
use crate::services::classifier::{classify, INSURANCE_KEYWORDS, KEYWORD_TABLE};
use crate::services::sentiment;
use crate::services::templates::TEMPLATES;
use crate::state::AppState;
use crate::store::InteractionRow;

const DECLINE_MESSAGE: &str =
    "I apologize, but I can only assist with insurance-related queries. Could you rephrase your question?";
const SESSION_ENDED_MESSAGE: &str =
    "Our consultation has ended. Send a reset to start a new conversation.";
const TOKEN_LIMIT_MESSAGE: &str =
    "We've reached the length limit for this session. Please reset to start a new consultation.";
const APPOINTMENT_OFFER: &str =
    " It sounds like you might benefit from a personalized consultation. Would you like to schedule an appointment? (yes/no)";
const FAREWELL_FALLBACK: &str = "Thank you for your consultation. Have a great day!";
const SCHEDULING_INTRO_FALLBACK: &str = "Great! Let's schedule your insurance consultation.";

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:i am|i'm|this is|name is|call me)\s+([A-Za-z]+)").unwrap(),
        Regex::new(r"(?i)^([A-Za-z]+)\s+here").unwrap(),
        // Capitalized token required so "hello there" is not an introduction.
        Regex::new(r"^(?i:hi|hello|hey)[,.!]?\s+(?:(?i:this is)\s+)?([A-Z][a-z]+)").unwrap(),
    ]
});

/// What the synchronous rule pass decided for this turn.
#[derive(Debug, PartialEq)]
pub enum RuleOutcome {
    /// A canned response; the turn is complete.
    Reply(String),
    /// An appointment-collection prompt; the sub-flow is still pending user
    /// input, so the turn is not logged.
    FlowPrompt(String),
    /// The collection flow finished; persist the record then reply.
    AppointmentBooked(AppointmentRecord, String),
    /// No rule fired; hand the query to the language model.
    Delegate { needs_appointment: bool },
}

pub struct TurnOutput {
    pub response: String,
    pub intent: Intent,
    pub state: ConversationState,
    pub appointment_scheduled: bool,
}

pub fn extract_name(message: &str) -> Option<String> {
    for pattern in NAME_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(message) {
            if let Some(m) = caps.get(1) {
                return Some(capitalize(m.as_str()));
            }
        }
    }
    None
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

pub fn extract_insurance_type(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    INSURANCE_TYPES
        .iter()
        .find(|t| lower.contains(&t.to_lowercase()))
        .copied()
}

pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

fn suggests_need_for_appointment(intent: Intent, confidence: f32) -> bool {
    matches!(
        intent,
        Intent::AppointmentRequest | Intent::ProblemDescription
    ) || confidence > 50.0
}

fn is_query_relevant(message: &str, confidence: f32) -> bool {
    if confidence > 30.0 {
        return true;
    }
    let lower = message.to_lowercase();
    INSURANCE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// The synchronous per-turn decision table. Appends the query to history,
/// classifies it, applies the state-machine rules in order, and either
/// produces a response or asks for LLM delegation.
pub fn apply_rules<R: Rng + ?Sized>(
    ctx: &mut ConversationContext,
    message: &str,
    rng: &mut R,
) -> (Intent, f32, RuleOutcome) {
    ctx.add_to_history("user", message);

    let (intent, confidence) = classify(message, &KEYWORD_TABLE);

    // Farewell is terminal until reset.
    if ctx.current_state == ConversationState::Farewell {
        return (intent, confidence, RuleOutcome::Reply(SESSION_ENDED_MESSAGE.to_string()));
    }

    // A farewell intent ends the session from any state, even mid-flow.
    if intent == Intent::Farewell {
        ctx.update_state(ConversationState::Farewell);
        let line = TEMPLATES.render("farewell", &[], rng).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "farewell template unavailable");
            FAREWELL_FALLBACK.to_string()
        });
        return (intent, confidence, RuleOutcome::Reply(line));
    }

    // Appointment collection in progress: this message is field input.
    if ctx.current_state == ConversationState::SchedulingAppointment {
        if let Some(outcome) = advance_appointment_flow(ctx, message) {
            return (intent, confidence, outcome);
        }
        // No pending flow despite the state; fall through to the rules.
    }

    if intent == Intent::Greeting {
        if let Some(name) = extract_name(message) {
            ctx.set_user_name(&name);
            // A re-greeting later in the session updates the name only;
            // state transitions stay one-directional.
            if matches!(
                ctx.current_state,
                ConversationState::Greeting | ConversationState::CollectingName
            ) {
                ctx.update_state(ConversationState::UnderstandingNeed);
            }
            match TEMPLATES.render("name_greeting", &[("name", &name)], rng) {
                Ok(text) => return (intent, confidence, RuleOutcome::Reply(text)),
                Err(e) => {
                    tracing::warn!(error = %e, "name_greeting template failed");
                    return (intent, confidence, RuleOutcome::Delegate { needs_appointment: false });
                }
            }
        }
        match TEMPLATES.render("greeting", &[], rng) {
            Ok(text) => return (intent, confidence, RuleOutcome::Reply(text)),
            Err(e) => {
                tracing::warn!(error = %e, "greeting template failed");
                return (intent, confidence, RuleOutcome::Delegate { needs_appointment: false });
            }
        }
    }

    // Introductions outside a greeting ("my name is X ...").
    if ctx.user_name.is_none() {
        if let Some(name) = extract_name(message) {
            ctx.set_user_name(&name);
            ctx.update_state(ConversationState::UnderstandingNeed);
            match TEMPLATES.render("name_greeting", &[("name", &name)], rng) {
                Ok(text) => return (intent, confidence, RuleOutcome::Reply(text)),
                Err(e) => {
                    tracing::warn!(error = %e, "name_greeting template failed");
                    return (intent, confidence, RuleOutcome::Delegate { needs_appointment: false });
                }
            }
        }
    }

    if ctx.current_state == ConversationState::UnderstandingNeed {
        if let Some(insurance_type) = extract_insurance_type(message) {
            ctx.set_insurance_type(insurance_type);
            ctx.update_state(ConversationState::InsuranceDiscussion);
            match TEMPLATES.render("insurance_inquiry", &[("insurance_type", insurance_type)], rng)
            {
                Ok(text) => return (intent, confidence, RuleOutcome::Reply(text)),
                Err(e) => {
                    tracing::warn!(error = %e, "insurance_inquiry template failed");
                    return (intent, confidence, RuleOutcome::Delegate { needs_appointment: false });
                }
            }
        }
    }

    // Accepted scheduling: either an explicit yes during discussion, or a
    // yes answering an earlier appointment offer.
    let accepts = message.to_lowercase().contains("yes");
    if accepts
        && !ctx.appointment_scheduled
        && (ctx.current_state == ConversationState::InsuranceDiscussion
            || ctx.appointment_suggested)
    {
        ctx.appointment_suggested = false;
        ctx.update_state(ConversationState::SchedulingAppointment);
        let pending = appointment::start_flow(ctx);

        let intro = match (ctx.user_name.as_deref(), ctx.insurance_type.as_deref()) {
            (Some(name), Some(insurance_type)) => TEMPLATES
                .render(
                    "appointment_suggestion",
                    &[("name", name), ("insurance_type", insurance_type)],
                    rng,
                )
                .unwrap_or_else(|_| SCHEDULING_INTRO_FALLBACK.to_string()),
            _ => SCHEDULING_INTRO_FALLBACK.to_string(),
        };

        let prompt = appointment::next_field(&pending)
            .map(appointment::prompt_for)
            .unwrap_or_default();
        ctx.pending_appointment = Some(pending);
        return (
            intent,
            confidence,
            RuleOutcome::FlowPrompt(format!("{intro}\n{prompt}")),
        );
    }

    if intent == Intent::ClaimRelated {
        if let Ok(text) = TEMPLATES.render("claim_related", &[], rng) {
            return (intent, confidence, RuleOutcome::Reply(text));
        }
    }

    if !is_query_relevant(message, confidence) {
        return (intent, confidence, RuleOutcome::Reply(DECLINE_MESSAGE.to_string()));
    }

    let needs_appointment = suggests_need_for_appointment(intent, confidence);
    (intent, confidence, RuleOutcome::Delegate { needs_appointment })
}

/// Feed one message into the pending collection flow. Returns `None` when no
/// flow is actually pending.
fn advance_appointment_flow(ctx: &mut ConversationContext, message: &str) -> Option<RuleOutcome> {
    let mut pending = ctx.pending_appointment.take()?;

    let Some(field) = appointment::next_field(&pending) else {
        // Nothing left to collect; treat as already complete.
        ctx.pending_appointment = Some(pending);
        return None;
    };

    if let Err(reason) = appointment::apply_input(&mut pending, field, message) {
        let prompt = appointment::prompt_for(field);
        ctx.pending_appointment = Some(pending);
        return Some(RuleOutcome::FlowPrompt(format!("{reason}\n{prompt}")));
    }

    if let Some(next) = appointment::next_field(&pending) {
        let prompt = appointment::prompt_for(next);
        ctx.pending_appointment = Some(pending);
        return Some(RuleOutcome::FlowPrompt(prompt));
    }

    let record = appointment::into_record(&pending)?;

    ctx.set_user_name(&record.name);
    ctx.set_insurance_type(&record.insurance_type);
    ctx.update_collected_info([
        ("email".to_string(), record.email.clone()),
        ("mobile".to_string(), record.mobile.clone()),
        ("preferred_date".to_string(), record.preferred_date.clone()),
        ("preferred_time".to_string(), record.preferred_time.clone()),
    ]);
    ctx.appointment_scheduled = true;
    ctx.pending_appointment = None;
    // After booking, control returns to general discussion.
    ctx.update_state(ConversationState::InsuranceDiscussion);

    let confirmation = format!(
        "Perfect! I've scheduled your {} consultation with Wing Heights Ghana for {} at {}. \
         Is there anything else you'd like to know about our insurance services?",
        record.insurance_type, record.preferred_date, record.preferred_time,
    );
    Some(RuleOutcome::AppointmentBooked(record, confirmation))
}

/// Run one full turn for a session: rules first, LLM delegation when no rule
/// fires, then logging and context write-back.
pub async fn process_message(
    state: &AppState,
    session_id: &str,
    message: &str,
) -> anyhow::Result<TurnOutput> {
    let mut session = {
        let mut sessions = state.sessions.lock().unwrap();
        sessions.entry(session_id.to_string()).or_default().clone()
    };

    if session.tokens_used > state.config.max_session_tokens {
        return Ok(TurnOutput {
            response: TOKEN_LIMIT_MESSAGE.to_string(),
            intent: Intent::General,
            state: session.context.current_state,
            appointment_scheduled: session.context.appointment_scheduled,
        });
    }

    let (intent, confidence, outcome) = {
        let mut rng = state.rng.lock().unwrap();
        apply_rules(&mut session.context, message, &mut *rng)
    };

    tracing::info!(
        session = session_id,
        intent = intent.as_str(),
        confidence,
        state = session.context.current_state.as_str(),
        "processing message"
    );

    let (response, log_interaction) = match outcome {
        RuleOutcome::Reply(text) => (text, true),
        RuleOutcome::FlowPrompt(text) => (text, false),
        RuleOutcome::AppointmentBooked(record, text) => {
            if let Err(e) = state.store.append_appointment(&record) {
                tracing::error!(error = %e, "failed to persist appointment");
            }
            (text, true)
        }
        RuleOutcome::Delegate { needs_appointment } => {
            let text =
                delegate_to_llm(state, &session.context, message, needs_appointment).await;
            if needs_appointment && !session.context.appointment_scheduled {
                session.context.appointment_suggested = true;
            }
            (text, true)
        }
    };

    session.context.add_to_history("assistant", &response);
    session.tokens_used += count_tokens(message) + count_tokens(&response);

    if log_interaction {
        let (label, score) = sentiment::analyze(message);
        session.sentiments.push(label);

        let row = InteractionRow {
            timestamp: Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
            name: session.context.user_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            insurance_type: session
                .context
                .insurance_type
                .clone()
                .unwrap_or_else(|| "Not Specified".to_string()),
            query: message.to_string(),
            response: response.clone(),
            conversation_state: session.context.current_state.as_str().to_string(),
            intent: intent.as_str().to_string(),
            query_tokens: count_tokens(message),
            response_tokens: count_tokens(&response),
            sentiment_label: label.as_str().to_string(),
            sentiment_score: score,
        };
        if let Err(e) = state.store.append_interaction(&row) {
            tracing::error!(error = %e, "failed to log interaction");
        }
    }

    let output = TurnOutput {
        response,
        intent,
        state: session.context.current_state,
        appointment_scheduled: session.context.appointment_scheduled,
    };

    {
        let mut sessions = state.sessions.lock().unwrap();
        sessions.insert(session_id.to_string(), session);
    }

    Ok(output)
}

/// Ask the language model, tagging the query with what the conversation has
/// established. Provider failures become a canned apology, never an error.
async fn delegate_to_llm(
    state: &AppState,
    ctx: &ConversationContext,
    message: &str,
    needs_appointment: bool,
) -> String {
    let mut tagged = message.to_string();
    if let Some(name) = &ctx.user_name {
        tagged = format!("[User: {name}] {tagged}");
    }
    if let Some(insurance_type) = &ctx.insurance_type {
        tagged = format!("[Insurance: {insurance_type}] {tagged}");
    }

    // History already holds the raw query as its last turn; send the tagged
    // version in its place.
    let mut messages: Vec<Message> = ctx
        .history
        .iter()
        .take(ctx.history.len().saturating_sub(1))
        .map(|turn| Message {
            role: turn.role.clone(),
            content: turn.content.clone(),
        })
        .collect();
    messages.push(Message {
        role: "user".to_string(),
        content: tagged,
    });

    match state.llm.chat(SYSTEM_PROMPT, &messages).await {
        Ok(mut answer) => {
            if needs_appointment && !ctx.appointment_scheduled {
                answer.push_str(APPOINTMENT_OFFER);
            }
            answer
        }
        Err(e) => {
            tracing::error!(error = %e, "LLM provider unavailable");
            format!("I apologize, but I encountered an error: {e}")
        }
    }
}
