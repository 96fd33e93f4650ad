use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::services::sentiment::{self, SentimentStats};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SentimentQuery {
    pub session_id: Option<String>,
}

/// Aggregate sentiment of the turns observed so far in a session. Unknown
/// or missing session ids report empty stats rather than an error.
pub async fn sentiment_analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SentimentQuery>,
) -> Json<SentimentStats> {
    let sessions = state.sessions.lock().unwrap();
    let labels = query
        .session_id
        .as_deref()
        .and_then(|id| sessions.get(id))
        .map(|session| session.sentiments.as_slice())
        .unwrap_or(&[]);

    Json(sentiment::stats(labels))
}
