use std::collections::HashMap;
use std::sync::Mutex;

use rand::rngs::StdRng;

use crate::config::AppConfig;
use crate::models::ConversationContext;
use crate::services::ai::LlmProvider;
use crate::services::sentiment::SentimentLabel;
use crate::store::CsvStore;

/// Per-session bundle: the conversation context plus bookkeeping the
/// orchestrator maintains around it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub context: ConversationContext,
    pub sentiments: Vec<SentimentLabel>,
    pub tokens_used: usize,
}

pub struct AppState {
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub store: CsvStore,
    /// Sessions keyed by id. Turn processing snapshots a session, runs, and
    /// writes back; callers must serialize requests per session.
    pub sessions: Mutex<HashMap<String, Session>>,
    /// Injected so tests can pin template selection with a fixed seed.
    pub rng: Mutex<StdRng>,
}
