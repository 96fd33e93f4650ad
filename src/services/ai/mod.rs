pub mod groq;
pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Consultation persona handed to whichever provider is configured.
pub const SYSTEM_PROMPT: &str = "\
1. You are ADA, Wing Heights Ghana's professional insurance consultation AI assistant.
2. Properly reply to greetings and farewells.
3. If the user introduces themselves, greet them by name and ask how you can assist them with their insurance needs.
4. Be interactive and conversational.
5. List the insurance types available and ask the user which one they are interested in.
6. Only answer questions about insurance, appointment booking, or Wing Heights Ghana services.
7. For any other topics, don't give any answer and politely decline to answer.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// The hosted language model the orchestrator falls back to for open-ended
/// insurance questions. Any failure is surfaced as an error the caller
/// turns into a canned apology, never a crash.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;
}
