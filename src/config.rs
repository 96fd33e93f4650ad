use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub llm_provider: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub interactions_path: String,
    pub appointments_path: String,
    pub max_response_tokens: u32,
    pub max_session_tokens: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5005),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "groq".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.2-3b-preview".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            interactions_path: env::var("CHATBOT_DATA_PATH")
                .unwrap_or_else(|_| "chatbot_data.csv".to_string()),
            appointments_path: env::var("APPOINTMENTS_CSV_PATH")
                .unwrap_or_else(|_| "appointments.csv".to_string()),
            max_response_tokens: env::var("MAX_RESPONSE_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            max_session_tokens: env::var("MAX_SESSION_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
        }
    }
}
