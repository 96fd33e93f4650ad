use once_cell::sync::Lazy;

use crate::models::Intent;

/// Ordered intent → keyword mapping. Order matters: when two intents score
/// the same confidence, the one listed first wins.
pub struct IntentKeywordTable {
    entries: Vec<(Intent, Vec<&'static str>)>,
}

impl IntentKeywordTable {
    pub fn entries(&self) -> &[(Intent, Vec<&'static str>)] {
        &self.entries
    }
}

/// Process-wide keyword configuration, built once and never mutated.
pub static KEYWORD_TABLE: Lazy<IntentKeywordTable> = Lazy::new(|| IntentKeywordTable {
    entries: vec![
        (
            Intent::Greeting,
            vec![
                "hello",
                "hi",
                "hey",
                "greetings",
                "good morning",
                "good afternoon",
                "good evening",
                "howdy",
            ],
        ),
        (
            Intent::Farewell,
            vec!["bye", "goodbye", "see you", "talk to you later", "exit", "quit"],
        ),
        (
            Intent::InsuranceInquiry,
            vec![
                "what",
                "how",
                "explain",
                "tell me about",
                "information",
                "details",
                "learn",
                "understand",
                "looking for insurance",
                "need insurance",
                "want insurance",
            ],
        ),
        (
            Intent::AppointmentRequest,
            vec![
                "schedule",
                "book",
                "consultation",
                "meeting",
                "appointment",
                "want to meet",
                "discuss",
            ],
        ),
        (
            Intent::ProblemDescription,
            vec![
                "issue",
                "problem",
                "concern",
                "difficulty",
                "challenge",
                "help",
                "need assistance",
            ],
        ),
        (
            Intent::ClaimRelated,
            vec![
                "claim",
                "compensation",
                "insurance claim",
                "filing claim",
                "submit claim",
            ],
        ),
    ],
});

/// Keywords that mark a query as insurance-relevant even when no intent
/// scores above the confidence threshold.
pub static INSURANCE_KEYWORDS: &[&str] = &[
    "insurance",
    "policy",
    "claim",
    "premium",
    "coverage",
    "deductible",
    "benefit",
    "protection",
    "risk",
    "medical",
    "health",
    "life",
    "auto",
    "home",
    "appointment",
    "schedule",
    "wing heights",
    "ghana",
];

/// Classify a query by keyword overlap. Always returns a value: queries with
/// no keyword hits come back as `(General, 0.0)`.
///
/// Matching is unanchored case-insensitive substring search, so "hi" matches
/// inside "history". That imprecision is inherited, documented behavior.
pub fn classify(query: &str, table: &IntentKeywordTable) -> (Intent, f32) {
    let query_lower = query.to_lowercase();

    let mut best: Option<(Intent, f32)> = None;
    for (intent, keywords) in table.entries() {
        let matches = keywords
            .iter()
            .filter(|kw| query_lower.contains(*kw))
            .count();
        if matches == 0 {
            continue;
        }
        let confidence = (matches as f32 / keywords.len() as f32) * 100.0;
        // Strictly-greater keeps the first intent on ties.
        match best {
            Some((_, top)) if confidence <= top => {}
            _ => best = Some((*intent, confidence)),
        }
    }

    best.unwrap_or((Intent::General, 0.0))
}
