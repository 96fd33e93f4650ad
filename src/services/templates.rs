use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use rand::Rng;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TemplateError {
    #[error("no templates registered under key `{0}`")]
    MissingKey(String),

    #[error("template references `{{{0}}}` but no value was provided")]
    MissingPlaceholder(String),
}

/// Read-only table of response template families. Each key maps to a list
/// of equivalent phrasings; `render` picks one at random.
pub struct ResponseTemplates {
    table: Vec<(&'static str, Vec<&'static str>)>,
}

impl ResponseTemplates {
    /// Pick a template under `key` using the injected RNG and fill its
    /// `{placeholder}` slots from `vars`. A placeholder with no matching
    /// var is an error, never silently left in the output.
    pub fn render<R: Rng + ?Sized>(
        &self,
        key: &str,
        vars: &[(&str, &str)],
        rng: &mut R,
    ) -> Result<String, TemplateError> {
        let templates = self
            .table
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| TemplateError::MissingKey(key.to_string()))?;

        let template = templates
            .choose(rng)
            .ok_or_else(|| TemplateError::MissingKey(key.to_string()))?;

        substitute(template, vars)
    }
}

fn substitute(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push('{');
            rest = after;
            continue;
        };
        let key = &after[..end];
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| TemplateError::MissingPlaceholder(key.to_string()))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

pub static TEMPLATES: Lazy<ResponseTemplates> = Lazy::new(|| ResponseTemplates {
    table: vec![
        (
            "greeting",
            vec![
                "Hello! I'm ADA from Wing Heights Ghana. Let's schedule an insurance consultation for you. What type of insurance are you interested in?",
                "Hi! I'm ADA, your insurance assistant at Wing Heights Ghana. I can help you book a consultation. Which insurance type interests you?",
                "Welcome to Wing Heights Ghana! I'm ADA and I'll help schedule your insurance consultation. What insurance type would you like to discuss?",
            ],
        ),
        (
            "name_greeting",
            vec![
                "Hello {name}! Let's schedule your insurance consultation. Which type of insurance interests you?",
                "Hi {name}! I'll help you book an insurance consultation. What type of insurance would you like to discuss?",
                "Great to meet you {name}! Let's set up your insurance consultation. Which insurance type are you considering?",
            ],
        ),
        (
            "insurance_inquiry",
            vec![
                "Perfect, I can help you with {insurance_type}. Let's schedule a consultation to discuss the details. When would you like to meet?",
                "Great choice! For {insurance_type}, it's best to discuss options in person. Let me help you book a consultation.",
                "I understand you're interested in {insurance_type}. The best way forward is to schedule a consultation. When works for you?",
            ],
        ),
        (
            "appointment_suggestion",
            vec![
                "Great, {name}! Let's schedule your {insurance_type} consultation.",
                "Perfect timing {name}! I'll help you book a consultation for {insurance_type}.",
                "Excellent choice {name}! Let's set up your {insurance_type} consultation.",
            ],
        ),
        (
            "claim_related",
            vec![
                "Claims can be intricate. I'll guide you through the process step by step. Would you like to discuss your claim in more detail?",
                "Filing a claim requires careful attention. Let's go through the details together. Would you like to discuss your claim in more detail?",
                "I'm here to support you through the claim process. Would you like to discuss your claim in more detail?",
            ],
        ),
        (
            "farewell",
            vec![
                "Goodbye! Thank you for choosing Wing Heights Ghana for your insurance needs.",
                "Have a great day! Feel free to return if you have more questions about our insurance services.",
                "Take care! Don't hesitate to reach out if you need anything else regarding our insurance offerings.",
            ],
        ),
    ],
});
