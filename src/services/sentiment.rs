use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

static POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "happy", "thanks", "thank", "helpful", "perfect", "love",
    "wonderful", "awesome", "appreciate", "glad", "nice", "best", "fantastic",
];

static NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "unhappy", "angry", "worst", "hate", "disappointed",
    "frustrating", "frustrated", "horrible", "poor", "annoyed", "useless", "complaint",
];

/// Lexicon polarity score in [-1, 1] with a label at the ±0.05 thresholds.
pub fn analyze(text: &str) -> (SentimentLabel, f32) {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return (SentimentLabel::Neutral, 0.0);
    }

    let positive = tokens
        .iter()
        .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
        .count() as f32;
    let negative = tokens
        .iter()
        .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
        .count() as f32;

    let polarity = ((positive - negative) / tokens.len() as f32).clamp(-1.0, 1.0);

    let label = if polarity > 0.05 {
        SentimentLabel::Positive
    } else if polarity < -0.05 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    (label, polarity)
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentShare {
    pub positive: f32,
    pub neutral: f32,
    pub negative: f32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentStats {
    pub counts: SentimentBreakdown,
    pub percentages: SentimentShare,
}

/// Aggregate per-turn labels. An empty session reports zero percentages.
pub fn stats(labels: &[SentimentLabel]) -> SentimentStats {
    let counts = SentimentBreakdown {
        positive: labels.iter().filter(|l| **l == SentimentLabel::Positive).count(),
        neutral: labels.iter().filter(|l| **l == SentimentLabel::Neutral).count(),
        negative: labels.iter().filter(|l| **l == SentimentLabel::Negative).count(),
    };

    let total = labels.len() as f32;
    let percentages = if labels.is_empty() {
        SentimentShare::default()
    } else {
        SentimentShare {
            positive: counts.positive as f32 / total * 100.0,
            neutral: counts.neutral as f32 / total * 100.0,
            negative: counts.negative as f32 / total * 100.0,
        }
    };

    SentimentStats { counts, percentages }
}
