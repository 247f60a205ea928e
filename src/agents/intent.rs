//! Keyword-based intent analysis
//!
//! Classifies a query into zero or more [`Topic`]s using a fixed vocabulary.
//! No model call is involved, so routing stays cheap and deterministic.

use crate::agents::Topic;
use crate::types::{IntentResult, Query};
use std::collections::HashMap;

/// Label used when no topic matched
pub const GENERAL_INTENT: &str = "general";

fn default_keywords(topic: Topic) -> &'static [&'static str] {
    match topic {
        Topic::Training => &[
            "workout", "training", "train", "exercise", "strength", "squat", "deadlift",
            "bench press", "cardio", "hiit", "running", "lifting", "muscle",
            "hypertrophy", "reps", "routine", "endurance", "gym",
        ],
        Topic::Nutrition => &[
            "nutrition", "diet", "meal", "meal plan", "food", "eat", "eating", "protein",
            "carb", "calorie", "macro", "fasting", "recipe", "hydration",
            "breakfast", "lunch", "dinner", "snack",
        ],
        Topic::Recovery => &[
            "recovery", "recover", "sleep", "rest", "hrv", "heart rate variability",
            "soreness", "sore", "mobility", "stretching", "readiness", "deload", "nap",
        ],
        Topic::Motivation => &[
            "motivation", "motivated", "habit", "discipline", "consistency",
            "procrastinate", "mindset", "accountability", "confidence", "give up",
        ],
        Topic::Progress => &[
            "progress", "tracking", "metrics", "goal", "milestone", "trend", "weight loss",
            "body fat", "analytics",
        ],
        Topic::Biohacking => &[
            "biohacking", "supplement", "nootropic", "longevity",
            "cold plunge", "sauna", "creatine", "magnesium", "circadian", "red light",
        ],
        Topic::FemaleHealth => &[
            "menstrual", "period", "cycle", "luteal", "follicular", "pregnancy",
            "postpartum", "menopause", "perimenopause", "pcos", "estrogen",
        ],
        Topic::Genetics => &[
            "genetic", "genetics", "gene", "dna", "genome", "snp", "mthfr",
            "apoe", "ancestry", "heritable",
        ],
        Topic::Integrations => &[
            "wearable", "whoop", "oura", "garmin", "apple watch", "fitbit", "strava",
            "sync", "integration", "integrate", "api", "device",
        ],
        Topic::Security => &[
            "privacy", "security", "secure", "gdpr", "hipaa", "consent", "delete my data",
            "data sharing", "encryption", "breach", "compliance",
        ],
    }
}

/// Lowercase, strip punctuation, collapse whitespace and pad with single spaces
pub(crate) fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(" {} ", joined)
}

/// Whether `phrase` occurs in the normalized text on word boundaries.
/// A trailing plural "s"/"es" on the last word is tolerated.
pub(crate) fn contains_phrase(normalized_text: &str, phrase: &str) -> bool {
    let phrase = normalize(phrase);
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return false;
    }
    [" ", "s ", "es "]
        .iter()
        .any(|suffix| normalized_text.contains(&format!(" {}{}", phrase, suffix)))
}

fn word_matches(token: &str, word: &str, last: bool) -> bool {
    token == word
        || (last
            && [token.strip_suffix('s'), token.strip_suffix("es")]
                .contains(&Some(word)))
}

/// Token spans `[start, end)` where `phrase` occurs, with the same plural
/// tolerance as [`contains_phrase`]
fn phrase_spans(tokens: &[&str], phrase: &str) -> Vec<(usize, usize)> {
    let phrase = normalize(phrase);
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() || words.len() > tokens.len() {
        return Vec::new();
    }
    (0..=tokens.len() - words.len())
        .filter(|&start| {
            words
                .iter()
                .enumerate()
                .all(|(i, w)| word_matches(tokens[start + i], w, i + 1 == words.len()))
        })
        .map(|start| (start, start + words.len()))
        .collect()
}

/// Number of spans not contained in another span, so "meal plan" is one
/// hit even though "meal" matches inside it
fn distinct_spans(mut spans: Vec<(usize, usize)>) -> usize {
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let mut covered_until = 0;
    let mut count = 0;
    for (_, end) in spans {
        if end > covered_until {
            count += 1;
            covered_until = end;
        }
    }
    count
}

/// Classifies queries into topics with a confidence score
#[derive(Debug, Clone)]
pub struct IntentAnalyzer {
    vocabulary: Vec<(Topic, Vec<String>)>,
}

impl Default for IntentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentAnalyzer {
    /// Create an analyzer with the built-in vocabulary
    pub fn new() -> Self {
        let vocabulary = Topic::ALL
            .iter()
            .map(|topic| {
                let words = default_keywords(*topic)
                    .iter()
                    .map(|w| w.to_string())
                    .collect();
                (*topic, words)
            })
            .collect();
        Self { vocabulary }
    }

    /// Create an analyzer with extra keywords merged into the built-in vocabulary
    pub fn with_extra_keywords(extra: &HashMap<Topic, Vec<String>>) -> Self {
        let mut analyzer = Self::new();
        for (topic, words) in analyzer.vocabulary.iter_mut() {
            if let Some(more) = extra.get(topic) {
                for word in more {
                    let word = word.trim().to_lowercase();
                    if !word.is_empty() && !words.contains(&word) {
                        words.push(word);
                    }
                }
            }
        }
        analyzer
    }

    /// Topics with at least one keyword hit, paired with their hit counts.
    /// Each stretch of text counts once per topic, whichever keywords cover it.
    /// Ordered by hits (descending), ties in canonical topic order.
    pub fn topic_hits(&self, text: &str) -> Vec<(Topic, usize)> {
        let normalized = normalize(text);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        let mut hits: Vec<(Topic, usize)> = self
            .vocabulary
            .iter()
            .filter_map(|(topic, words)| {
                let spans = words
                    .iter()
                    .flat_map(|w| phrase_spans(&tokens, w))
                    .collect();
                let count = distinct_spans(spans);
                (count > 0).then_some((*topic, count))
            })
            .collect();

        // Stable sort keeps canonical order for ties
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        hits
    }

    /// Analyze a query's intent
    pub fn analyze(&self, query: &Query) -> IntentResult {
        let hits = self.topic_hits(&query.text);

        let Some(&(top_topic, top_hits)) = hits.first() else {
            return IntentResult {
                intent_label: GENERAL_INTENT.to_string(),
                confidence: 0.0,
                matched_topics: vec![],
            };
        };

        let total_hits: usize = hits.iter().map(|(_, n)| n).sum();
        let dominance = top_hits as f32 / total_hits as f32;
        let saturation = (0.5 + 0.25 * top_hits as f32).min(1.0);
        let confidence = (dominance * saturation).clamp(0.0, 1.0);

        tracing::debug!(
            intent = %top_topic,
            confidence,
            topics = hits.len(),
            "Intent analyzed"
        );

        IntentResult {
            intent_label: top_topic.as_str().to_string(),
            confidence,
            matched_topics: hits.into_iter().map(|(t, _)| t).collect(),
        }
    }
}
