//! Query complexity scoring
//!
//! Scores a query from the number of distinct topics it touches plus any
//! "hard" indicator phrases (fatigue, plateau, ...) that usually need more
//! than one specialist.

use crate::agents::intent::{IntentAnalyzer, contains_phrase, normalize};
use crate::coordination::ComplexityLevel;
use crate::types::{ComplexityAssessment, Query};

const HARD_INDICATORS: &[&str] = &[
    "fatigue",
    "fatigued",
    "exhausted",
    "plateau",
    "stuck",
    "stalled",
    "injury",
    "injured",
    "pain",
    "overtraining",
    "burnout",
    "burned out",
    "insomnia",
    "hormonal",
    "not losing",
    "no progress",
    "chronic",
];

const INTEGRAL_PHRASES: &[&str] = &[
    "holistic",
    "complete transformation",
    "total transformation",
    "overhaul",
    "all aspects",
    "everything",
    "whole life",
    "comprehensive plan",
];

/// Scores queries as SIMPLE / MODERATE / COMPLEX / INTEGRAL
#[derive(Debug, Clone, Default)]
pub struct ComplexityClassifier {
    analyzer: IntentAnalyzer,
}

impl ComplexityClassifier {
    pub fn new(analyzer: IntentAnalyzer) -> Self {
        Self { analyzer }
    }

    fn level_for_score(score: usize) -> ComplexityLevel {
        match score {
            0 | 1 => ComplexityLevel::Simple,
            2 => ComplexityLevel::Moderate,
            3 | 4 => ComplexityLevel::Complex,
            _ => ComplexityLevel::Integral,
        }
    }

    /// Classify a query
    pub fn classify(&self, query: &Query) -> ComplexityAssessment {
        let matched_topics: Vec<_> = self
            .analyzer
            .topic_hits(&query.text)
            .into_iter()
            .map(|(topic, _)| topic)
            .collect();

        let normalized = normalize(&query.text);
        let indicators: Vec<String> = HARD_INDICATORS
            .iter()
            .filter(|phrase| contains_phrase(&normalized, phrase))
            .map(|phrase| phrase.to_string())
            .collect();
        let integral_request = INTEGRAL_PHRASES
            .iter()
            .any(|phrase| contains_phrase(&normalized, phrase));

        let score = matched_topics.len() + indicators.len();

        let level = if matched_topics.is_empty() {
            ComplexityLevel::Simple
        } else {
            let base = Self::level_for_score(score);
            if integral_request { base.raised() } else { base }
        };

        tracing::debug!(
            ?level,
            score,
            topics = matched_topics.len(),
            indicators = indicators.len(),
            "Complexity classified"
        );

        ComplexityAssessment {
            level,
            score,
            matched_topics,
            indicators,
            integral_request,
        }
    }
}
