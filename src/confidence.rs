//! Composite confidence for a candidate call set.
//!
//! `schema * valid_ratio + coverage * min(1, calls / intents) + precision * hint`
//!
//! Interpretable by construction: each term answers one question (are the
//! calls well-formed, did we cover every intent, did we over-generate).

use crate::config::ScoringWeights;
use crate::types::{ToolCall, ToolSpec};
use crate::validate::validate_call;

/// Literal substring cues per tool family: `(tool-name substring, cues)`.
/// A family counts as an intent when the catalog has a matching tool and the
/// lowercased utterance contains any cue.
pub const INTENT_CUES: &[(&str, &[&str])] = &[
    ("weather", &["weather"]),
    ("alarm", &["alarm", "wake me up"]),
    ("timer", &["timer"]),
    ("music", &["play ", "music"]),
    ("contact", &["contacts", "look up", "find "]),
    ("remind", &["remind me"]),
    ("message", &["send", "text ", "message"]),
];

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    weights: ScoringWeights,
    cues: &'static [(&'static str, &'static [&'static str])],
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

impl ConfidenceScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights,
            cues: INTENT_CUES,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Heuristic number of distinct intents in `utterance`, at least 1.
    pub fn intent_count(&self, utterance: &str, tools: &[ToolSpec]) -> usize {
        let lower = utterance.to_lowercase();
        let names: Vec<String> = tools.iter().map(|t| t.name.to_lowercase()).collect();

        let count = self
            .cues
            .iter()
            .filter(|(family, cues)| {
                names.iter().any(|n| n.contains(family)) && cues.iter().any(|c| lower.contains(c))
            })
            .count();
        count.max(1)
    }

    /// Score in `[0, 1]`; exactly `0.0` iff `calls` is empty.
    pub fn score(&self, utterance: &str, tools: &[ToolSpec], calls: &[ToolCall]) -> f64 {
        if calls.is_empty() {
            return 0.0;
        }

        let n = calls.len();
        let valid = calls.iter().filter(|c| validate_call(c, tools)).count();
        let schema_ratio = valid as f64 / n as f64;

        let intents = self.intent_count(utterance, tools);
        let coverage = (n as f64 / intents as f64).min(1.0);
        let precision_hint = if n <= intents + self.weights.over_generation_margin {
            1.0
        } else {
            self.weights.over_generation_penalty
        };

        let w = &self.weights;
        let raw = w.schema * schema_ratio + w.coverage * coverage + w.precision * precision_hint;

        // Positive floor keeps "non-empty ⇒ non-zero" even with zeroed weights.
        raw.clamp(f64::MIN_POSITIVE, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_tools;

    fn weather(loc: &str) -> ToolCall {
        ToolCall::new("get_weather").with_arg("location", loc)
    }

    #[test]
    fn empty_calls_score_zero() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.score("weather in Paris", &builtin_tools(), &[]), 0.0);
    }

    #[test]
    fn single_valid_call_scores_one() {
        let scorer = ConfidenceScorer::default();
        let c = scorer.score(
            "What is the weather in San Francisco?",
            &builtin_tools(),
            &[weather("San Francisco")],
        );
        assert!((c - 1.0).abs() < 1e-9);
    }

    #[test]
    fn intent_count_uses_catalog_and_cues() {
        let scorer = ConfidenceScorer::default();
        let tools = builtin_tools();
        assert_eq!(scorer.intent_count("Find Tom and send him a message", &tools), 2);
        assert_eq!(scorer.intent_count("tell me a joke", &tools), 1);
        assert_eq!(
            scorer.intent_count("Set a timer and play music, and check the weather", &tools),
            3
        );

        // Cues for families the catalog lacks do not count.
        let only_weather: Vec<ToolSpec> =
            tools.into_iter().filter(|t| t.name == "get_weather").collect();
        assert_eq!(scorer.intent_count("weather and a timer", &only_weather), 1);
    }

    #[test]
    fn partial_coverage_lowers_score() {
        let scorer = ConfidenceScorer::default();
        let c = scorer.score(
            "What's the weather, and set a timer",
            &builtin_tools(),
            &[weather("Paris")],
        );
        // 0.5 * 1 + 0.35 * 0.5 + 0.15 * 1
        assert!((c - 0.825).abs() < 1e-9);
    }

    #[test]
    fn invalid_calls_lower_schema_ratio() {
        let scorer = ConfidenceScorer::default();
        let c = scorer.score(
            "weather",
            &builtin_tools(),
            &[weather("Oslo"), ToolCall::new("get_weather")],
        );
        // 0.5 * 0.5 + 0.35 * 1 + 0.15 * 1
        assert!((c - 0.75).abs() < 1e-9);

        let c = scorer.score("weather", &builtin_tools(), &[ToolCall::new("get_weather")]);
        assert!((c - 0.5).abs() < 1e-9);
    }

    #[test]
    fn over_generation_is_penalized() {
        let scorer = ConfidenceScorer::default();
        let calls = vec![weather("A"), weather("B"), weather("C")];
        let c = scorer.score("weather", &builtin_tools(), &calls);
        // 3 calls > 1 intent + 1 margin: 0.5 + 0.35 + 0.15 * 0.7
        assert!((c - 0.955).abs() < 1e-9);

        let c = scorer.score("weather", &builtin_tools(), &calls[..2]);
        assert!((c - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_stays_in_bounds() {
        let heavy = ConfidenceScorer::new(ScoringWeights {
            schema: 1.0,
            coverage: 1.0,
            precision: 1.0,
            ..ScoringWeights::default()
        });
        let c = heavy.score("weather", &builtin_tools(), &[weather("Rome")]);
        assert_eq!(c, 1.0);

        let zero = ConfidenceScorer::new(ScoringWeights {
            schema: 0.0,
            coverage: 0.0,
            precision: 0.0,
            ..ScoringWeights::default()
        });
        let c = zero.score("weather", &builtin_tools(), &[weather("Rome")]);
        assert!(c > 0.0 && c <= 1.0);
    }
}
