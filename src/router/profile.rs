//! Tool keyword profiles.
//!
//! A profile is the bag of words a clause has to overlap with for the tool to
//! be picked. Names and descriptions alone miss paraphrases ("forecast" vs a
//! tool literally named `get_weather`), so a static expansion table adds
//! concept vocabulary keyed by substring on the tool name.

use std::collections::HashSet;

use super::clause::{tokenize, tokenize_identifier};
use crate::types::ToolSpec;

/// Concept expansion: `(tool-name substring, extra keywords)`.
///
/// Every entry whose key occurs in the lowercased tool name contributes.
/// Adding a tool family means adding a row here, nothing else.
pub const SEMANTIC_EXPANSIONS: &[(&str, &[&str])] = &[
    ("weather", &["weather", "forecast", "temperature", "city", "location"]),
    ("alarm", &["alarm", "wake", "morning", "am", "pm", "clock"]),
    ("timer", &["timer", "countdown", "minute", "minutes", "seconds"]),
    ("music", &["music", "play", "song", "songs", "playlist", "listen"]),
    ("message", &["message", "text", "send", "sms", "saying"]),
    ("contact", &["contact", "contacts", "find", "look", "lookup", "search"]),
    ("remind", &["reminder", "remind", "remember"]),
];

/// Keyword fingerprint of one tool.
#[derive(Debug, Clone)]
pub struct ToolProfile<'a> {
    pub tool: &'a ToolSpec,
    pub keywords: HashSet<String>,
}

impl<'a> ToolProfile<'a> {
    pub fn build(tool: &'a ToolSpec) -> Self {
        Self::build_with(tool, SEMANTIC_EXPANSIONS)
    }

    pub fn build_with(tool: &'a ToolSpec, expansions: &[(&str, &[&str])]) -> Self {
        let mut keywords = tokenize_identifier(&tool.name);
        keywords.extend(tokenize(&tool.description));

        for (param, spec) in &tool.parameters.properties {
            keywords.extend(tokenize_identifier(param));
            keywords.extend(tokenize(&spec.description));
        }

        let lower_name = tool.name.to_lowercase();
        for (concept, extra) in expansions {
            if lower_name.contains(concept) {
                keywords.extend(extra.iter().map(|k| (*k).to_string()));
            }
        }

        Self { tool, keywords }
    }

    /// `|C ∩ K| / max(1, |K|) + |C ∩ K|`: overlap ratio plus raw overlap, so
    /// larger absolute matches dominate and the ratio breaks ties.
    pub fn score(&self, clause_terms: &HashSet<String>) -> f64 {
        let overlap = clause_terms.intersection(&self.keywords).count() as f64;
        overlap / self.keywords.len().max(1) as f64 + overlap
    }
}

/// Profiles for a whole catalog, in catalog order.
pub fn build_profiles(tools: &[ToolSpec]) -> Vec<ToolProfile<'_>> {
    tools.iter().map(ToolProfile::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamType;

    fn weather_tool() -> ToolSpec {
        ToolSpec::new("get_weather", "Get the weather for a location").param(
            "location",
            ParamType::String,
            "City name",
            true,
        )
    }

    #[test]
    fn profile_merges_name_description_params_and_expansion() {
        let tool = weather_tool();
        let profile = ToolProfile::build(&tool);
        for kw in ["weather", "location", "city", "name", "forecast", "temperature"] {
            assert!(profile.keywords.contains(kw), "missing {kw}");
        }
        assert!(!profile.keywords.contains("get"));
        assert!(!profile.keywords.contains("the"));
    }

    #[test]
    fn expansion_matches_by_substring() {
        let tool = ToolSpec::new("schedule_alarm_clock", "");
        let profile = ToolProfile::build(&tool);
        assert!(profile.keywords.contains("wake"));
        assert!(profile.keywords.contains("pm"));
    }

    #[test]
    fn custom_expansion_table_is_honored() {
        let tool = ToolSpec::new("order_pizza", "Order food");
        let table: &[(&str, &[&str])] = &[("pizza", &["pepperoni", "delivery"])];
        let profile = ToolProfile::build_with(&tool, table);
        assert!(profile.keywords.contains("pepperoni"));
        assert!(profile.keywords.contains("food"));
    }

    #[test]
    fn score_blends_ratio_and_count() {
        let tool = weather_tool();
        let profile = ToolProfile::build(&tool);
        let k = profile.keywords.len() as f64;

        let one = tokenize("forecast please");
        assert!((profile.score(&one) - (1.0 / k + 1.0)).abs() < 1e-9);

        let two = tokenize("weather forecast");
        assert!((profile.score(&two) - (2.0 / k + 2.0)).abs() < 1e-9);

        assert_eq!(profile.score(&tokenize("play jazz")), 0.0);
    }
}
