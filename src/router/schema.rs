//! Deterministic clause → tool-call parser.

use std::collections::HashSet;

use super::clause::{split_clauses, tokenize};
use super::profile::{ToolProfile, SEMANTIC_EXPANSIONS};
use super::rules::{extract_arguments, rules_for, Reference, REFERRING_PRONOUNS};
use crate::types::{ToolCall, ToolSpec};
use crate::validate::retain_valid;

/// Keyword-overlap router. Holds only static tables, so one instance can
/// serve any number of concurrent requests.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRouter {
    expansions: &'static [(&'static str, &'static [&'static str])],
}

impl Default for SchemaRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRouter {
    pub fn new() -> Self {
        Self::with_expansions(SEMANTIC_EXPANSIONS)
    }

    pub fn with_expansions(expansions: &'static [(&'static str, &'static [&'static str])]) -> Self {
        Self { expansions }
    }

    /// Parse an utterance into validated, deduplicated calls.
    ///
    /// Clauses that match no tool are skipped; an empty result is a valid
    /// outcome, not an error.
    pub fn parse(&self, utterance: &str, tools: &[ToolSpec]) -> Vec<ToolCall> {
        let profiles: Vec<ToolProfile<'_>> = tools
            .iter()
            .map(|t| ToolProfile::build_with(t, self.expansions))
            .collect();

        let mut calls = Vec::new();
        for clause in split_clauses(utterance) {
            let terms = tokenize(&clause);
            let Some(profile) = best_profile(&profiles, &terms) else {
                tracing::debug!(clause = %clause, "No tool matched clause");
                continue;
            };
            let arguments = extract_arguments(profile.tool, &clause);
            calls.push(ToolCall {
                name: profile.tool.name.clone(),
                arguments,
            });
        }

        resolve_pronouns(&mut calls);
        dedup_calls(retain_valid(calls, tools))
    }
}

/// Strictly highest positive score; ties keep the earlier catalog entry.
fn best_profile<'p, 'a>(
    profiles: &'p [ToolProfile<'a>],
    terms: &HashSet<String>,
) -> Option<&'p ToolProfile<'a>> {
    let mut best: Option<(&ToolProfile<'a>, f64)> = None;
    for profile in profiles {
        let score = profile.score(terms);
        if score <= 0.0 {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((profile, score));
        }
    }
    best.map(|(profile, _)| profile)
}

/// Single forward pass: a contact lookup's query becomes the referent for
/// any later "him"/"her" recipient.
pub fn resolve_pronouns(calls: &mut [ToolCall]) {
    let mut last_contact: Option<String> = None;

    for call in calls.iter_mut() {
        let Some(reference) = rules_for(&call.name).and_then(|r| r.reference) else {
            continue;
        };
        match reference {
            Reference::Antecedent(params) => {
                if let Some(name) = params.iter().find_map(|p| call.str_arg(p)) {
                    last_contact = Some(name.to_string());
                }
            }
            Reference::Pronoun(params) => {
                let Some(contact) = &last_contact else {
                    continue;
                };
                for param in params {
                    let is_pronoun = call.str_arg(param).is_some_and(|v| {
                        REFERRING_PRONOUNS
                            .iter()
                            .any(|p| v.trim().eq_ignore_ascii_case(p))
                    });
                    if is_pronoun {
                        call.arguments
                            .insert((*param).to_string(), contact.clone().into());
                    }
                }
            }
        }
    }
}

/// Drop repeated `(name, arguments)` pairs, keeping the first. Idempotent.
pub fn dedup_calls(calls: Vec<ToolCall>) -> Vec<ToolCall> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .filter(|call| seen.insert(call.canonical_key()))
        .collect()
}
