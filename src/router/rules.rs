//! Per-concept argument extraction rules.
//!
//! Each concept (keyed by substring on the tool name) owns an ordered list of
//! slot extractors. Within a slot only the first pattern that yields a usable
//! capture is used; later patterns cover phrasing variants. Slots only fill
//! parameters the tool actually declares.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::clause::is_stop_word;
use crate::types::ToolSpec;

/// Punctuation that ends a captured value.
const TAIL_PUNCTUATION: &[char] = &[',', '.', ';', '!', '?'];

/// Phrases that end any captured text value.
const TAIL_CONJUNCTIONS: &[&str] = &[" and ", " then ", " also "];

/// Nouns for the message itself; never a recipient.
const MESSAGE_NOUNS: &[&str] = &["message", "text", "sms"];

/// Pronouns a later messaging call may use for an earlier contact.
pub const REFERRING_PRONOUNS: &[&str] = &["him", "her"];

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s?m\b\.?").unwrap()
});

// ── Rule model ───────────────────────────────────────────────────

/// How one argument slot is pulled out of clause text.
#[derive(Debug)]
pub enum Extractor {
    /// Free text from capture group 1 of the first pattern that survives trimming.
    Text {
        params: &'static [&'static str],
        patterns: Vec<Regex>,
        /// Extra phrases (lowercase, space-padded) that end the value.
        stops: &'static [&'static str],
        /// Trailing words dropped from the value ("jazz music" → "jazz").
        strip_suffixes: &'static [&'static str],
        /// Whole values (lowercase) that fall through to the next pattern.
        rejects: &'static [&'static str],
    },
    /// Integer from capture group 1.
    Count {
        params: &'static [&'static str],
        patterns: Vec<Regex>,
    },
    /// "<h>[:<mm>] am|pm" as 24-hour integers.
    ClockTime {
        hour_params: &'static [&'static str],
        minute_params: &'static [&'static str],
    },
    /// "<h>[:<mm>] am|pm" rendered as "H:MM AM".
    ClockText { params: &'static [&'static str] },
}

/// Role a concept plays in cross-clause pronoun resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// Its value becomes the last referenced contact.
    Antecedent(&'static [&'static str]),
    /// A "him"/"her" value here is replaced by the last referenced contact.
    Pronoun(&'static [&'static str]),
}

/// Extraction rules for one tool family.
#[derive(Debug)]
pub struct ConceptRules {
    pub concept: &'static str,
    pub extractors: Vec<Extractor>,
    pub reference: Option<Reference>,
}

fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources.iter().map(|s| Regex::new(s).unwrap()).collect()
}

/// Concept table, first substring match on the tool name wins.
pub static CONCEPT_RULES: LazyLock<Vec<ConceptRules>> = LazyLock::new(|| {
    vec![
        ConceptRules {
            concept: "weather",
            extractors: vec![Extractor::Text {
                params: &["location", "city", "place"],
                patterns: patterns(&[r"(?i)\bin\s+([A-Za-z][A-Za-z\s'\-]*)"]),
                stops: &[" today", " tomorrow", " tonight", " right now", " this "],
                strip_suffixes: &[],
                rejects: &[],
            }],
            reference: None,
        },
        ConceptRules {
            concept: "alarm",
            extractors: vec![Extractor::ClockTime {
                hour_params: &["hour"],
                minute_params: &["minute"],
            }],
            reference: None,
        },
        ConceptRules {
            concept: "timer",
            extractors: vec![Extractor::Count {
                params: &["minutes", "duration"],
                patterns: patterns(&[r"(?i)\b(\d+)\s*(?:minutes?|mins?)\b"]),
            }],
            reference: None,
        },
        ConceptRules {
            concept: "remind",
            extractors: vec![
                Extractor::Text {
                    params: &["title", "task", "text"],
                    patterns: patterns(&[
                        r"(?i)\bremind\s+me\s+(?:about|to)\s+(.+?)(?:\s+(?:at|on|by)\s+\d|$)",
                    ]),
                    stops: &[],
                    strip_suffixes: &[],
                    rejects: &[],
                },
                Extractor::ClockText { params: &["time"] },
            ],
            reference: None,
        },
        ConceptRules {
            concept: "message",
            extractors: vec![
                Extractor::Text {
                    params: &["recipient", "to", "contact"],
                    patterns: patterns(&[
                        concat!(
                            r"(?i)\bsend\s+(?:a\s+)?(?:text\s+)?(?:message|text)\s+to\s+",
                            r"([A-Za-z][A-Za-z\s'\-]*)",
                        ),
                        r"(?i)\bsend\s+([A-Za-z][A-Za-z'\-]*)\s+(?:a\s+)?(?:message|text)\b",
                        r"(?i)\btext\s+([A-Za-z][A-Za-z\s'\-]*)",
                        r"(?i)\bto\s+([A-Za-z][A-Za-z\s'\-]*)",
                    ]),
                    stops: &[
                        " saying", " that ", " to say", " telling", " about ", " with ", " a ",
                        " an ", " to ",
                    ],
                    strip_suffixes: &[],
                    rejects: MESSAGE_NOUNS,
                },
                Extractor::Text {
                    params: &["message", "body", "content"],
                    patterns: patterns(&[r"(?i)\bsaying\s+(.+)"]),
                    stops: &[],
                    strip_suffixes: &[],
                    rejects: &[],
                },
            ],
            reference: Some(Reference::Pronoun(&["recipient", "to", "contact"])),
        },
        ConceptRules {
            concept: "contact",
            extractors: vec![Extractor::Text {
                params: &["query", "name", "contact"],
                patterns: patterns(&[
                    r"(?i)\b(?:find|look\s+up|search\s+for)\s+([A-Za-z][A-Za-z\s'\-]*)",
                ]),
                stops: &[" in ", " from ", " on ", " among "],
                strip_suffixes: &[],
                rejects: &[],
            }],
            reference: Some(Reference::Antecedent(&["query", "name", "contact"])),
        },
        ConceptRules {
            concept: "music",
            extractors: vec![Extractor::Text {
                params: &["song", "track", "query"],
                patterns: patterns(&[r"(?i)\bplay\s+(?:some\s+)?(.+)"]),
                stops: &[" on ", " by request"],
                strip_suffixes: &[" music", " songs"],
                rejects: &[],
            }],
            reference: None,
        },
    ]
});

/// Rules for a tool, by first concept key contained in its lowercased name.
pub fn rules_for(tool_name: &str) -> Option<&'static ConceptRules> {
    let lower = tool_name.to_lowercase();
    CONCEPT_RULES.iter().find(|r| lower.contains(r.concept))
}

// ── Value helpers ────────────────────────────────────────────────

/// Cut `raw` at the first tail stop, trim, drop suffixes; reject empties,
/// bare stop words and `rejects` so the next pattern gets a chance.
fn trim_capture(
    raw: &str,
    stops: &[&str],
    strip_suffixes: &[&str],
    rejects: &[&str],
) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `raw`.
    let lower = raw.to_ascii_lowercase();
    let mut end = raw.find(TAIL_PUNCTUATION).unwrap_or(raw.len());
    for stop in TAIL_CONJUNCTIONS.iter().chain(stops) {
        if let Some(idx) = lower.find(stop) {
            end = end.min(idx);
        }
    }

    let mut value = raw[..end].trim();
    for suffix in strip_suffixes {
        let lower_value = value.to_ascii_lowercase();
        if lower_value.len() > suffix.len() && lower_value.ends_with(suffix) {
            value = value[..value.len() - suffix.len()].trim();
        }
    }

    let lower_value = value.to_lowercase();
    if value.is_empty() || is_stop_word(&lower_value) || rejects.contains(&lower_value.as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// First clock time in `text` as `(hour 0-23, minute, hour 1-12, is_pm)`.
pub fn parse_clock(text: &str) -> Option<(u32, u32, u32, bool)> {
    CLOCK_TIME.captures_iter(text).find_map(|caps| {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map_or(Some(0), |m| m.as_str().parse().ok())?;
        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("p");
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        Some((hour24, minute, hour, pm))
    })
}

fn first_declared(tool: &ToolSpec, params: &[&'static str]) -> Option<&'static str> {
    params.iter().copied().find(|p| tool.declares(p))
}

// ── Extraction ───────────────────────────────────────────────────

impl Extractor {
    fn apply(&self, tool: &ToolSpec, clause: &str, args: &mut Map<String, Value>) {
        match self {
            Self::Text {
                params,
                patterns,
                stops,
                strip_suffixes,
                rejects,
            } => {
                let Some(param) = first_declared(tool, params) else {
                    return;
                };
                let value = patterns.iter().find_map(|re| {
                    let caps = re.captures(clause)?;
                    trim_capture(caps.get(1)?.as_str(), stops, strip_suffixes, rejects)
                });
                if let Some(value) = value {
                    args.insert(param.to_string(), Value::String(value));
                }
            }
            Self::Count { params, patterns } => {
                let Some(param) = first_declared(tool, params) else {
                    return;
                };
                let value = patterns.iter().find_map(|re| {
                    re.captures(clause)?.get(1)?.as_str().parse::<u64>().ok()
                });
                if let Some(value) = value {
                    args.insert(param.to_string(), Value::from(value));
                }
            }
            Self::ClockTime {
                hour_params,
                minute_params,
            } => {
                let Some((hour, minute, _, _)) = parse_clock(clause) else {
                    return;
                };
                if let Some(param) = first_declared(tool, hour_params) {
                    args.insert(param.to_string(), Value::from(hour));
                }
                if let Some(param) = first_declared(tool, minute_params) {
                    args.insert(param.to_string(), Value::from(minute));
                }
            }
            Self::ClockText { params } => {
                let Some(param) = first_declared(tool, params) else {
                    return;
                };
                if let Some((_, minute, hour12, pm)) = parse_clock(clause) {
                    let meridiem = if pm { "PM" } else { "AM" };
                    args.insert(
                        param.to_string(),
                        Value::String(format!("{hour12}:{minute:02} {meridiem}")),
                    );
                }
            }
        }
    }
}

/// Extract arguments for `tool` from one clause. Tools with no matching
/// concept get an empty argument map.
pub fn extract_arguments(tool: &ToolSpec, clause: &str) -> Map<String, Value> {
    let mut args = Map::new();
    if let Some(rules) = rules_for(&tool.name) {
        for extractor in &rules.extractors {
            extractor.apply(tool, clause, &mut args);
        }
    }
    args
}
