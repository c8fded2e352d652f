//! Deterministic on-device routing.
//!
//! Turns an utterance into tool calls without any model:
//!
//! 1. [`clause`] splits the utterance and tokenizes each clause.
//! 2. [`profile`] builds a keyword fingerprint per tool.
//! 3. [`schema`] picks the best tool per clause, runs the [`rules`] for that
//!    tool family, resolves "him"/"her" across clauses, validates and
//!    deduplicates.
//!
//! Both keyword tables ([`profile::SEMANTIC_EXPANSIONS`] and
//! [`rules::CONCEPT_RULES`]) are keyed by substring on the tool name, so new
//! tool families are added as rows rather than branches.

pub mod clause;
pub mod profile;
pub mod rules;
pub mod schema;

pub use clause::{split_clauses, tokenize};
pub use profile::{build_profiles, ToolProfile};
pub use schema::{dedup_calls, resolve_pronouns, SchemaRouter};
