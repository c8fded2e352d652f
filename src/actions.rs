//! Voice-to-action response shaping.
//!
//! Routing stops at validated calls. This layer renders each call as a
//! human-readable action line (no side effects) and composes the assistant
//! reply returned alongside the routing fields.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::types::{RouteSource, RoutingResult, ToolCall};

/// Flat response: routing fields plus product-level fields.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub ok: bool,
    pub transcript: String,
    pub source: RouteSource,
    pub confidence: f64,
    pub total_time_ms: f64,
    pub function_calls: Vec<ToolCall>,
    pub actions: Vec<String>,
    pub assistant_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RouteResponse {
    pub fn from_result(transcript: &str, result: RoutingResult) -> Self {
        let calls = dedup_normalized(result.function_calls);

        let mut seen = HashSet::new();
        let actions: Vec<String> = calls
            .iter()
            .map(simulate_action)
            .filter(|a| seen.insert(a.clone()))
            .collect();

        let assistant_response = build_assistant_response(&calls, &actions, None);
        Self {
            ok: true,
            transcript: transcript.to_string(),
            source: result.source,
            confidence: result.confidence,
            total_time_ms: result.total_time_ms,
            function_calls: calls,
            actions,
            assistant_response,
            warning: None,
        }
    }

    /// Replace the reply with a warning; routed calls are kept.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        let warning = warning.into();
        self.assistant_response =
            build_assistant_response(&self.function_calls, &self.actions, Some(&warning));
        self.warning = Some(warning);
        self
    }
}

fn arg_display(args: &Map<String, Value>, key: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "?".into(),
        Some(other) => other.to_string(),
    }
}

/// One-line description of what executing `call` would do.
pub fn simulate_action(call: &ToolCall) -> String {
    let args = &call.arguments;
    match call.name.as_str() {
        "set_alarm" => {
            let hour = arg_display(args, "hour");
            match args.get("minute").and_then(Value::as_u64) {
                Some(minute) => format!("Alarm scheduled for {hour}:{minute:02}"),
                None => format!("Alarm scheduled for {hour}:{}", arg_display(args, "minute")),
            }
        }
        "set_timer" => format!("Timer set for {} minutes", arg_display(args, "minutes")),
        "send_message" => format!(
            "Message sent to {}: {}",
            arg_display(args, "recipient"),
            arg_display(args, "message")
        ),
        "create_reminder" => format!(
            "Reminder created: {} at {}",
            arg_display(args, "title"),
            arg_display(args, "time")
        ),
        "search_contacts" => format!("Searching contacts for: {}", arg_display(args, "query")),
        "play_music" => format!("Playing music: {}", arg_display(args, "song")),
        "get_weather" => match call.str_arg("location") {
            Some(location) => format!("Checking the weather in {location}"),
            None => "Weather request missing location".into(),
        },
        other => format!("Executed {other}"),
    }
}

/// Compose the assistant reply. A warning always wins.
pub fn build_assistant_response(
    calls: &[ToolCall],
    actions: &[String],
    warning: Option<&str>,
) -> String {
    if let Some(warning) = warning {
        return warning.to_string();
    }
    if calls.is_empty() {
        return "I heard you, but I could not map that to available actions. Please try rephrasing."
            .into();
    }
    match actions {
        [single] => format!("Done. {single}."),
        _ => format!("Done. I processed your request: {}.", actions.join("; ")),
    }
}

/// Collapse calls whose string arguments differ only in case or padding.
pub fn dedup_normalized(calls: Vec<ToolCall>) -> Vec<ToolCall> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .filter(|call| {
            let normalized: Map<String, Value> = call
                .arguments
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => Value::String(s.trim().to_lowercase()),
                        other => other.clone(),
                    };
                    (k.clone(), v)
                })
                .collect();
            seen.insert((call.name.clone(), Value::Object(normalized).to_string()))
        })
        .collect()
}
