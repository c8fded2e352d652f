//! Built-in assistant tool catalog and JSON catalog loading.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::{ParamType, ToolSpec};

/// The seven assistant tools the CLI routes against by default.
pub fn builtin_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new("get_weather", "Get current weather for a location").param(
            "location",
            ParamType::String,
            "City name",
            true,
        ),
        ToolSpec::new("set_alarm", "Set an alarm for a given time")
            .param("hour", ParamType::Integer, "Hour to set the alarm for", true)
            .param("minute", ParamType::Integer, "Minute to set the alarm for", true),
        ToolSpec::new("send_message", "Send a message to a contact")
            .param(
                "recipient",
                ParamType::String,
                "Name of the person to send the message to",
                true,
            )
            .param("message", ParamType::String, "The message content to send", true),
        ToolSpec::new("create_reminder", "Create a reminder with a title and time")
            .param("title", ParamType::String, "Reminder title", true)
            .param(
                "time",
                ParamType::String,
                "Time for the reminder (e.g. 3:00 PM)",
                true,
            ),
        ToolSpec::new("search_contacts", "Search for a contact by name").param(
            "query",
            ParamType::String,
            "Name to search for",
            true,
        ),
        ToolSpec::new("play_music", "Play a song or playlist").param(
            "song",
            ParamType::String,
            "Song or playlist name",
            true,
        ),
        ToolSpec::new("set_timer", "Set a countdown timer").param(
            "minutes",
            ParamType::Integer,
            "Number of minutes",
            true,
        ),
    ]
}

/// Load a catalog from a JSON array of tool specs. Also accepts the
/// `[{"type": "function", "function": {...}}]` wrapper shape.
pub fn load_tools(path: &Path) -> Result<Vec<ToolSpec>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tools(&raw)
}

pub fn parse_tools(raw: &str) -> Result<Vec<ToolSpec>, ConfigError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ConfigError::Catalog(e.to_string()))?;
    let Some(entries) = value.as_array() else {
        return Err(ConfigError::Catalog("expected a JSON array of tools".into()));
    };

    let mut tools = Vec::with_capacity(entries.len());
    for entry in entries {
        let spec = entry.get("function").unwrap_or(entry);
        let tool: ToolSpec = serde_json::from_value(spec.clone())
            .map_err(|e| ConfigError::Catalog(e.to_string()))?;
        if tools.iter().any(|t: &ToolSpec| t.name == tool.name) {
            return Err(ConfigError::Catalog(format!(
                "duplicate tool name '{}'",
                tool.name
            )));
        }
        tools.push(tool);
    }
    Ok(tools)
}
