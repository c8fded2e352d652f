//! Request/response types shared by every routing stage.
//!
//! All of these are created fresh per routing request and dropped once the
//! [`RoutingResult`] is handed back. Nothing here is shared across requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ── Tool catalog ─────────────────────────────────────────────────

/// Declared JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    /// Any other JSON-schema type (`array`, `object`, ...). Never type-checked.
    #[serde(other)]
    Other,
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: ParamType,
    #[serde(default)]
    pub description: String,
}

fn object_type() -> String {
    "object".into()
}

/// Parameter schema of a tool (JSON-schema `object` subset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type", default = "object_type")]
    pub kind: String,
    #[serde(default)]
    pub properties: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self {
            kind: object_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// A callable tool as declared by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: ToolParameters,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters::default(),
        }
    }

    /// Builder helper: declare a parameter, optionally required.
    pub fn param(
        mut self,
        name: &str,
        kind: ParamType,
        description: &str,
        required: bool,
    ) -> Self {
        self.parameters.properties.insert(
            name.to_string(),
            ParamSpec {
                kind,
                description: description.to_string(),
            },
        );
        if required {
            self.parameters.required.push(name.to_string());
        }
        self
    }

    /// Declared type of `param`, if the tool has it.
    pub fn param_type(&self, param: &str) -> Option<ParamType> {
        self.parameters.properties.get(param).map(|p| p.kind)
    }

    pub fn declares(&self, param: &str) -> bool {
        self.parameters.properties.contains_key(param)
    }
}

// ── Conversation ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Concatenate all `user` turns with single spaces, oldest first.
pub fn user_text(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Calls and results ────────────────────────────────────────────

/// A concrete function call. `arguments` is key-ordered, so two calls with the
/// same arguments serialize identically regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    /// String argument, if present and a string.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Canonical `(name, arguments)` key used for deduplication.
    pub fn canonical_key(&self) -> (String, String) {
        (
            self.name.clone(),
            Value::Object(self.arguments.clone()).to_string(),
        )
    }
}

/// Which stage produced a [`RoutingResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteSource {
    /// Deterministic parse accepted without touching the model.
    OnDeviceFast,
    /// On-device model output accepted.
    OnDeviceModel,
    /// Deterministic re-parse or local settle after the model fell short.
    OnDeviceFallback,
    /// Remote escalation.
    Cloud,
}

impl RouteSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::OnDeviceFast => "on-device-fast",
            Self::OnDeviceModel => "on-device-model",
            Self::OnDeviceFallback => "on-device-fallback",
            Self::Cloud => "cloud",
        }
    }

    pub fn is_on_device(self) -> bool {
        !matches!(self, Self::Cloud)
    }
}

impl std::fmt::Display for RouteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The unit returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub function_calls: Vec<ToolCall>,
    /// In `[0, 1]`; never below the configured floor when calls are present.
    pub confidence: f64,
    pub total_time_ms: f64,
    pub source: RouteSource,
}
