//! External inference backends behind narrow async traits.
//!
//! The orchestrator only ever sees [`ModelAdapter`] and [`CloudAdapter`].
//! Concrete backends (Ollama on-device, Gemini in the cloud) live in
//! submodules; tests swap in fakes.

pub mod gemini;
pub mod ollama;

pub use gemini::GeminiAdapter;
pub use ollama::OllamaAdapter;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::RouterConfig;
use crate::types::{Message, ParamType, ToolCall, ToolSpec};

// ── Outputs ──────────────────────────────────────────────────────

/// Result of one on-device model inference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    pub function_calls: Vec<ToolCall>,
    /// Self-reported confidence; `0.0` when the backend gives none.
    pub confidence: f64,
    pub total_time_ms: f64,
}

/// Result of one cloud inference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudOutput {
    pub function_calls: Vec<ToolCall>,
    pub total_time_ms: f64,
}

// ── Traits ───────────────────────────────────────────────────────

/// On-device model. Malformed engine output must come back as an empty
/// [`ModelOutput`], not an error; `Err` is reserved for transport failures
/// and an unavailable backend.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn infer(&self, messages: &[Message], tools: &[ToolSpec]) -> anyhow::Result<ModelOutput>;
}

/// Remote escalation target.
#[async_trait]
pub trait CloudAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn infer(&self, messages: &[Message], tools: &[ToolSpec]) -> anyhow::Result<CloudOutput>;
}

// ── Factories ────────────────────────────────────────────────────

/// On-device adapter from config, or `None` when disabled.
pub fn create_model_adapter(
    config: &RouterConfig,
) -> anyhow::Result<Option<Arc<dyn ModelAdapter>>> {
    if !config.model.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(OllamaAdapter::from_config(&config.model)?)))
}

/// Cloud adapter, or `None` when no credential is in the environment.
pub fn create_cloud_adapter(
    config: &RouterConfig,
) -> anyhow::Result<Option<Arc<dyn CloudAdapter>>> {
    match config.cloud.api_key() {
        Some(key) => Ok(Some(Arc::new(GeminiAdapter::from_config(&config.cloud, key)?))),
        None => Ok(None),
    }
}

// ── Argument coercion ────────────────────────────────────────────

/// Model backends often emit `7.0` or `"7"` for integer parameters. Coerce
/// those to integers for declared `integer` params; anything else is left
/// for the validator to judge.
pub fn coerce_arguments(call: &mut ToolCall, tools: &[ToolSpec]) {
    let Some(tool) = tools.iter().find(|t| t.name == call.name) else {
        return;
    };
    for (key, value) in call.arguments.iter_mut() {
        if tool.param_type(key) != Some(ParamType::Integer) {
            continue;
        }
        if let Some(int) = as_integer(value) {
            *value = Value::from(int);
        }
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_i64() => None,
        Value::Number(n) => {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.trim_start_matches('-').bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse().ok()
        }
        _ => None,
    }
}

/// Build a call from a JSON `{name, arguments}` object. Arguments may arrive
/// as an object or as a JSON-encoded string.
pub(crate) fn call_from_json(name: &str, arguments: &Value) -> Option<ToolCall> {
    if name.trim().is_empty() {
        return None;
    }
    let arguments: Map<String, Value> = match arguments {
        Value::Object(map) => map.clone(),
        Value::String(raw) => serde_json::from_str(raw).ok()?,
        Value::Null => Map::new(),
        _ => return None,
    };
    Some(ToolCall {
        name: name.to_string(),
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_tools;
    use serde_json::json;

    #[test]
    fn integral_floats_and_digit_strings_become_integers() {
        let mut call = ToolCall::new("set_alarm")
            .with_arg("hour", 7.0)
            .with_arg("minute", "30");
        coerce_arguments(&mut call, &builtin_tools());
        assert_eq!(call.arguments["hour"], json!(7));
        assert!(call.arguments["hour"].is_i64());
        assert_eq!(call.arguments["minute"], json!(30));
    }

    #[test]
    fn non_integral_values_are_left_alone() {
        let mut call = ToolCall::new("set_alarm")
            .with_arg("hour", 7.5)
            .with_arg("minute", "half past");
        coerce_arguments(&mut call, &builtin_tools());
        assert_eq!(call.arguments["hour"], json!(7.5));
        assert_eq!(call.arguments["minute"], json!("half past"));
    }

    #[test]
    fn string_params_are_never_coerced() {
        let mut call = ToolCall::new("play_music").with_arg("song", "1999");
        coerce_arguments(&mut call, &builtin_tools());
        assert_eq!(call.arguments["song"], json!("1999"));
    }

    #[test]
    fn call_from_json_accepts_string_arguments() {
        let call = call_from_json("set_timer", &json!("{\"minutes\": 5}")).unwrap();
        assert_eq!(call.arguments["minutes"], json!(5));
        assert!(call_from_json("", &json!({})).is_none());
        assert!(call_from_json("set_timer", &json!("not json")).is_none());
        assert!(call_from_json("set_timer", &json!(3)).is_none());
    }

    #[test]
    fn disabled_model_yields_no_adapter() {
        let mut config = RouterConfig::default();
        config.model.enabled = false;
        assert!(create_model_adapter(&config).unwrap().is_none());

        config.model.enabled = true;
        let adapter = create_model_adapter(&config).unwrap().unwrap();
        assert_eq!(adapter.name(), "ollama");
    }

    #[test]
    fn missing_credential_yields_no_cloud_adapter() {
        let mut config = RouterConfig::default();
        config.cloud.api_key_env = "EDGEROUTE_TEST_UNSET_CLOUD_KEY".into();
        assert!(create_cloud_adapter(&config).unwrap().is_none());
    }
}
