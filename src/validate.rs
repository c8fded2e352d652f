//! Schema validation for candidate calls.
//!
//! Every call is checked here before it can be returned, whichever stage
//! produced it. Invalid calls are dropped, never repaired.

use serde_json::Value;

use crate::types::{ParamType, ToolCall, ToolSpec};

fn type_matches(kind: ParamType, value: &Value) -> bool {
    match kind {
        ParamType::String => value.is_string(),
        ParamType::Integer => value.is_i64() || value.is_u64(),
        ParamType::Number => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Other => true,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Whether `call` names a declared tool and satisfies its parameter schema.
pub fn validate_call(call: &ToolCall, tools: &[ToolSpec]) -> bool {
    let Some(tool) = tools.iter().find(|t| t.name == call.name) else {
        return false;
    };

    let required_present = tool.parameters.required.iter().all(|key| {
        call.arguments.get(key).is_some_and(|v| !is_blank(v))
    });
    if !required_present {
        return false;
    }

    call.arguments.iter().all(|(key, value)| {
        match tool.param_type(key) {
            // Optional nulls count as absent.
            Some(_) if value.is_null() => true,
            Some(kind) => type_matches(kind, value),
            None => true,
        }
    })
}

/// Keep only valid calls, preserving order.
pub fn retain_valid(calls: Vec<ToolCall>, tools: &[ToolSpec]) -> Vec<ToolCall> {
    calls
        .into_iter()
        .filter(|call| {
            let ok = validate_call(call, tools);
            if !ok {
                tracing::debug!(tool = %call.name, "Dropping schema-invalid call");
            }
            ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_tools;

    #[test]
    fn unknown_tool_fails() {
        let call = ToolCall::new("launch_rocket");
        assert!(!validate_call(&call, &builtin_tools()));
    }

    #[test]
    fn complete_call_passes() {
        let call = ToolCall::new("get_weather").with_arg("location", "Paris");
        assert!(validate_call(&call, &builtin_tools()));

        let call = ToolCall::new("set_alarm").with_arg("hour", 7).with_arg("minute", 30);
        assert!(validate_call(&call, &builtin_tools()));
    }

    #[test]
    fn missing_null_or_blank_required_fails() {
        let tools = builtin_tools();
        assert!(!validate_call(&ToolCall::new("get_weather"), &tools));
        assert!(!validate_call(
            &ToolCall::new("get_weather").with_arg("location", Value::Null),
            &tools
        ));
        assert!(!validate_call(
            &ToolCall::new("get_weather").with_arg("location", "   "),
            &tools
        ));
        assert!(!validate_call(
            &ToolCall::new("set_alarm").with_arg("hour", 7),
            &tools
        ));
    }

    #[test]
    fn type_mismatch_fails() {
        let tools = builtin_tools();
        assert!(!validate_call(
            &ToolCall::new("set_alarm").with_arg("hour", "7").with_arg("minute", 0),
            &tools
        ));
        assert!(!validate_call(
            &ToolCall::new("set_alarm").with_arg("hour", 7.5).with_arg("minute", 0),
            &tools
        ));
        assert!(!validate_call(
            &ToolCall::new("get_weather").with_arg("location", 42),
            &tools
        ));
    }

    #[test]
    fn number_and_boolean_types_are_checked() {
        let tool = ToolSpec::new("set_volume", "Set volume")
            .param("level", ParamType::Number, "0-1", true)
            .param("mute", ParamType::Boolean, "Mute output", false);
        let tools = vec![tool];

        assert!(validate_call(&ToolCall::new("set_volume").with_arg("level", 0.4), &tools));
        assert!(validate_call(&ToolCall::new("set_volume").with_arg("level", 1), &tools));
        assert!(!validate_call(
            &ToolCall::new("set_volume").with_arg("level", 0.4).with_arg("mute", "yes"),
            &tools
        ));
        assert!(validate_call(
            &ToolCall::new("set_volume").with_arg("level", 0.4).with_arg("mute", Value::Null),
            &tools
        ));
    }

    #[test]
    fn undeclared_arguments_are_tolerated() {
        let call = ToolCall::new("get_weather")
            .with_arg("location", "Oslo")
            .with_arg("units", "metric");
        assert!(validate_call(&call, &builtin_tools()));
    }

    #[test]
    fn retain_valid_preserves_order() {
        let tools = builtin_tools();
        let calls = vec![
            ToolCall::new("set_timer").with_arg("minutes", 5),
            ToolCall::new("get_weather"),
            ToolCall::new("play_music").with_arg("song", "jazz"),
        ];
        let kept = retain_valid(calls, &tools);
        let names: Vec<&str> = kept.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["set_timer", "play_music"]);
    }
}
