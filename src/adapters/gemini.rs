//! Cloud escalation through the Gemini `generateContent` REST API with
//! function declarations.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};

use super::{call_from_json, coerce_arguments, CloudAdapter, CloudOutput};
use crate::config::CloudConfig;
use crate::types::{user_text, Message, ParamType, ToolCall, ToolSpec};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiAdapter {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiAdapter {
    pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        Self::with_base_url(GEMINI_API_BASE, api_key, model, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            api_key,
            model,
            client,
        })
    }

    pub fn from_config(config: &CloudConfig, api_key: String) -> anyhow::Result<Self> {
        Self::new(
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn schema_type(kind: ParamType) -> &'static str {
    match kind {
        ParamType::String | ParamType::Other => "STRING",
        ParamType::Integer => "INTEGER",
        ParamType::Number => "NUMBER",
        ParamType::Boolean => "BOOLEAN",
    }
}

/// Gemini `FunctionDeclaration` for one tool.
pub fn function_declaration(tool: &ToolSpec) -> Value {
    let mut decl = Map::new();
    decl.insert("name".into(), json!(tool.name));
    decl.insert("description".into(), json!(tool.description));

    if !tool.parameters.properties.is_empty() {
        let properties: Map<String, Value> = tool
            .parameters
            .properties
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    json!({ "type": schema_type(spec.kind), "description": spec.description }),
                )
            })
            .collect();
        decl.insert(
            "parameters".into(),
            json!({
                "type": "OBJECT",
                "properties": properties,
                "required": tool.parameters.required,
            }),
        );
    }
    Value::Object(decl)
}

/// Function calls from a `generateContent` response, in part order.
pub fn parse_function_calls(body: &Value) -> Vec<ToolCall> {
    body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| {
                    let fc = part.get("functionCall")?;
                    call_from_json(fc["name"].as_str()?, &fc["args"])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl CloudAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn infer(&self, messages: &[Message], tools: &[ToolSpec]) -> anyhow::Result<CloudOutput> {
        let start = Instant::now();

        let declarations: Vec<Value> = tools.iter().map(function_declaration).collect();
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": user_text(messages) }]
            }],
            "tools": [{ "functionDeclarations": declarations }],
            "generationConfig": { "temperature": 0.0 }
        });

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let resp = self.client.post(&url).json(&payload).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, body);
        }

        let body: Value = resp.json().await?;
        let mut function_calls = parse_function_calls(&body);
        for call in &mut function_calls {
            coerce_arguments(call, tools);
        }

        Ok(CloudOutput {
            function_calls,
            total_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_tools;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn declaration_uses_gemini_schema_types() {
        let tools = builtin_tools();
        let alarm = tools.iter().find(|t| t.name == "set_alarm").unwrap();
        let decl = function_declaration(alarm);
        assert_eq!(decl["name"], "set_alarm");
        assert_eq!(decl["parameters"]["type"], "OBJECT");
        assert_eq!(decl["parameters"]["properties"]["hour"]["type"], "INTEGER");
        assert_eq!(decl["parameters"]["required"], json!(["hour", "minute"]));

        let bare = function_declaration(&ToolSpec::new("ping", "Ping"));
        assert!(bare.get("parameters").is_none());
    }

    #[test]
    fn parses_function_call_parts_only() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Sure."},
                        {"functionCall": {"name": "get_weather", "args": {"location": "Tokyo"}}},
                        {"functionCall": {"name": "set_timer", "args": {"minutes": 3}}}
                    ]
                }
            }]
        });
        let calls = parse_function_calls(&body);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].str_arg("location"), Some("Tokyo"));
        assert!(parse_function_calls(&json!({})).is_empty());
    }

    fn adapter(server: &MockServer) -> GeminiAdapter {
        GeminiAdapter::with_base_url(
            &server.uri(),
            "test-key".into(),
            "gemini-2.5-flash".into(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn infer_posts_user_text_and_decodes_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Set an alarm for 7 AM"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"functionCall": {
                            "name": "set_alarm",
                            "args": {"hour": 7.0, "minute": 0.0}
                        }}]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let messages = vec![
            Message::system("ignored"),
            Message::user("Set an alarm for 7 AM"),
        ];
        let out = adapter(&server).infer(&messages, &builtin_tools()).await.unwrap();
        assert_eq!(
            out.function_calls,
            vec![ToolCall::new("set_alarm").with_arg("hour", 7).with_arg("minute", 0)]
        );
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .infer(&[Message::user("hi")], &builtin_tools())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Gemini API error"));
    }
}
