//! On-device model adapter backed by a local Ollama server.
//!
//! Uses the native `/api/chat` endpoint with tool definitions. Small models
//! answer either with native `tool_calls` or with a JSON object in the
//! message content:
//!
//! ```json
//! {"function_calls": [{"name": "...", "arguments": {...}}], "confidence": 0.9}
//! ```
//!
//! Both shapes are accepted. Anything else decodes to an empty output.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{call_from_json, coerce_arguments, ModelAdapter, ModelOutput};
use crate::config::ModelConfig;
use crate::types::{Message, ToolCall, ToolSpec};

const SYSTEM_PROMPT: &str = "You are a precise function calling assistant.";

pub struct OllamaAdapter {
    base_url: String,
    model: String,
    client: reqwest::Client,
    /// Set once `/api/tags` answers; re-probed on every call until then.
    available: AtomicBool,
}

impl OllamaAdapter {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            available: AtomicBool::new(false),
        })
    }

    pub fn from_config(config: &ModelConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.ollama_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Probe `GET /api/tags`. A success is cached for the adapter's lifetime.
    pub async fn check_health(&self) -> bool {
        if self.available.load(Ordering::Relaxed) {
            return true;
        }
        let url = format!("{}/api/tags", self.base_url);
        let ok = matches!(
            self.client.get(&url).send().await,
            Ok(resp) if resp.status().is_success()
        );
        if ok {
            self.available.store(true, Ordering::Relaxed);
        }
        ok
    }
}

#[async_trait]
impl ModelAdapter for OllamaAdapter {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn infer(&self, messages: &[Message], tools: &[ToolSpec]) -> anyhow::Result<ModelOutput> {
        let start = Instant::now();

        if !self.check_health().await {
            anyhow::bail!("Ollama is not reachable at {}", self.base_url);
        }

        let mut chat = vec![Message::system(SYSTEM_PROMPT)];
        chat.extend(messages.iter().cloned());
        let tool_defs: Vec<Value> = tools
            .iter()
            .map(|t| serde_json::json!({ "type": "function", "function": t }))
            .collect();

        let payload = serde_json::json!({
            "model": self.model,
            "messages": chat,
            "tools": tool_defs,
            "stream": false,
            "options": { "temperature": 0.0 }
        });

        let url = format!("{}/api/chat", self.base_url);
        let resp = self.client.post(&url).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned status {}: {}", status, body);
        }

        let raw = resp.text().await?;
        let mut output = match serde_json::from_str::<Value>(&raw) {
            Ok(body) => parse_chat_response(&body),
            Err(e) => {
                tracing::debug!(error = %e, "Undecodable Ollama response");
                ModelOutput::default()
            }
        };
        for call in &mut output.function_calls {
            coerce_arguments(call, tools);
        }
        output.total_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(output)
    }
}

/// Decode an `/api/chat` response body. Native tool calls carry no
/// calibrated confidence, so they report `0.0`.
pub fn parse_chat_response(body: &Value) -> ModelOutput {
    let message = &body["message"];

    let native: Vec<ToolCall> = message["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .filter_map(|c| {
                    let function = &c["function"];
                    call_from_json(function["name"].as_str()?, &function["arguments"])
                })
                .collect()
        })
        .unwrap_or_default();
    if !native.is_empty() {
        return ModelOutput {
            function_calls: native,
            ..ModelOutput::default()
        };
    }

    message["content"]
        .as_str()
        .map(parse_model_output)
        .unwrap_or_default()
}

/// Decode a `{"function_calls", "confidence"}` JSON object embedded in model
/// text. Reasoning blocks and code fences around it are ignored.
pub fn parse_model_output(text: &str) -> ModelOutput {
    let text = match text.rfind("</think>") {
        Some(idx) => &text[idx + "</think>".len()..],
        None => text,
    };
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return ModelOutput::default();
    };
    if end < start {
        return ModelOutput::default();
    }
    let Ok(body) = serde_json::from_str::<Value>(&text[start..=end]) else {
        return ModelOutput::default();
    };

    let function_calls: Vec<ToolCall> = body["function_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .filter_map(|c| call_from_json(c["name"].as_str()?, &c["arguments"]))
                .collect()
        })
        .unwrap_or_default();

    let handoff = body["cloud_handoff"].as_bool().unwrap_or(false);
    let confidence = if handoff {
        0.0
    } else {
        body["confidence"].as_f64().unwrap_or(0.0).clamp(0.0, 1.0)
    };

    ModelOutput {
        function_calls,
        confidence,
        total_time_ms: 0.0,
    }
}
