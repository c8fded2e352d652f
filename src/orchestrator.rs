//! Four-stage hybrid router.
//!
//! ```text
//! FastPath ──accept──▶ on-device-fast
//!    │
//!    ▼
//!  Model ────accept──▶ on-device-model
//!    │
//!    ▼
//! FallbackParse ─accept─▶ on-device-fallback
//!    │
//!    ▼
//!  Settle ──▶ cloud | on-device-fallback
//! ```
//!
//! Stages run strictly in order and the first acceptance wins. Adapter
//! failures are logged and treated as empty, zero-confidence answers, so
//! [`HybridRouter::route`] never fails.

use std::sync::Arc;
use std::time::Instant;

use crate::adapters::{create_cloud_adapter, create_model_adapter, CloudAdapter, ModelAdapter};
use crate::config::{RouterConfig, ScoringWeights, Thresholds};
use crate::confidence::ConfidenceScorer;
use crate::router::{dedup_calls, SchemaRouter};
use crate::types::{user_text, Message, RouteSource, RoutingResult, ToolCall, ToolSpec};
use crate::validate::retain_valid;

// ── State machine ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FastPath,
    Model,
    FallbackParse,
    Settle,
}

impl Stage {
    fn label(self) -> &'static str {
        match self {
            Self::FastPath => "fast_path",
            Self::Model => "model",
            Self::FallbackParse => "fallback_parse",
            Self::Settle => "settle",
        }
    }
}

enum Step {
    Done(RoutingResult),
    Advance(Stage),
}

/// What the on-device model produced, kept for the settle stage.
#[derive(Debug, Default)]
struct ModelAttempt {
    valid_calls: Vec<ToolCall>,
    reported_confidence: f64,
}

/// Per-request state threaded through the stages.
struct RouteContext<'a> {
    messages: &'a [Message],
    tools: &'a [ToolSpec],
    utterance: String,
    thresholds: Thresholds,
    started: Instant,
    /// Deterministic parse from the fast path; reused by the fallback stage.
    parse: Vec<ToolCall>,
    parse_confidence: f64,
    model: Option<ModelAttempt>,
}

impl RouteContext<'_> {
    fn finish(
        &self,
        function_calls: Vec<ToolCall>,
        confidence: f64,
        source: RouteSource,
    ) -> RoutingResult {
        let confidence = if function_calls.is_empty() {
            0.0
        } else {
            self.thresholds.floored(confidence)
        };
        RoutingResult {
            function_calls,
            confidence,
            total_time_ms: self.started.elapsed().as_secs_f64() * 1000.0,
            source,
        }
    }
}

// ── Router ───────────────────────────────────────────────────────

/// Staged router over the deterministic parser, an optional on-device
/// model and an optional cloud model.
pub struct HybridRouter {
    thresholds: Thresholds,
    parser: SchemaRouter,
    scorer: ConfidenceScorer,
    model: Option<Arc<dyn ModelAdapter>>,
    cloud: Option<Arc<dyn CloudAdapter>>,
}

impl HybridRouter {
    pub fn with_adapters(
        thresholds: Thresholds,
        weights: ScoringWeights,
        model: Option<Arc<dyn ModelAdapter>>,
        cloud: Option<Arc<dyn CloudAdapter>>,
    ) -> Self {
        if let Err(e) = thresholds.validate() {
            tracing::warn!(error = %e, "Routing with out-of-range thresholds");
        }
        Self {
            thresholds,
            parser: SchemaRouter::new(),
            scorer: ConfidenceScorer::new(weights),
            model,
            cloud,
        }
    }

    /// Build from config: Ollama when enabled, Gemini when a credential is
    /// present in the environment.
    pub fn from_config(config: &RouterConfig) -> anyhow::Result<Self> {
        config.thresholds.validate()?;
        Ok(Self::with_adapters(
            config.thresholds,
            config.scoring,
            create_model_adapter(config)?,
            create_cloud_adapter(config)?,
        ))
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn has_cloud(&self) -> bool {
        self.cloud.is_some()
    }

    /// Route `messages` against `tools`. `confidence_threshold` overrides
    /// the model-accept bar for this request only.
    pub async fn route(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        confidence_threshold: Option<f64>,
    ) -> RoutingResult {
        let thresholds = match confidence_threshold.filter(|t| t.is_finite()) {
            Some(t) => self.thresholds.with_model_accept(t),
            None => self.thresholds,
        };
        let mut ctx = RouteContext {
            messages,
            tools,
            utterance: user_text(messages),
            thresholds,
            started: Instant::now(),
            parse: Vec::new(),
            parse_confidence: 0.0,
            model: None,
        };

        let mut stage = Stage::FastPath;
        loop {
            let step = match stage {
                Stage::FastPath => self.fast_path(&mut ctx),
                Stage::Model => self.model_stage(&mut ctx).await,
                Stage::FallbackParse => self.fallback_parse(&ctx),
                Stage::Settle => Step::Done(self.settle(&ctx).await),
            };
            match step {
                Step::Done(result) => {
                    tracing::info!(
                        stage = stage.label(),
                        source = %result.source,
                        confidence = result.confidence,
                        calls = result.function_calls.len(),
                        elapsed_ms = result.total_time_ms,
                        "Routed utterance"
                    );
                    return result;
                }
                Step::Advance(next) => stage = next,
            }
        }
    }

    fn fast_path(&self, ctx: &mut RouteContext<'_>) -> Step {
        ctx.parse = self.parser.parse(&ctx.utterance, ctx.tools);
        ctx.parse_confidence = self.scorer.score(&ctx.utterance, ctx.tools, &ctx.parse);

        if !ctx.parse.is_empty() && ctx.parse_confidence >= ctx.thresholds.fastpath_accept {
            return Step::Done(ctx.finish(
                ctx.parse.clone(),
                ctx.parse_confidence,
                RouteSource::OnDeviceFast,
            ));
        }
        tracing::debug!(
            calls = ctx.parse.len(),
            confidence = ctx.parse_confidence,
            "Fast path below threshold"
        );
        Step::Advance(Stage::Model)
    }

    async fn model_stage(&self, ctx: &mut RouteContext<'_>) -> Step {
        let Some(model) = &self.model else {
            tracing::debug!("No on-device model configured");
            return Step::Advance(Stage::FallbackParse);
        };

        let output = match model.infer(ctx.messages, ctx.tools).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(adapter = model.name(), error = %e, "On-device model failed");
                ctx.model = Some(ModelAttempt::default());
                return Step::Advance(Stage::FallbackParse);
            }
        };

        let computed = self.scorer.score(&ctx.utterance, ctx.tools, &output.function_calls);
        let raw_count = output.function_calls.len();
        let valid_calls = retain_valid(output.function_calls, ctx.tools);
        let all_valid = valid_calls.len() == raw_count;
        let valid_calls = dedup_calls(valid_calls);

        let bar = ctx.thresholds.model_accept;
        let accepted = raw_count > 0
            && all_valid
            && (computed >= bar || output.confidence >= bar);

        if accepted {
            return Step::Done(ctx.finish(valid_calls, computed, RouteSource::OnDeviceModel));
        }

        tracing::debug!(
            adapter = model.name(),
            calls = raw_count,
            valid = valid_calls.len(),
            computed,
            reported = output.confidence,
            "Model output not accepted"
        );
        ctx.model = Some(ModelAttempt {
            valid_calls,
            reported_confidence: output.confidence,
        });
        Step::Advance(Stage::FallbackParse)
    }

    fn fallback_parse(&self, ctx: &RouteContext<'_>) -> Step {
        if !ctx.parse.is_empty() && ctx.parse_confidence >= ctx.thresholds.fallback_accept {
            return Step::Done(ctx.finish(
                ctx.parse.clone(),
                ctx.parse_confidence,
                RouteSource::OnDeviceFallback,
            ));
        }
        Step::Advance(Stage::Settle)
    }

    async fn settle(&self, ctx: &RouteContext<'_>) -> RoutingResult {
        let reported = ctx.model.as_ref().map_or(0.0, |m| m.reported_confidence);

        if reported < ctx.thresholds.settle {
            if let Some(cloud) = &self.cloud {
                match cloud.infer(ctx.messages, ctx.tools).await {
                    Ok(output) => {
                        let calls = dedup_calls(retain_valid(output.function_calls, ctx.tools));
                        if !calls.is_empty() {
                            let confidence = self.scorer.score(&ctx.utterance, ctx.tools, &calls);
                            return ctx.finish(calls, confidence, RouteSource::Cloud);
                        }
                        tracing::debug!(adapter = cloud.name(), "Cloud returned no valid calls");
                    }
                    Err(e) => {
                        tracing::warn!(
                            adapter = cloud.name(),
                            error = %e,
                            "Cloud escalation failed"
                        );
                    }
                }
            }
        }

        self.settle_locally(ctx)
    }

    /// Best on-device answer: the model's valid calls, else the parse.
    fn settle_locally(&self, ctx: &RouteContext<'_>) -> RoutingResult {
        let calls = ctx
            .model
            .as_ref()
            .map(|m| m.valid_calls.clone())
            .filter(|calls| !calls.is_empty())
            .unwrap_or_else(|| ctx.parse.clone());
        let confidence = self.scorer.score(&ctx.utterance, ctx.tools, &calls);
        ctx.finish(calls, confidence, RouteSource::OnDeviceFallback)
    }
}
