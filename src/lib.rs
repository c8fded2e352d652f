//! Staged intent routing for on-device assistants.
//!
//! An utterance plus a tool catalog goes in; validated function calls come
//! out, tagged with a confidence and the stage that produced them:
//!
//! | Stage | Engine | Source |
//! |---|---|---|
//! | fast path | keyword/regex parser | `on-device-fast` |
//! | model | local Ollama model | `on-device-model` |
//! | fallback parse | keyword/regex parser, lower bar | `on-device-fallback` |
//! | settle | Gemini, or best local answer | `cloud` / `on-device-fallback` |
//!
//! ```no_run
//! # async fn demo() {
//! use edgeroute::{catalog::builtin_tools, Message};
//!
//! let result = edgeroute::route(
//!     &[Message::user("What is the weather in San Francisco?")],
//!     &builtin_tools(),
//!     None,
//! )
//! .await;
//! println!("{} via {}", result.function_calls.len(), result.source);
//! # }
//! ```

pub mod actions;
pub mod adapters;
pub mod catalog;
pub mod confidence;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod router;
pub mod types;
pub mod validate;

pub use config::{RouterConfig, Thresholds};
pub use error::ConfigError;
pub use orchestrator::HybridRouter;
pub use types::{Message, Role, RouteSource, RoutingResult, ToolCall, ToolSpec};

use std::sync::OnceLock;

static DEFAULT_ROUTER: OnceLock<HybridRouter> = OnceLock::new();

fn default_router() -> &'static HybridRouter {
    DEFAULT_ROUTER.get_or_init(|| {
        let config = RouterConfig::load_or_default(None).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to built-in router config");
            RouterConfig::default()
        });
        HybridRouter::from_config(&config).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Adapters unavailable, routing on-device only");
            HybridRouter::with_adapters(config.thresholds, config.scoring, None, None)
        })
    })
}

/// Route with the process-wide router, built lazily from the default
/// config location and the environment on first use.
pub async fn route(
    messages: &[Message],
    tools: &[ToolSpec],
    confidence_threshold: Option<f64>,
) -> RoutingResult {
    default_router()
        .route(messages, tools, confidence_threshold)
        .await
}
