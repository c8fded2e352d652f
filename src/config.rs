//! Router configuration.
//!
//! Everything here is read-only once a [`crate::HybridRouter`] is built.
//! Values come from (in order): built-in defaults, an optional TOML file,
//! and the process environment for the cloud credential.
//!
//! ```toml
//! [thresholds]
//! fastpath_accept = 0.90
//! fallback_accept = 0.80
//! model_accept = 0.65
//! confidence_floor = 0.85
//! settle = 0.95
//!
//! [model]
//! ollama_url = "http://127.0.0.1:11434"
//! model = "qwen3:0.6b"
//!
//! [cloud]
//! model = "gemini-2.5-flash"
//! api_key_env = "GEMINI_API_KEY"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default Ollama endpoint for the on-device model.
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default on-device model name.
const DEFAULT_MODEL: &str = "qwen3:0.6b";

/// Default cloud model.
const DEFAULT_CLOUD_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the cloud credential.
const DEFAULT_CLOUD_KEY_ENV: &str = "GEMINI_API_KEY";

// ── Thresholds ───────────────────────────────────────────────────

/// Acceptance thresholds for the four routing stages.
///
/// Invariant: `fastpath_accept >= fallback_accept >= model_accept`, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Deterministic parse accepted without invoking the model.
    pub fastpath_accept: f64,
    /// On-device model output accepted.
    pub model_accept: f64,
    /// Deterministic re-parse accepted after the model fell short.
    pub fallback_accept: f64,
    /// Minimum reported confidence for any non-empty result.
    pub confidence_floor: f64,
    /// Model self-reported confidence at which the router settles locally
    /// instead of escalating to the cloud.
    pub settle: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fastpath_accept: 0.90,
            model_accept: 0.65,
            fallback_accept: 0.80,
            confidence_floor: 0.85,
            settle: 0.95,
        }
    }
}

impl Thresholds {
    /// Check bounds and the stage ordering invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("fastpath_accept", self.fastpath_accept),
            ("model_accept", self.model_accept),
            ("fallback_accept", self.fallback_accept),
            ("confidence_floor", self.confidence_floor),
            ("settle", self.settle),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        if self.fastpath_accept < self.fallback_accept {
            return Err(ConfigError::Ordering(format!(
                "fastpath_accept ({}) < fallback_accept ({})",
                self.fastpath_accept, self.fallback_accept
            )));
        }
        if self.fallback_accept < self.model_accept {
            return Err(ConfigError::Ordering(format!(
                "fallback_accept ({}) < model_accept ({})",
                self.fallback_accept, self.model_accept
            )));
        }
        Ok(())
    }

    /// Copy with a per-request model-accept override, clamped so the
    /// ordering invariant still holds. Never panics, even on unvalidated
    /// thresholds (a NaN bound is ignored).
    pub fn with_model_accept(self, threshold: f64) -> Self {
        Self {
            model_accept: threshold.max(0.0).min(self.fallback_accept),
            ..self
        }
    }

    /// Reported confidence for a non-empty result.
    pub fn floored(&self, confidence: f64) -> f64 {
        confidence.max(self.confidence_floor).min(1.0)
    }
}

// ── Scoring weights ──────────────────────────────────────────────

/// Weights of the composite confidence formula. Hand-tuned, not derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub schema: f64,
    pub coverage: f64,
    pub precision: f64,
    /// Precision hint applied when calls exceed `intents + over_generation_margin`.
    pub over_generation_penalty: f64,
    pub over_generation_margin: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            schema: 0.50,
            coverage: 0.35,
            precision: 0.15,
            over_generation_penalty: 0.7,
            over_generation_margin: 1,
        }
    }
}

// ── Adapters ─────────────────────────────────────────────────────

/// On-device model (Ollama) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub enabled: bool,
    pub ollama_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: 10,
        }
    }
}

/// Cloud model (Gemini) settings. The key itself never lives in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_CLOUD_MODEL.into(),
            api_key_env: DEFAULT_CLOUD_KEY_ENV.into(),
            timeout_secs: 30,
        }
    }
}

impl CloudConfig {
    /// Credential from the process environment; blank values count as absent.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ── Top-level config ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub thresholds: Thresholds,
    pub scoring: ScoringWeights,
    pub model: ModelConfig,
    pub cloud: CloudConfig,
}

impl RouterConfig {
    /// `<platform config dir>/edgeroute/config.toml`, when resolvable.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "edgeroute")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.thresholds.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(p) if p.is_file() => Self::load(&p),
            _ => Ok(Self::default()),
        }
    }
}
