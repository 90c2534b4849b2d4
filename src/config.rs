//! Configuration for the invoice pipeline.
//!
//! All behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Callers set only what they care about and rely
//! on documented defaults for the rest.
//!
//! The rendering resolution is deliberately *not* here: it is the fixed
//! [`crate::pipeline::normalize::RENDER_DPI`], because the rendered page is
//! the model's input and must be reproducible across uploads rather than
//! tunable per run.

use std::fmt;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::pipeline::extract::ExtractionModel;

/// Configuration for invoice processing.
///
/// # Example
/// ```rust
/// use invoice2ledger::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gpt-4o")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Model identifier, e.g. "gpt-4o". If None, uses the provider default.
    pub model: Option<String>,

    /// Provider name (e.g. "openai", "anthropic", "ollama"). If None along
    /// with `model_client`, the provider is auto-detected from environment
    /// API keys.
    pub provider_name: Option<String>,

    /// Pre-constructed extraction model. Takes precedence over
    /// `provider_name`; the seam used to substitute a fake in tests.
    pub model_client: Option<Arc<dyn ExtractionModel>>,

    /// Sampling temperature for the extraction completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is printed on the
    /// page — exactly what you want when transcribing amounts.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 500.
    ///
    /// The requested output is one small JSON object; 500 leaves headroom
    /// for models that insist on wrapping it in prose.
    pub max_tokens: usize,

    /// Time bound on the single model call, in seconds. Default: 60.
    ///
    /// On expiry the attempt is abandoned — no retry — and the placeholder
    /// record takes over. A stuck provider must never hold a worker.
    pub api_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            model_client: None,
            temperature: 0.1,
            max_tokens: 500,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field(
                "model_client",
                &self.model_client.as_ref().map(|_| "<dyn ExtractionModel>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model_client(mut self, client: Arc<dyn ExtractionModel>) -> Self {
        self.config.model_client = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(PipelineError::InvalidConfig(
                "api_timeout_secs must be >= 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_tokens must be >= 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.api_timeout_secs, 60);
        assert!(config.model.is_none());
        assert!(config.model_client.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let config = PipelineConfig::builder()
            .temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(config.temperature, 2.0);

        let config = PipelineConfig::builder()
            .temperature(-1.0)
            .build()
            .unwrap();
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(PipelineConfig::builder().api_timeout_secs(0).build().is_err());
        assert!(PipelineConfig::builder().max_tokens(0).build().is_err());
    }
}
