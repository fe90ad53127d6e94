pub mod engine;
pub mod parse;

use honer_core::{template, AiSettings, OptimizationResult};

pub use engine::{Backend, LlmBackend};

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    /// Missing credential or unusable settings; no call was attempted.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The generation call failed (network, auth, rate limit or model error).
    #[error("generation failed: {0}")]
    Backend(String),
}

/// Render the meta-prompt, send it, and extract the four sections.
pub struct OptimizationClient<B> {
    backend: B,
}

impl<B: Backend> OptimizationClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Blank `criteria` are replaced by [`template::DEFAULT_CRITERIA`].
    /// Callers are expected not to pass a blank `prompt`.
    pub async fn optimize(
        &self,
        prompt: &str,
        criteria: &str,
    ) -> Result<OptimizationResult, OptimizeError> {
        let request = template::render_meta_prompt(prompt, criteria);

        let raw = self.backend.complete(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "optimize request failed");
            e
        })?;
        tracing::debug!(reply_chars = raw.chars().count(), "optimize reply received");

        let result = parse::parse_llm_output(&raw);
        if result.is_empty() {
            tracing::warn!("model reply contained none of the expected sections");
        } else {
            tracing::info!(
                has_scratchpad = !result.scratchpad.is_empty(),
                has_analysis = !result.analysis.is_empty(),
                has_optimized_prompt = !result.optimized_prompt.is_empty(),
                has_key_improvements = !result.key_improvements.is_empty(),
                "prompt optimized"
            );
        }
        Ok(result)
    }
}

/// Send an already optimized prompt and return the model's raw text.
pub struct GenerationClient<B> {
    backend: B,
}

impl<B: Backend> GenerationClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub async fn generate(&self, optimized_prompt: &str) -> Result<String, OptimizeError> {
        let text = self.backend.complete(optimized_prompt).await.map_err(|e| {
            tracing::warn!(error = %e, "generate request failed");
            e
        })?;
        tracing::info!(chars = text.chars().count(), "content generated");
        Ok(text)
    }
}

/// Run one optimization against the backend described by `settings`.
pub async fn optimize(
    settings: &AiSettings,
    prompt: &str,
    criteria: &str,
) -> Result<OptimizationResult, OptimizeError> {
    let backend = LlmBackend::from_settings(settings)?;
    tracing::info!(provider = %settings.provider, model = %settings.model, "optimizing prompt");
    OptimizationClient::new(backend).optimize(prompt, criteria).await
}

/// Run one generation pass against the backend described by `settings`.
pub async fn generate(settings: &AiSettings, optimized_prompt: &str) -> Result<String, OptimizeError> {
    let backend = LlmBackend::from_settings(settings)?;
    tracing::info!(provider = %settings.provider, model = %settings.model, "generating content");
    GenerationClient::new(backend).generate(optimized_prompt).await
}
