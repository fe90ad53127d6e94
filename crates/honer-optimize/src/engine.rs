use std::sync::Arc;

use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use llm::LLMProvider;

use honer_core::AiSettings;

use crate::OptimizeError;

/// A generation backend: one opaque text payload in, response text out.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn complete(&self, input: &str) -> Result<String, OptimizeError>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn complete(&self, input: &str) -> Result<String, OptimizeError> {
        (**self).complete(input).await
    }
}

fn map_backend(provider: &str) -> Result<LLMBackend, OptimizeError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(OptimizeError::Configuration(format!(
            "unknown provider: {other}"
        ))),
    }
}

/// Backend built on the `llm` crate, configured once from [`AiSettings`].
pub struct LlmBackend {
    provider: String,
    model: String,
    llm: Box<dyn LLMProvider>,
}

impl std::fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmBackend")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl LlmBackend {
    /// Fails with [`OptimizeError::Configuration`] before any network
    /// activity when the provider is unknown or the API key is missing.
    pub fn from_settings(settings: &AiSettings) -> Result<Self, OptimizeError> {
        let backend = map_backend(&settings.provider)?;

        if settings.model.trim().is_empty() {
            return Err(OptimizeError::Configuration("model is not set".to_string()));
        }
        if settings.provider != "ollama" && settings.api_key.trim().is_empty() {
            return Err(OptimizeError::Configuration(format!(
                "API key is missing for provider {}",
                settings.provider
            )));
        }

        let mut builder = LLMBuilder::new().backend(backend).model(&settings.model);

        if !settings.api_key.is_empty() {
            builder = builder.api_key(&settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| OptimizeError::Configuration(format!("build LLM: {e}")))?;

        Ok(Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            llm,
        })
    }
}

#[async_trait]
impl Backend for LlmBackend {
    async fn complete(&self, input: &str) -> Result<String, OptimizeError> {
        tracing::debug!(
            provider = %self.provider,
            model = %self.model,
            input_chars = input.chars().count(),
            "sending generation request"
        );

        let messages = vec![ChatMessage::user().content(input).build()];

        let response = self
            .llm
            .chat(&messages)
            .await
            .map_err(|e| OptimizeError::Backend(e.to_string()))?;

        // A reply without text is a valid, empty reply.
        Ok(response.text().unwrap_or_default())
    }
}
