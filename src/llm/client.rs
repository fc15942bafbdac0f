//! Generation client: one prompt in, raw text or schema-checked value out.

use super::{create_llm, LLMConfig, LLM};
use crate::credential::{resolve_api_key, KeyStore};
use crate::error::{Result, StudioError};
use crate::prompts::Prompt;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Wraps a provider and enforces the response contract of each stage.
///
/// Holds no session state. Failures are surfaced as-is; nothing is retried.
#[derive(Clone)]
pub struct GenerationClient {
    llm: Option<Arc<dyn LLM>>,
}

impl GenerationClient {
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self { llm: Some(llm) }
    }

    /// Client with no credential; every call fails with `Authentication`.
    pub fn unauthenticated() -> Self {
        Self { llm: None }
    }

    /// Resolve the credential and build the configured provider.
    pub fn from_config(config: &LLMConfig, key_store: &KeyStore) -> Result<Self> {
        if !config.provider.requires_api_key() {
            let llm = create_llm(config)?;
            return Ok(Self::new(Arc::from(llm)));
        }

        match resolve_api_key(config.api_key.as_deref(), key_store)? {
            Some(api_key) => {
                let resolved = LLMConfig {
                    api_key: Some(api_key),
                    ..config.clone()
                };
                let llm = create_llm(&resolved)?;
                info!("Generation client ready ({:?}, model {})", config.provider, config.model);
                Ok(Self::new(Arc::from(llm)))
            }
            None => {
                warn!("No API key resolved for {:?}; generation calls will fail", config.provider);
                Ok(Self::unauthenticated())
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn is_available(&self) -> bool {
        match &self.llm {
            Some(llm) => llm.is_available().await,
            None => false,
        }
    }

    fn backend(&self) -> Result<&Arc<dyn LLM>> {
        self.llm.as_ref().ok_or(StudioError::Authentication)
    }

    /// Free-form completion. Fails with `EmptyResponse` when no text comes back.
    pub async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let llm = self.backend()?;

        debug!(
            "Calling {:?} for {} ({} chars of prompt)",
            llm.provider_type(),
            prompt.stage,
            prompt.len()
        );

        let response = llm.chat(prompt.to_request()).await?;
        let text = response.content.trim();
        if text.is_empty() {
            return Err(StudioError::EmptyResponse { stage: prompt.stage });
        }

        debug!(
            "{} completed ({} chars, tokens: {:?})",
            prompt.stage,
            text.len(),
            response.tokens_used
        );
        Ok(text.to_string())
    }

    /// Structured completion validated against the prompt's output schema.
    pub async fn complete_structured<T: DeserializeOwned>(&self, prompt: &Prompt) -> Result<T> {
        let schema = prompt.schema.as_ref().ok_or_else(|| {
            StudioError::Configuration(format!("{} declares no output schema", prompt.stage))
        })?;

        let text = self.complete(prompt).await?;
        let violation = |reason: String| StudioError::SchemaViolation {
            stage: prompt.stage,
            reason,
        };

        let cleaned = clean_llm_response(&text);
        let value: serde_json::Value =
            serde_json::from_str(&cleaned).map_err(|e| violation(format!("malformed JSON: {}", e)))?;
        let value = schema.unwrap_root(value);
        schema.validate(&value).map_err(violation)?;

        serde_json::from_value(value).map_err(|e| violation(e.to_string()))
    }
}

/// Strip Markdown code fences some models wrap around JSON output.
pub fn clean_llm_response(content: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*(.*?)\s*```$").expect("fence pattern is valid")
    });

    let content = content.trim();
    match fence.captures(content) {
        Some(captures) => captures[1].trim().to_string(),
        None => content.to_string(),
    }
}
