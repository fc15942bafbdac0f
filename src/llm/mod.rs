pub mod client;
pub mod providers;
pub mod schema;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::GenerationClient;
pub use schema::OutputSchema;

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProvider {
    LMStudio,
    Gemini,
    OpenAI,
}

impl LLMProvider {
    /// Whether calls to this provider need an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::LMStudio)
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(LLMProvider::Gemini),
            "openai" => Ok(LLMProvider::OpenAI),
            "lmstudio" | "lm-studio" => Ok(LLMProvider::LMStudio),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM provider to use
    pub provider: LLMProvider,

    /// API endpoint override (required for LMStudio)
    pub endpoint: Option<String>,

    /// Configured API key; the key store is consulted when absent
    pub api_key: Option<String>,

    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Gemini,
            endpoint: None,
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 8192,
            temperature: 0.7,
            timeout_seconds: 180, // long-form scripts take a while
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single generation request: ordered text parts plus an optional output shape
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub response_schema: Option<OutputSchema>,
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// Raw text returned by the provider; empty when it produced nothing
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LLM: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<LLMResponse>;
    async fn is_available(&self) -> bool;
    fn provider_type(&self) -> LLMProvider;
}

/// Create LLM instance based on configuration
pub fn create_llm(config: &LLMConfig) -> Result<Box<dyn LLM>> {
    match config.provider {
        LLMProvider::LMStudio => Ok(Box::new(providers::LMStudioProvider::new(config.clone())?)),
        LLMProvider::Gemini => Ok(Box::new(providers::GeminiProvider::new(config.clone())?)),
        LLMProvider::OpenAI => Ok(Box::new(providers::OpenAIProvider::new(config.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("Gemini".parse::<LLMProvider>().unwrap(), LLMProvider::Gemini);
        assert_eq!("lm-studio".parse::<LLMProvider>().unwrap(), LLMProvider::LMStudio);
        assert!("claude".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_gemini_without_key_is_rejected() {
        let config = LLMConfig::default();
        assert!(create_llm(&config).is_err());
    }

    #[test]
    fn test_lmstudio_needs_no_key() {
        let config = LLMConfig {
            provider: LLMProvider::LMStudio,
            endpoint: Some("http://localhost:1234/v1/chat/completions".to_string()),
            ..LLMConfig::default()
        };
        let llm = create_llm(&config).unwrap();
        assert_eq!(llm.provider_type(), LLMProvider::LMStudio);
        assert!(!LLMProvider::LMStudio.requires_api_key());
    }
}
