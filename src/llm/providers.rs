use super::{ChatMessage, ChatRequest, LLMConfig, LLMProvider, LLMResponse, LLM};
use crate::error::{Result, StudioError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

fn build_http_client(config: &LLMConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(|e| StudioError::Configuration(format!("cannot build HTTP client: {}", e)))
}

async fn error_for_status(provider: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(StudioError::Service(format!("{} API error {}: {}", provider, status, text)))
}

/// `response_format` body shared by the OpenAI-compatible providers
fn json_schema_format(request: &ChatRequest) -> Option<Value> {
    request.response_schema.as_ref().map(|schema| {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": "response",
                "strict": true,
                "schema": schema.to_json_schema(),
            }
        })
    })
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    total_tokens: u32,
}

impl ChatCompletionResponse {
    fn into_llm_response(self) -> LLMResponse {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        LLMResponse {
            content,
            tokens_used: self.usage.map(|u| u.total_tokens),
        }
    }
}

/// LMStudio provider implementation
pub struct LMStudioProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl LMStudioProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| StudioError::Configuration("LMStudio endpoint not configured".to_string()))?;
        url::Url::parse(endpoint)
            .map_err(|e| StudioError::Configuration(format!("invalid LMStudio endpoint {}: {}", endpoint, e)))?;

        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for LMStudioProvider {
    async fn chat(&self, request: ChatRequest) -> Result<LLMResponse> {
        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| StudioError::Configuration("LMStudio endpoint not configured".to_string()))?;

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            response_format: json_schema_format(&request),
            messages: request.messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to LMStudio at {}", endpoint);

        let response = self.client.post(endpoint).json(&body).send().await?;
        let response = error_for_status("LMStudio", response).await?;
        let completion: ChatCompletionResponse = response.json().await?;

        Ok(completion.into_llm_response())
    }

    async fn is_available(&self) -> bool {
        let endpoint = match &self.config.endpoint {
            Some(ep) => ep,
            None => return false,
        };

        let models_endpoint = endpoint.replace("/chat/completions", "/models");

        match self.client.get(&models_endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::LMStudio
    }
}

/// Gemini provider implementation
pub struct GeminiProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

impl GeminiProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(StudioError::Authentication);
        }

        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }

    fn base_url(&self) -> &str {
        self.config.endpoint.as_deref().unwrap_or(GEMINI_BASE_URL)
    }

    fn build_request(&self, request: ChatRequest) -> GeminiRequest {
        // Every message becomes its own part so the source text stays separate from the instruction
        let parts = request
            .messages
            .into_iter()
            .map(|msg| GeminiPart { text: Some(msg.content) })
            .collect();

        let (response_mime_type, response_schema) = match &request.response_schema {
            Some(schema) => (Some("application/json".to_string()), Some(schema.to_gemini())),
            None => (None, None),
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                response_mime_type,
                response_schema,
            },
        }
    }
}

#[async_trait]
impl LLM for GeminiProvider {
    async fn chat(&self, request: ChatRequest) -> Result<LLMResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(StudioError::Authentication)?;

        let body = self.build_request(request);
        let url = format!("{}/models/{}:generateContent", self.base_url(), self.config.model);

        debug!("Sending request to Gemini API (model {})", self.config.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let response = error_for_status("Gemini", response).await?;
        let gemini_response: GeminiResponse = response.json().await?;

        let content = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let tokens_used = gemini_response
            .usage_metadata
            .and_then(|u| u.total_token_count);

        Ok(LLMResponse { content, tokens_used })
    }

    async fn is_available(&self) -> bool {
        let Some(api_key) = &self.config.api_key else {
            return false;
        };
        let url = format!("{}/models", self.base_url());

        match self.client.get(&url).header("x-goog-api-key", api_key).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }
}

/// OpenAI provider implementation
pub struct OpenAIProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(StudioError::Authentication);
        }

        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }

    fn chat_url(&self) -> &str {
        self.config.endpoint.as_deref().unwrap_or(OPENAI_CHAT_URL)
    }
}

#[async_trait]
impl LLM for OpenAIProvider {
    async fn chat(&self, request: ChatRequest) -> Result<LLMResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(StudioError::Authentication)?;

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            response_format: json_schema_format(&request),
            messages: request.messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to OpenAI API");

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let response = error_for_status("OpenAI", response).await?;
        let completion: ChatCompletionResponse = response.json().await?;

        Ok(completion.into_llm_response())
    }

    async fn is_available(&self) -> bool {
        let Some(api_key) = &self.config.api_key else {
            return false;
        };
        let url = self.chat_url().replace("/chat/completions", "/models");

        match self.client.get(&url).bearer_auth(api_key).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::OpenAI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OutputSchema;

    fn gemini() -> GeminiProvider {
        let config = LLMConfig {
            api_key: Some("test-key".to_string()),
            ..LLMConfig::default()
        };
        GeminiProvider::new(config).unwrap()
    }

    #[test]
    fn test_gemini_structured_request_shape() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("Analyze this"), ChatMessage::user("script body")],
            response_schema: Some(OutputSchema::object(vec![("tone", OutputSchema::string("Mood"))])),
        };

        let body = serde_json::to_value(gemini().build_request(request)).unwrap();
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][0]["parts"][1]["text"], "script body");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_gemini_free_text_request_omits_schema() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("Write a script")],
            response_schema: None,
        };

        let body = serde_json::to_value(gemini().build_request(request)).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_json_schema_format_has_object_root() {
        let topics = OutputSchema::array_of(OutputSchema::object(vec![
            ("title", OutputSchema::string("Title")),
            ("viralityScore", OutputSchema::number_in("Score", 0.0, 100.0)),
        ]))
        .with_item_bounds(4, 4);
        let request = ChatRequest {
            messages: vec![ChatMessage::user("Suggest topics")],
            response_schema: Some(topics),
        };

        let format = json_schema_format(&request).unwrap();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["strict"], true);
        assert_eq!(format["json_schema"]["schema"]["type"], "object");
        assert_eq!(format["json_schema"]["schema"]["properties"]["items"]["type"], "array");
    }

    #[test]
    fn test_chat_completion_without_choices_is_empty() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(parsed.into_llm_response().content, "");
    }

    #[test]
    fn test_lmstudio_rejects_invalid_endpoint() {
        let config = LLMConfig {
            provider: LLMProvider::LMStudio,
            endpoint: Some("not a url".to_string()),
            ..LLMConfig::default()
        };
        assert!(matches!(
            LMStudioProvider::new(config),
            Err(StudioError::Configuration(_))
        ));
    }
}
