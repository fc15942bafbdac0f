use crate::error::{Result, StudioError};
use crate::llm::{LLMConfig, LLMProvider};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for Script Studio
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Generation service settings
    pub llm: LLMConfig,

    /// Workflow tuning
    pub workflow: WorkflowConfig,

    /// Credential storage
    pub credentials: CredentialConfig,

    /// HTTP API settings
    pub server: ServerConfig,

    /// Logging and export settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Number of topic ideas requested after style analysis
    pub topic_count: usize,

    /// Minimum short-form recommendations per conversion
    pub short_form_min: usize,

    /// Maximum short-form recommendations per conversion
    pub short_form_max: usize,

    /// Language generated text should be written in
    pub output_language: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            topic_count: 4,
            short_form_min: 3,
            short_form_max: 5,
            output_language: "Korean".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// JSON key-value file holding a saved API key
    pub key_store_path: PathBuf,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            key_store_path: config_home().join("keys.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP API to
    pub host: String,

    /// Port for the HTTP API
    pub port: u16,

    /// Allow cross-origin browser access
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,

    /// Directory exports are written to when no explicit path is given
    pub export_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            export_dir: PathBuf::from("./scripts"),
        }
    }
}

fn config_home() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config/script-studio"),
        None => PathBuf::from(".script-studio"),
    }
}

impl Config {
    /// Load configuration from the first config file found, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("script-studio.toml"),
            PathBuf::from("config/script-studio.toml"),
            config_home().join("config.toml"),
            PathBuf::from("/etc/script-studio/config.toml"),
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path).map_err(|e| {
            StudioError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&config_str).map_err(|e| {
            StudioError::Configuration(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.apply_env_overrides();
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("SCRIPT_STUDIO_API_KEY") {
            self.llm.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("SCRIPT_STUDIO_MODEL") {
            self.llm.model = model;
        }

        if let Ok(provider) = std::env::var("SCRIPT_STUDIO_PROVIDER") {
            match provider.parse::<LLMProvider>() {
                Ok(provider) => self.llm.provider = provider,
                Err(e) => tracing::warn!("Ignoring SCRIPT_STUDIO_PROVIDER: {}", e),
            }
        }

        if let Ok(language) = std::env::var("SCRIPT_STUDIO_LANGUAGE") {
            self.workflow.output_language = language;
        }

        if let Ok(log_level) = std::env::var("SCRIPT_STUDIO_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| StudioError::Configuration(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(StudioError::Configuration(msg.to_string()));

        if self.workflow.topic_count == 0 {
            return invalid("topic_count must be greater than 0");
        }

        if self.workflow.short_form_min == 0 || self.workflow.short_form_min > self.workflow.short_form_max {
            return invalid("short_form_min must be between 1 and short_form_max");
        }

        if self.workflow.output_language.trim().is_empty() {
            return invalid("output_language must not be empty");
        }

        if self.llm.model.trim().is_empty() {
            return invalid("llm.model must not be empty");
        }

        if self.llm.timeout_seconds == 0 {
            return invalid("llm.timeout_seconds must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return invalid("llm.temperature must be between 0.0 and 2.0");
        }

        match self.llm.provider {
            LLMProvider::LMStudio => {
                if self.llm.endpoint.is_none() {
                    return invalid("llm.endpoint required for LMStudio provider");
                }
            }
            LLMProvider::Gemini | LLMProvider::OpenAI => {}
        }

        if let Some(endpoint) = &self.llm.endpoint {
            if let Err(e) = url::Url::parse(endpoint) {
                return Err(StudioError::Configuration(format!(
                    "llm.endpoint is not a valid URL ({}): {}",
                    endpoint, e
                )));
            }
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Script Studio Configuration:\n\
            - Provider: {:?}\n\
            - Model: {}\n\
            - API Key Configured: {}\n\
            - Output Language: {}\n\
            - Topics Per Analysis: {}\n\
            - Short-form Recommendations: {}-{}\n\
            - Key Store: {}",
            self.llm.provider,
            self.llm.model,
            self.llm.api_key.is_some(),
            self.workflow.output_language,
            self.workflow.topic_count,
            self.workflow.short_form_min,
            self.workflow.short_form_max,
            self.credentials.key_store_path.display()
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_provider(mut self, provider: LLMProvider) -> Self {
        self.config.llm.provider = provider;
        self
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.config.llm.endpoint = Some(endpoint);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.config.llm.model = model;
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.llm.api_key = Some(api_key);
        self
    }

    pub fn with_topic_count(mut self, count: usize) -> Self {
        self.config.workflow.topic_count = count;
        self
    }

    pub fn with_language(mut self, language: String) -> Self {
        self.config.workflow.output_language = language;
        self
    }

    pub fn with_key_store(mut self, path: PathBuf) -> Self {
        self.config.credentials.key_store_path = path;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
