//! Application root: every workflow wired to one generation client.

use crate::config::{Config, WorkflowConfig};
use crate::credential::KeyStore;
use crate::error::{Result, StudioError};
use crate::hook::HookScriptGenerator;
use crate::llm::GenerationClient;
use crate::long_form::LongFormGenerator;
use crate::prompts::PromptBuilder;
use crate::shorts::{Conversion, ShortFormWorkflow};
use crate::workflow::ScriptWorkflow;
use tracing::info;

#[derive(Clone)]
pub struct Studio {
    client: GenerationClient,
    pub script: ScriptWorkflow,
    pub shorts: ShortFormWorkflow,
    pub hooks: HookScriptGenerator,
    pub long_form: LongFormGenerator,
}

impl Studio {
    /// Resolve the credential and build every workflow from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let key_store = KeyStore::new(config.credentials.key_store_path.clone());
        let client = GenerationClient::from_config(&config.llm, &key_store)?;
        Ok(Self::with_client(client, &config.workflow))
    }

    pub fn with_client(client: GenerationClient, workflow: &WorkflowConfig) -> Self {
        let prompts = PromptBuilder::new(workflow.output_language.clone());
        info!(
            "🎬 Studio ready (language: {}, topics: {}, authenticated: {})",
            workflow.output_language,
            workflow.topic_count,
            client.is_authenticated()
        );

        Self {
            script: ScriptWorkflow::new(client.clone(), prompts.clone(), workflow.topic_count),
            shorts: ShortFormWorkflow::new(
                client.clone(),
                prompts.clone(),
                workflow.short_form_min,
                workflow.short_form_max,
            ),
            hooks: HookScriptGenerator::new(client.clone(), prompts.clone()),
            long_form: LongFormGenerator::new(client.clone(), prompts),
            client,
        }
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    /// Start a short-form conversion from the displayed full script
    pub async fn convert_current_script(&self) -> Result<Conversion> {
        let (content, topic) = self
            .script
            .session()
            .read(|state| {
                (
                    state.current_content().map(str::to_string),
                    state.selected_topic,
                )
            })
            .await;

        let content = content
            .ok_or_else(|| StudioError::InvalidInput("no script has been generated yet".to_string()))?;
        self.shorts.convert(&content, topic).await
    }

    /// Clear the script session and all short-form sessions
    pub async fn reset(&self) {
        self.script.reset().await;
        self.shorts.reset().await;
        info!("🧹 Session reset");
    }
}
