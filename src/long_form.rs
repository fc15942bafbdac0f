//! Five-session long-form script generator.

use crate::error::{Result, StudioError};
use crate::llm::GenerationClient;
use crate::models::{LongFormBody, LongFormScript};
use crate::prompts::PromptBuilder;
use tracing::info;

#[derive(Clone)]
pub struct LongFormGenerator {
    client: GenerationClient,
    prompts: PromptBuilder,
}

impl LongFormGenerator {
    pub fn new(client: GenerationClient, prompts: PromptBuilder) -> Self {
        Self { client, prompts }
    }

    pub async fn generate(&self, topic: &str) -> Result<LongFormScript> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StudioError::InvalidInput("topic is required".to_string()));
        }

        info!("📜 Generating long-form script for \"{}\"", topic);
        let body: LongFormBody = self
            .client
            .complete_structured(&self.prompts.long_form_script(topic))
            .await?;

        let chars: usize = body.sessions.labelled().iter().map(|(_, text)| text.chars().count()).sum();
        info!("✅ Long-form script ready ({} chars across 5 sessions)", chars);

        Ok(LongFormScript {
            topic: topic.to_string(),
            body,
        })
    }
}
