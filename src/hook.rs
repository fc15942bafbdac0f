//! Opening-30-seconds hook script generator.

use crate::error::{Result, StudioError};
use crate::llm::GenerationClient;
use crate::models::{HookScript, HookScriptRequest, HookSections};
use crate::prompts::PromptBuilder;
use tracing::info;

#[derive(Clone)]
pub struct HookScriptGenerator {
    client: GenerationClient,
    prompts: PromptBuilder,
}

impl HookScriptGenerator {
    pub fn new(client: GenerationClient, prompts: PromptBuilder) -> Self {
        Self { client, prompts }
    }

    pub async fn generate(&self, request: HookScriptRequest) -> Result<HookScript> {
        let request = normalize(request)?;
        info!("🎣 Generating hook script for \"{}\"", request.topic);

        let sections: HookSections = self
            .client
            .complete_structured(&self.prompts.hook_script(&request))
            .await?;

        Ok(HookScript {
            topic: request.topic,
            target_audience: request.target_audience,
            tone: request.tone,
            sections,
        })
    }
}

/// Trim fields, drop blank key points, reject a blank topic or audience
fn normalize(mut request: HookScriptRequest) -> Result<HookScriptRequest> {
    request.topic = request.topic.trim().to_string();
    request.target_audience = request.target_audience.trim().to_string();

    if request.topic.is_empty() {
        return Err(StudioError::InvalidInput("topic is required".to_string()));
    }
    if request.target_audience.is_empty() {
        return Err(StudioError::InvalidInput("target audience is required".to_string()));
    }

    request.key_points = request
        .key_points
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HookTone;

    fn request(topic: &str, audience: &str, points: &[&str]) -> HookScriptRequest {
        HookScriptRequest {
            topic: topic.to_string(),
            target_audience: audience.to_string(),
            tone: HookTone::Friendly,
            key_points: points.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_normalize_drops_blank_points() {
        let normalized = normalize(request(" Budgeting ", "students", &["rent", "  ", ""])).unwrap();
        assert_eq!(normalized.topic, "Budgeting");
        assert_eq!(normalized.key_points, vec!["rent".to_string()]);
    }

    #[test]
    fn test_normalize_requires_topic_and_audience() {
        assert!(matches!(
            normalize(request("  ", "students", &[])),
            Err(StudioError::InvalidInput(_))
        ));
        assert!(matches!(
            normalize(request("Budgeting", "", &[])),
            Err(StudioError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_without_credential_fails() {
        let generator = HookScriptGenerator::new(GenerationClient::unauthenticated(), PromptBuilder::default());
        let err = generator
            .generate(request("Budgeting", "students", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Authentication));
    }
}
