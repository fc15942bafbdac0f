//! Long-form to short-form conversion sessions.
//!
//! Each conversion owns its recommendations and at most one selected
//! recommendation with its own version history. Re-selecting replaces the
//! previous selection and its history.

use crate::error::{Result, StudioError};
use crate::export;
use crate::llm::GenerationClient;
use crate::models::{ShortFormRecommendation, TopicId};
use crate::prompts::{Prompt, PromptBuilder};
use crate::versions::{ScriptVersion, VersionStore, MANUAL_EDIT_INSTRUCTION};
use crate::workflow::run_detached;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const SHORT_FORM_FORMAT: &str = "30-60 second YouTube Shorts script";

/// Identifier of one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionId(pub u64);

impl fmt::Display for ConversionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conversion-{}", self.0)
    }
}

/// The recommendation the user is working on
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedShort {
    pub recommendation_index: usize,
    pub title: String,
    pub versions: VersionStore,
    pub refine_in_flight: Option<u64>,
}

impl SelectedShort {
    pub fn current_content(&self) -> &str {
        self.versions.current_content("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub id: ConversionId,
    pub source_text: String,
    /// Topic of the full script this was cut from, if any
    pub origin_topic: Option<TopicId>,
    pub recommendations: Vec<ShortFormRecommendation>,
    pub selected: Option<SelectedShort>,
}

#[derive(Debug, Default)]
struct ShortFormState {
    epoch: u64,
    next_id: u64,
    next_request: u64,
    conversions: BTreeMap<ConversionId, Conversion>,
}

impl ShortFormState {
    fn conversion_mut(&mut self, id: ConversionId) -> Result<&mut Conversion> {
        self.conversions.get_mut(&id).ok_or_else(|| not_found(id))
    }

    fn selected_mut(&mut self, id: ConversionId) -> Result<&mut SelectedShort> {
        self.conversion_mut(id)?
            .selected
            .as_mut()
            .ok_or_else(|| StudioError::InvalidInput(format!("no recommendation selected for {}", id)))
    }
}

fn not_found(id: ConversionId) -> StudioError {
    StudioError::NotFound {
        kind: "conversion",
        id: id.to_string(),
    }
}

/// Converts long-form scripts into short-form candidates and edits them
#[derive(Clone)]
pub struct ShortFormWorkflow {
    client: GenerationClient,
    prompts: PromptBuilder,
    min_recommendations: usize,
    max_recommendations: usize,
    state: Arc<RwLock<ShortFormState>>,
}

impl ShortFormWorkflow {
    pub fn new(client: GenerationClient, prompts: PromptBuilder, min: usize, max: usize) -> Self {
        Self {
            client,
            prompts,
            min_recommendations: min,
            max_recommendations: max,
            state: Arc::new(RwLock::new(ShortFormState::default())),
        }
    }

    /// Ask for short-form candidates cut from `long_form`; nothing is stored on failure.
    pub async fn convert(&self, long_form: &str, origin_topic: Option<TopicId>) -> Result<Conversion> {
        let source = long_form.trim();
        if source.is_empty() {
            return Err(StudioError::InvalidInput("long-form script is empty".to_string()));
        }

        let epoch = self.state.read().await.epoch;
        info!("✂️  Converting long-form script ({} chars) to short-form", source.len());

        let prompt = self
            .prompts
            .short_form_conversion(source, self.min_recommendations, self.max_recommendations);
        let recommendations: Vec<ShortFormRecommendation> = match self.client.complete_structured(&prompt).await {
            Ok(recommendations) => recommendations,
            Err(e) => {
                warn!("Short-form conversion failed: {}", e);
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!("Dropping conversion that finished after a reset");
            return Err(StudioError::StaleResponse);
        }

        state.next_id += 1;
        let conversion = Conversion {
            id: ConversionId(state.next_id),
            source_text: source.to_string(),
            origin_topic,
            recommendations,
            selected: None,
        };
        state.conversions.insert(conversion.id, conversion.clone());

        info!("✅ {} short-form ideas ready ({})", conversion.recommendations.len(), conversion.id);
        Ok(conversion)
    }

    /// Start editing one recommendation, seeded with its script
    pub async fn select(&self, id: ConversionId, recommendation_index: usize) -> Result<SelectedShort> {
        let mut state = self.state.write().await;
        let conversion = state.conversion_mut(id)?;

        let recommendation = conversion
            .recommendations
            .get(recommendation_index)
            .ok_or_else(|| StudioError::NotFound {
                kind: "recommendation",
                id: format!("{}#{}", id, recommendation_index),
            })?;

        let selected = SelectedShort {
            recommendation_index,
            title: recommendation.title.clone(),
            versions: VersionStore::seeded(recommendation.script.clone()),
            refine_in_flight: None,
        };

        if let Some(previous) = conversion.selected.replace(selected.clone()) {
            info!(
                "Replacing selection {} ({} versions discarded)",
                previous.recommendation_index,
                previous.versions.len()
            );
        }
        Ok(selected)
    }

    pub async fn refine(&self, id: ConversionId, instruction: &str) -> Result<ScriptVersion> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(StudioError::InvalidInput("refinement instruction is empty".to_string()));
        }

        let (epoch, request, current, history) = {
            let mut state = self.state.write().await;
            state.next_request += 1;
            let (epoch, request) = (state.epoch, state.next_request);

            let selected = state.selected_mut(id)?;
            if selected.refine_in_flight.is_some() {
                return Err(StudioError::Busy(id.to_string()));
            }
            selected.refine_in_flight = Some(request);

            let history: Vec<String> = selected
                .versions
                .instruction_history()
                .into_iter()
                .map(str::to_string)
                .collect();
            (epoch, request, selected.current_content().to_string(), history)
        };

        info!("🛠️  Refining {}: {}", id, instruction);
        let history: Vec<&str> = history.iter().map(String::as_str).collect();
        let prompt = self
            .prompts
            .refinement(&current, instruction, &history, SHORT_FORM_FORMAT);

        let this = self.clone();
        let instruction = instruction.to_string();
        run_detached(async move { this.finish_refine(id, epoch, request, prompt, instruction).await }).await
    }

    async fn finish_refine(
        &self,
        id: ConversionId,
        epoch: u64,
        request: u64,
        prompt: Prompt,
        instruction: String,
    ) -> Result<ScriptVersion> {
        let outcome = self.client.complete(&prompt).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            return Err(StudioError::StaleResponse);
        }
        let selected = match state.selected_mut(id) {
            Ok(selected) if selected.refine_in_flight == Some(request) => selected,
            _ => return Err(StudioError::StaleResponse),
        };
        selected.refine_in_flight = None;

        match outcome {
            Ok(content) => Ok(selected.versions.append(content, instruction).clone()),
            Err(e) => {
                warn!("Short-form refinement failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn direct_edit(&self, id: ConversionId, content: &str) -> Result<ScriptVersion> {
        if content.trim().is_empty() {
            return Err(StudioError::InvalidInput("edited script is empty".to_string()));
        }

        let mut state = self.state.write().await;
        let selected = state.selected_mut(id)?;
        if selected.refine_in_flight.is_some() {
            return Err(StudioError::Busy(id.to_string()));
        }
        Ok(selected.versions.append(content, MANUAL_EDIT_INSTRUCTION).clone())
    }

    pub async fn select_version(&self, id: ConversionId, index: usize) -> Result<ScriptVersion> {
        let mut state = self.state.write().await;
        let selected = state.selected_mut(id)?;
        selected.versions.select_version(index).cloned()
    }

    pub async fn get(&self, id: ConversionId) -> Option<Conversion> {
        self.state.read().await.conversions.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<Conversion> {
        self.state.read().await.conversions.values().cloned().collect()
    }

    pub async fn remove(&self, id: ConversionId) -> Result<()> {
        self.state
            .write()
            .await
            .conversions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    /// Drop every conversion; responses still in flight are discarded
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.epoch += 1;
        let dropped = state.conversions.len();
        state.conversions.clear();
        debug!("Short-form sessions cleared ({} dropped)", dropped);
    }

    /// Title and displayed version of the selection
    pub async fn export(&self, id: ConversionId) -> Result<String> {
        let state = self.state.read().await;
        let conversion = state.conversions.get(&id).ok_or_else(|| not_found(id))?;
        let selected = conversion
            .selected
            .as_ref()
            .ok_or_else(|| StudioError::InvalidInput(format!("no recommendation selected for {}", id)))?;
        Ok(export::short_form(&selected.title, selected.current_content()))
    }
}
