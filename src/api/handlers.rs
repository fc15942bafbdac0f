//! API request handlers

use serde_json::Value;

use super::models::{ConvertRequest, ExportResponse, HookRequest};
use crate::error::{Result, StudioError};
use crate::export;
use crate::models::{HookScript, LongFormScript, ScriptArtifact, TopicCandidate, TopicId};
use crate::shorts::{Conversion, ConversionId, SelectedShort};
use crate::state::SessionState;
use crate::studio::Studio;
use crate::versions::ScriptVersion;

/// Handle health check requests
pub async fn health_check(studio: &Studio) -> Value {
    serde_json::json!({
        "status": "healthy",
        "service": "script-studio",
        "version": env!("CARGO_PKG_VERSION"),
        "authenticated": studio.client().is_authenticated(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
}

pub async fn session(studio: &Studio) -> SessionState {
    studio.script.snapshot().await
}

pub async fn analyze(studio: &Studio, script: &str) -> Result<Vec<TopicCandidate>> {
    studio.script.analyze(script).await
}

pub async fn select_topic(studio: &Studio, topic_id: u64) -> Result<ScriptArtifact> {
    studio.script.select_topic(TopicId(topic_id)).await
}

pub async fn refine_script(studio: &Studio, instruction: &str) -> Result<ScriptVersion> {
    studio.script.refine(instruction).await
}

pub async fn edit_script(studio: &Studio, content: &str) -> Result<ScriptVersion> {
    studio.script.direct_edit(content).await
}

pub async fn select_script_version(studio: &Studio, index: usize) -> Result<ScriptVersion> {
    studio.script.select_version(index).await
}

pub async fn export_script(studio: &Studio) -> Result<ExportResponse> {
    let snapshot = studio.script.snapshot().await;
    let draft = snapshot
        .draft
        .as_ref()
        .ok_or_else(|| StudioError::InvalidInput("no script has been generated yet".to_string()))?;

    Ok(ExportResponse {
        text: export::script_document(&draft.artifact, draft.current_content()),
        file_name: export::file_name(&draft.artifact.title, "md"),
    })
}

pub async fn back(studio: &Studio) -> Result<SessionState> {
    studio.script.back().await?;
    Ok(studio.script.snapshot().await)
}

pub async fn reset(studio: &Studio) -> SessionState {
    studio.reset().await;
    studio.script.snapshot().await
}

pub async fn convert(studio: &Studio, request: ConvertRequest) -> Result<Conversion> {
    match request.long_form {
        Some(text) => studio.shorts.convert(&text, None).await,
        None => studio.convert_current_script().await,
    }
}

pub async fn list_conversions(studio: &Studio) -> Vec<Conversion> {
    studio.shorts.list().await
}

pub async fn get_conversion(studio: &Studio, id: u64) -> Result<Conversion> {
    let id = ConversionId(id);
    studio.shorts.get(id).await.ok_or_else(|| StudioError::NotFound {
        kind: "conversion",
        id: id.to_string(),
    })
}

pub async fn remove_conversion(studio: &Studio, id: u64) -> Result<()> {
    studio.shorts.remove(ConversionId(id)).await
}

pub async fn select_recommendation(studio: &Studio, id: u64, index: usize) -> Result<SelectedShort> {
    studio.shorts.select(ConversionId(id), index).await
}

pub async fn refine_short(studio: &Studio, id: u64, instruction: &str) -> Result<ScriptVersion> {
    studio.shorts.refine(ConversionId(id), instruction).await
}

pub async fn edit_short(studio: &Studio, id: u64, content: &str) -> Result<ScriptVersion> {
    studio.shorts.direct_edit(ConversionId(id), content).await
}

pub async fn select_short_version(studio: &Studio, id: u64, index: usize) -> Result<ScriptVersion> {
    studio.shorts.select_version(ConversionId(id), index).await
}

pub async fn export_short(studio: &Studio, id: u64) -> Result<ExportResponse> {
    let conversion = get_conversion(studio, id).await?;
    let title = conversion
        .selected
        .as_ref()
        .map(|s| s.title.clone())
        .unwrap_or_default();

    Ok(ExportResponse {
        text: studio.shorts.export(ConversionId(id)).await?,
        file_name: export::file_name(&title, "txt"),
    })
}

pub async fn hook_script(studio: &Studio, request: HookRequest) -> Result<HookScript> {
    studio.hooks.generate(request).await
}

pub async fn long_form(studio: &Studio, topic: &str) -> Result<LongFormScript> {
    studio.long_form.generate(topic).await
}
