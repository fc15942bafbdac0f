mod common;

use common::*;
use script_studio::config::WorkflowConfig;
use script_studio::shorts::ConversionId;
use script_studio::{PromptBuilder, ShortFormWorkflow, Studio, StudioError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

const LONG_FORM: &str = "# Five habits\n\nA long script about five habits that compound over a year.";

fn shorts(llm: &Arc<ScriptedLLM>) -> ShortFormWorkflow {
    ShortFormWorkflow::new(client(llm), PromptBuilder::new("English"), 3, 5)
}

#[tokio::test]
async fn test_convert_stores_recommendations() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(4))]);
    let wf = shorts(&llm);

    let conversion = wf.convert(LONG_FORM, None).await.unwrap();

    assert_eq!(conversion.recommendations.len(), 4);
    assert!(conversion.selected.is_none());
    assert_eq!(wf.list().await.len(), 1);
    assert!(llm.request_text(0).contains("five habits that compound"));
}

#[tokio::test]
async fn test_too_few_recommendations_store_nothing() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(2))]);
    let wf = shorts(&llm);

    let err = wf.convert(LONG_FORM, None).await.unwrap_err();
    assert!(matches!(err, StudioError::SchemaViolation { .. }));
    assert!(wf.list().await.is_empty());
}

#[tokio::test]
async fn test_too_many_recommendations_store_nothing() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(6))]);
    let wf = shorts(&llm);

    let err = wf.convert(LONG_FORM, None).await.unwrap_err();
    match err {
        StudioError::SchemaViolation { reason, .. } => assert!(reason.contains("at most 5")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(wf.list().await.is_empty());
}

#[tokio::test]
async fn test_select_refine_and_edit() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(3))]);
    let wf = shorts(&llm);
    let id = wf.convert(LONG_FORM, None).await.unwrap().id;

    let selected = wf.select(id, 1).await.unwrap();
    assert_eq!(selected.title, "Short 1");
    assert_eq!(selected.current_content(), "Short script 1");

    llm.push(text("Punchier short"));
    let refined = wf.refine(id, "punchier hook").await.unwrap();
    assert_eq!(refined.version_index, 1);

    let edited = wf.direct_edit(id, "Hand tuned short").await.unwrap();
    assert_eq!(edited.version_index, 2);
    assert_eq!(edited.instruction, "manual edit");

    assert_eq!(wf.export(id).await.unwrap(), "# Short 1\n\nHand tuned short");

    let v0 = wf.select_version(id, 0).await.unwrap();
    assert_eq!(v0.content, "Short script 1");
}

#[tokio::test]
async fn test_reselect_discards_previous_history() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(3)), text("Edited short 0")]);
    let wf = shorts(&llm);
    let id = wf.convert(LONG_FORM, None).await.unwrap().id;

    wf.select(id, 0).await.unwrap();
    wf.refine(id, "shorter").await.unwrap();

    let reselected = wf.select(id, 2).await.unwrap();
    assert_eq!(reselected.versions.len(), 1);

    let conversion = wf.get(id).await.unwrap();
    let selected = conversion.selected.unwrap();
    assert_eq!(selected.recommendation_index, 2);
    assert_eq!(selected.versions.len(), 1);
    assert_eq!(selected.current_content(), "Short script 2");
}

#[tokio::test]
async fn test_histories_are_independent_per_conversion() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(3)), text(shorts_json(3))]);
    let wf = shorts(&llm);
    let first = wf.convert(LONG_FORM, None).await.unwrap().id;
    let second = wf.convert(LONG_FORM, None).await.unwrap().id;
    assert_ne!(first, second);

    wf.select(first, 0).await.unwrap();
    wf.select(second, 0).await.unwrap();
    wf.direct_edit(first, "only the first").await.unwrap();

    let untouched = wf.get(second).await.unwrap().selected.unwrap();
    assert_eq!(untouched.versions.len(), 1);
}

#[tokio::test]
async fn test_refine_without_selection_or_conversion() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(3))]);
    let wf = shorts(&llm);
    let id = wf.convert(LONG_FORM, None).await.unwrap().id;

    assert!(matches!(
        wf.refine(id, "shorter").await,
        Err(StudioError::InvalidInput(_))
    ));
    assert!(matches!(
        wf.select(ConversionId(99), 0).await,
        Err(StudioError::NotFound { kind: "conversion", .. })
    ));
    assert!(matches!(
        wf.select(id, 7).await,
        Err(StudioError::NotFound { kind: "recommendation", .. })
    ));
}

#[tokio::test]
async fn test_out_of_range_version() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(3))]);
    let wf = shorts(&llm);
    let id = wf.convert(LONG_FORM, None).await.unwrap().id;
    wf.select(id, 0).await.unwrap();

    let err = wf.select_version(id, 4).await.unwrap_err();
    assert!(matches!(err, StudioError::IndexOutOfRange { index: 4, len: 1 }));
}

#[tokio::test]
async fn test_failed_refine_keeps_versions() {
    let llm = ScriptedLLM::new(vec![text(shorts_json(3)), fail("500")]);
    let wf = shorts(&llm);
    let id = wf.convert(LONG_FORM, None).await.unwrap().id;
    wf.select(id, 0).await.unwrap();

    assert!(wf.refine(id, "shorter").await.is_err());

    let selected = wf.get(id).await.unwrap().selected.unwrap();
    assert_eq!(selected.versions.len(), 1);
    assert!(selected.refine_in_flight.is_none());
}

#[tokio::test]
async fn test_reset_discards_in_flight_conversion() {
    let llm = ScriptedLLM::new(vec![]);
    let (tx, rx) = oneshot::channel();
    llm.push(Reply::Gated(rx));
    let wf = shorts(&llm);

    let pending = {
        let wf = wf.clone();
        tokio::spawn(async move { wf.convert(LONG_FORM, None).await })
    };
    llm.wait_for_requests(1).await;

    wf.reset().await;
    tx.send(shorts_json(3)).unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, StudioError::StaleResponse));
    assert!(wf.list().await.is_empty());
}

/// Conversion with recommendation 0 selected and a gated refine queued
async fn selected_with_gate(llm: &Arc<ScriptedLLM>) -> (ShortFormWorkflow, ConversionId, oneshot::Sender<String>) {
    llm.push(text(shorts_json(3)));
    let wf = shorts(llm);
    let id = wf.convert(LONG_FORM, None).await.unwrap().id;
    wf.select(id, 0).await.unwrap();

    let (tx, rx) = oneshot::channel();
    llm.push(Reply::Gated(rx));
    (wf, id, tx)
}

#[tokio::test]
async fn test_overlapping_short_refine_is_busy() {
    let llm = ScriptedLLM::new(vec![]);
    let (wf, id, tx) = selected_with_gate(&llm).await;

    let first = {
        let wf = wf.clone();
        tokio::spawn(async move { wf.refine(id, "slow edit").await })
    };
    llm.wait_for_requests(2).await;

    assert!(matches!(wf.refine(id, "impatient edit").await, Err(StudioError::Busy(_))));
    assert!(matches!(wf.direct_edit(id, "typed").await, Err(StudioError::Busy(_))));
    assert_eq!(llm.request_count(), 2);

    tx.send("Slow short".to_string()).unwrap();
    let version = first.await.unwrap().unwrap();
    assert_eq!(version.version_index, 1);
    assert_eq!(wf.direct_edit(id, "typed").await.unwrap().version_index, 2);
}

#[tokio::test]
async fn test_late_short_refine_after_reselect_is_discarded() {
    let llm = ScriptedLLM::new(vec![]);
    let (wf, id, tx) = selected_with_gate(&llm).await;

    let pending = {
        let wf = wf.clone();
        tokio::spawn(async move { wf.refine(id, "rewrite").await })
    };
    llm.wait_for_requests(2).await;

    wf.select(id, 1).await.unwrap();
    tx.send("Late short".to_string()).unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, StudioError::StaleResponse));

    let selected = wf.get(id).await.unwrap().selected.unwrap();
    assert_eq!(selected.recommendation_index, 1);
    assert_eq!(selected.versions.len(), 1);
    assert_eq!(selected.current_content(), "Short script 1");
}

#[tokio::test]
async fn test_late_short_refine_after_reset_is_discarded() {
    let llm = ScriptedLLM::new(vec![]);
    let (wf, id, tx) = selected_with_gate(&llm).await;

    let pending = {
        let wf = wf.clone();
        tokio::spawn(async move { wf.refine(id, "rewrite").await })
    };
    llm.wait_for_requests(2).await;

    wf.reset().await;
    tx.send("Late short".to_string()).unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, StudioError::StaleResponse));
    assert!(wf.list().await.is_empty());
}

#[tokio::test]
async fn test_abandoned_short_refine_still_settles() {
    let llm = ScriptedLLM::new(vec![]);
    let (wf, id, tx) = selected_with_gate(&llm).await;

    let abandoned = tokio::time::timeout(Duration::from_millis(50), wf.refine(id, "slow edit")).await;
    assert!(abandoned.is_err());
    llm.wait_for_requests(2).await;

    tx.send("Slow short".to_string()).unwrap();
    while wf
        .get(id)
        .await
        .and_then(|c| c.selected)
        .map_or(true, |s| s.refine_in_flight.is_some())
    {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let selected = wf.get(id).await.unwrap().selected.unwrap();
    assert_eq!(selected.versions.len(), 2);
    assert_eq!(selected.current_content(), "Slow short");

    llm.push(text("Second pass"));
    assert_eq!(wf.refine(id, "tighten").await.unwrap().version_index, 2);
}

#[tokio::test]
async fn test_studio_converts_current_script() {
    let llm = ScriptedLLM::new(vec![
        text(analysis_json()),
        text(topics_json(4)),
        text("Generated long-form body"),
        text(metadata_json()),
        text(shorts_json(5)),
    ]);
    let workflow = WorkflowConfig {
        output_language: "English".to_string(),
        ..WorkflowConfig::default()
    };
    let studio = Studio::with_client(client(&llm), &workflow);

    assert!(matches!(
        studio.convert_current_script().await,
        Err(StudioError::InvalidInput(_))
    ));

    let topics = studio.script.analyze("sample script").await.unwrap();
    studio.script.select_topic(topics[0].id).await.unwrap();

    let conversion = studio.convert_current_script().await.unwrap();
    assert_eq!(conversion.origin_topic, Some(topics[0].id));
    assert_eq!(conversion.recommendations.len(), 5);
    assert!(llm.request_text(4).contains("Generated long-form body"));

    studio.reset().await;
    assert!(studio.shorts.list().await.is_empty());
    assert!(studio.script.snapshot().await.draft.is_none());
}
