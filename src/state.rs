//! Session state for the full-script workflow.
//!
//! All mutation goes through [`SessionState::apply`]. Requests that suspend on
//! the generation service are tagged with a [`Ticket`]; a completion whose
//! ticket no longer matches the session is rejected as stale.

use crate::error::{Result, StudioError};
use crate::models::{ScriptArtifact, StyleAnalysis, TopicCandidate, TopicId};
use crate::versions::{ScriptVersion, VersionStore, MANUAL_EDIT_INSTRUCTION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Which view of the workflow is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStage {
    Input,
    Analyzing,
    TopicSelection,
    Generating,
    Result,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Input => "input",
            WorkflowStage::Analyzing => "analyzing",
            WorkflowStage::TopicSelection => "topic selection",
            WorkflowStage::Generating => "generating",
            WorkflowStage::Result => "result",
        };
        f.write_str(name)
    }
}

/// Identifies one outstanding request against a session generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub epoch: u64,
    pub request: u64,
}

/// The generated script together with its revision history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDraft {
    pub artifact: ScriptArtifact,
    pub versions: VersionStore,
    /// Request id of the refinement currently awaiting a response
    pub refine_in_flight: Option<u64>,
}

impl ScriptDraft {
    fn new(artifact: ScriptArtifact) -> Self {
        let versions = VersionStore::seeded(artifact.content.clone());
        Self {
            artifact,
            versions,
            refine_in_flight: None,
        }
    }

    pub fn current_content(&self) -> &str {
        self.versions.current_content(&self.artifact.content)
    }

    pub fn current_version(&self) -> Option<&ScriptVersion> {
        self.versions.current()
    }
}

/// Messages accepted by the session reducer
#[derive(Debug, Clone)]
pub enum SessionEvent {
    AnalysisStarted { script: String },
    AnalysisCompleted { ticket: Ticket, analysis: StyleAnalysis, topics: Vec<TopicCandidate> },
    AnalysisFailed { ticket: Ticket, message: String },
    GenerationStarted { topic: TopicId },
    GenerationCompleted { ticket: Ticket, artifact: ScriptArtifact },
    GenerationFailed { ticket: Ticket, message: String },
    RefineStarted,
    RefineCompleted { ticket: Ticket, content: String, instruction: String },
    RefineFailed { ticket: Ticket, message: String },
    DirectEdit { content: String },
    VersionSelected { index: usize },
    Back,
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::AnalysisStarted { .. } => "analyze",
            SessionEvent::AnalysisCompleted { .. } => "analysis completed",
            SessionEvent::AnalysisFailed { .. } => "analysis failed",
            SessionEvent::GenerationStarted { .. } => "select topic",
            SessionEvent::GenerationCompleted { .. } => "generation completed",
            SessionEvent::GenerationFailed { .. } => "generation failed",
            SessionEvent::RefineStarted => "refine",
            SessionEvent::RefineCompleted { .. } => "refine completed",
            SessionEvent::RefineFailed { .. } => "refine failed",
            SessionEvent::DirectEdit { .. } => "direct edit",
            SessionEvent::VersionSelected { .. } => "select version",
            SessionEvent::Back => "back",
            SessionEvent::Reset => "reset",
        }
    }
}

/// Everything one script session owns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub stage: WorkflowStage,
    /// Bumped whenever in-flight work must be abandoned
    pub epoch: u64,
    pub source_script: Option<String>,
    pub analysis: Option<StyleAnalysis>,
    pub topics: Vec<TopicCandidate>,
    pub selected_topic: Option<TopicId>,
    pub draft: Option<ScriptDraft>,
    /// User-facing message from the last failed operation
    pub last_error: Option<String>,
    #[serde(skip)]
    next_topic_id: u64,
    #[serde(skip)]
    next_request: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            stage: WorkflowStage::Input,
            epoch: 0,
            source_script: None,
            analysis: None,
            topics: Vec::new(),
            selected_topic: None,
            draft: None,
            last_error: None,
            next_topic_id: 1,
            next_request: 0,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(&self, id: TopicId) -> Option<&TopicCandidate> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn current_content(&self) -> Option<&str> {
        self.draft.as_ref().map(ScriptDraft::current_content)
    }

    /// Whether a response tagged with `ticket` may still be applied
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_request += 1;
        Ticket {
            epoch: self.epoch,
            request: self.next_request,
        }
    }

    fn current_ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch,
            request: self.next_request,
        }
    }

    fn require(&self, operation: &'static str, stage: WorkflowStage) -> Result<()> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(StudioError::InvalidTransition {
                operation,
                stage: self.stage,
            })
        }
    }

    fn require_fresh(&self, ticket: Ticket, stage: WorkflowStage) -> Result<()> {
        if self.is_current(ticket) && self.stage == stage {
            Ok(())
        } else {
            Err(StudioError::StaleResponse)
        }
    }

    fn draft_mut(&mut self, operation: &'static str) -> Result<&mut ScriptDraft> {
        let stage = self.stage;
        match (stage, self.draft.as_mut()) {
            (WorkflowStage::Result, Some(draft)) => Ok(draft),
            _ => Err(StudioError::InvalidTransition { operation, stage }),
        }
    }

    fn abandon_in_flight(&mut self) {
        self.epoch += 1;
    }

    /// Apply one event. Returns the ticket identifying the session afterwards;
    /// for `*Started` events this is the ticket the completion must carry.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Ticket> {
        let operation = event.name();

        match event {
            SessionEvent::AnalysisStarted { script } => {
                self.require(operation, WorkflowStage::Input)?;
                self.source_script = Some(script);
                self.last_error = None;
                self.stage = WorkflowStage::Analyzing;
                return Ok(self.issue_ticket());
            }

            SessionEvent::AnalysisCompleted { ticket, analysis, mut topics } => {
                self.require_fresh(ticket, WorkflowStage::Analyzing)?;
                for topic in &mut topics {
                    topic.id = TopicId(self.next_topic_id);
                    self.next_topic_id += 1;
                }
                self.analysis = Some(analysis);
                self.topics = topics;
                self.stage = WorkflowStage::TopicSelection;
            }

            SessionEvent::AnalysisFailed { ticket, message } => {
                self.require_fresh(ticket, WorkflowStage::Analyzing)?;
                self.analysis = None;
                self.topics.clear();
                self.last_error = Some(message);
                self.stage = WorkflowStage::Input;
            }

            SessionEvent::GenerationStarted { topic } => {
                self.require(operation, WorkflowStage::TopicSelection)?;
                if self.topic(topic).is_none() {
                    return Err(StudioError::NotFound {
                        kind: "topic",
                        id: topic.to_string(),
                    });
                }
                self.selected_topic = Some(topic);
                self.last_error = None;
                self.stage = WorkflowStage::Generating;
                return Ok(self.issue_ticket());
            }

            SessionEvent::GenerationCompleted { ticket, artifact } => {
                self.require_fresh(ticket, WorkflowStage::Generating)?;
                self.draft = Some(ScriptDraft::new(artifact));
                self.stage = WorkflowStage::Result;
            }

            SessionEvent::GenerationFailed { ticket, message } => {
                self.require_fresh(ticket, WorkflowStage::Generating)?;
                self.selected_topic = None;
                self.draft = None;
                self.last_error = Some(message);
                self.stage = WorkflowStage::TopicSelection;
            }

            SessionEvent::RefineStarted => {
                let draft = self.draft_mut(operation)?;
                if draft.refine_in_flight.is_some() {
                    return Err(StudioError::Busy("the current script".to_string()));
                }
                self.last_error = None;
                let ticket = self.issue_ticket();
                if let Some(draft) = self.draft.as_mut() {
                    draft.refine_in_flight = Some(ticket.request);
                }
                return Ok(ticket);
            }

            SessionEvent::RefineCompleted { ticket, content, instruction } => {
                let draft = self.claim_refine(ticket)?;
                let appended = draft.versions.append(content, instruction).version_index;
                debug!("Appended script version {}", appended);
            }

            SessionEvent::RefineFailed { ticket, message } => {
                self.claim_refine(ticket)?;
                self.last_error = Some(message);
            }

            SessionEvent::DirectEdit { content } => {
                let draft = self.draft_mut(operation)?;
                if draft.refine_in_flight.is_some() {
                    return Err(StudioError::Busy("the current script".to_string()));
                }
                draft.versions.append(content, MANUAL_EDIT_INSTRUCTION);
            }

            SessionEvent::VersionSelected { index } => {
                self.draft_mut(operation)?.versions.select_version(index)?;
            }

            SessionEvent::Back => {
                self.require(operation, WorkflowStage::Result)?;
                self.abandon_in_flight();
                self.draft = None;
                self.selected_topic = None;
                self.last_error = None;
                self.stage = WorkflowStage::TopicSelection;
            }

            SessionEvent::Reset => {
                let epoch = self.epoch + 1;
                let next_topic_id = self.next_topic_id;
                let next_request = self.next_request;
                *self = Self {
                    epoch,
                    next_topic_id,
                    next_request,
                    ..Self::default()
                };
            }
        }

        Ok(self.current_ticket())
    }

    /// Take the in-flight refine slot if `ticket` still owns it
    fn claim_refine(&mut self, ticket: Ticket) -> Result<&mut ScriptDraft> {
        if !self.is_current(ticket) || self.stage != WorkflowStage::Result {
            return Err(StudioError::StaleResponse);
        }
        match self.draft.as_mut() {
            Some(draft) if draft.refine_in_flight == Some(ticket.request) => {
                draft.refine_in_flight = None;
                Ok(draft)
            }
            _ => Err(StudioError::StaleResponse),
        }
    }

    pub fn statistics(&self) -> SessionStats {
        SessionStats {
            stage: self.stage,
            topic_count: self.topics.len(),
            version_count: self.draft.as_ref().map_or(0, |d| d.versions.len()),
            current_version: self.draft.as_ref().and_then(|d| d.versions.current_index()),
            refine_in_flight: self
                .draft
                .as_ref()
                .map_or(false, |d| d.refine_in_flight.is_some()),
        }
    }
}

/// Session summary for status displays
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub stage: WorkflowStage,
    pub topic_count: usize,
    pub version_count: usize,
    pub current_version: Option<usize>,
    pub refine_in_flight: bool,
}

/// Shared handle to one session; the lock is never held across a service call
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(&self, event: SessionEvent) -> Result<Ticket> {
        self.dispatch_and_read(event, |_| ()).await.map(|(ticket, _)| ticket)
    }

    /// Apply `event` and read from the resulting state under the same lock
    pub async fn dispatch_and_read<R>(
        &self,
        event: SessionEvent,
        read: impl FnOnce(&SessionState) -> R,
    ) -> Result<(Ticket, R)> {
        let mut state = self.state.write().await;
        let before = state.stage;
        let operation = event.name();

        let ticket = state.apply(event)?;
        if state.stage != before {
            info!("🔄 {}: {} -> {}", operation, before, state.stage);
        }
        Ok((ticket, read(&*state)))
    }

    pub async fn read<R>(&self, read: impl FnOnce(&SessionState) -> R) -> R {
        read(&*self.state.read().await)
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> StyleAnalysis {
        StyleAnalysis {
            tone: "casual".to_string(),
            target_audience: "beginners".to_string(),
            pacing: "fast".to_string(),
            key_themes: vec!["growth".to_string()],
            strengths: vec!["clarity".to_string()],
            writing_style: "first-person".to_string(),
        }
    }

    fn topic(title: &str) -> TopicCandidate {
        TopicCandidate {
            id: TopicId::default(),
            title: title.to_string(),
            premise: "premise".to_string(),
            reason: "reason".to_string(),
            virality_score: 70.0,
        }
    }

    fn at_result() -> SessionState {
        let mut state = SessionState::new();
        let ticket = state
            .apply(SessionEvent::AnalysisStarted { script: "sample".to_string() })
            .unwrap();
        state
            .apply(SessionEvent::AnalysisCompleted {
                ticket,
                analysis: analysis(),
                topics: vec![topic("A"), topic("B")],
            })
            .unwrap();
        let id = state.topics[0].id;
        let ticket = state.apply(SessionEvent::GenerationStarted { topic: id }).unwrap();
        state
            .apply(SessionEvent::GenerationCompleted {
                ticket,
                artifact: ScriptArtifact::new("A", "draft body"),
            })
            .unwrap();
        state
    }

    #[test]
    fn test_topics_get_distinct_ids() {
        let state = at_result();
        assert_eq!(state.topics.len(), 2);
        assert_ne!(state.topics[0].id, state.topics[1].id);
        assert_eq!(state.stage, WorkflowStage::Result);
        assert_eq!(state.current_content(), Some("draft body"));
    }

    #[test]
    fn test_analysis_failure_returns_to_input() {
        let mut state = SessionState::new();
        let ticket = state
            .apply(SessionEvent::AnalysisStarted { script: "sample".to_string() })
            .unwrap();
        state
            .apply(SessionEvent::AnalysisFailed { ticket, message: "boom".to_string() })
            .unwrap();

        assert_eq!(state.stage, WorkflowStage::Input);
        assert!(state.analysis.is_none());
        assert_eq!(state.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_analyze_rejected_outside_input() {
        let mut state = at_result();
        let err = state
            .apply(SessionEvent::AnalysisStarted { script: "again".to_string() })
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::InvalidTransition { stage: WorkflowStage::Result, .. }
        ));
    }

    #[test]
    fn test_completion_after_reset_is_stale() {
        let mut state = SessionState::new();
        let ticket = state
            .apply(SessionEvent::AnalysisStarted { script: "sample".to_string() })
            .unwrap();
        state.apply(SessionEvent::Reset).unwrap();

        let err = state
            .apply(SessionEvent::AnalysisCompleted {
                ticket,
                analysis: analysis(),
                topics: vec![topic("late")],
            })
            .unwrap_err();
        assert!(matches!(err, StudioError::StaleResponse));
        assert!(state.topics.is_empty());
        assert_eq!(state.stage, WorkflowStage::Input);
    }

    #[test]
    fn test_second_refine_is_busy() {
        let mut state = at_result();
        state.apply(SessionEvent::RefineStarted).unwrap();
        assert!(matches!(
            state.apply(SessionEvent::RefineStarted),
            Err(StudioError::Busy(_))
        ));
    }

    #[test]
    fn test_refine_after_back_is_stale() {
        let mut state = at_result();
        let ticket = state.apply(SessionEvent::RefineStarted).unwrap();
        state.apply(SessionEvent::Back).unwrap();

        let err = state
            .apply(SessionEvent::RefineCompleted {
                ticket,
                content: "late".to_string(),
                instruction: "shorter".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, StudioError::StaleResponse));
        assert_eq!(state.stage, WorkflowStage::TopicSelection);
        assert!(state.draft.is_none());
    }

    #[test]
    fn test_refine_failure_keeps_history() {
        let mut state = at_result();
        let ticket = state.apply(SessionEvent::RefineStarted).unwrap();
        state
            .apply(SessionEvent::RefineFailed { ticket, message: "down".to_string() })
            .unwrap();

        let draft = state.draft.as_ref().unwrap();
        assert_eq!(draft.versions.len(), 1);
        assert_eq!(draft.versions.current_index(), Some(0));
        assert!(draft.refine_in_flight.is_none());
    }

    #[test]
    fn test_reset_keeps_topic_ids_unique() {
        let mut state = at_result();
        let old_ids: Vec<_> = state.topics.iter().map(|t| t.id).collect();
        state.apply(SessionEvent::Reset).unwrap();

        let ticket = state
            .apply(SessionEvent::AnalysisStarted { script: "next".to_string() })
            .unwrap();
        state
            .apply(SessionEvent::AnalysisCompleted {
                ticket,
                analysis: analysis(),
                topics: vec![topic("C")],
            })
            .unwrap();
        assert!(!old_ids.contains(&state.topics[0].id));
    }

    #[test]
    fn test_fresh_store_starts_at_input() {
        let store = SessionStore::new();
        let state = tokio_test::block_on(store.snapshot());
        assert_eq!(state.stage, WorkflowStage::Input);
        assert_eq!(state.epoch, 0);
    }

    #[tokio::test]
    async fn test_store_dispatch_and_snapshot() {
        let store = SessionStore::new();
        store
            .dispatch(SessionEvent::AnalysisStarted { script: "sample".to_string() })
            .await
            .unwrap();
        let stats = store.read(SessionState::statistics).await;
        assert_eq!(stats.stage, WorkflowStage::Analyzing);
        assert_eq!(store.snapshot().await.source_script.as_deref(), Some("sample"));
    }
}
