//! Full-script workflow: analyze, pick a topic, generate, refine.

use crate::error::{Result, StudioError};
use crate::export;
use crate::llm::GenerationClient;
use crate::models::{ScriptArtifact, ScriptMetadata, StyleAnalysis, TopicCandidate, TopicId};
use crate::prompts::{Prompt, PromptBuilder};
use crate::state::{SessionEvent, SessionState, SessionStats, SessionStore, Ticket};
use crate::versions::ScriptVersion;
use std::future::Future;
use tracing::{debug, info, warn};

const SCRIPT_FORMAT: &str = "long-form YouTube script";

/// Drives one script session against the generation service.
///
/// Every multi-call stage commits only after all of its calls succeed.
/// Service calls run without the session lock held, on their own task, so a
/// stage that was started always settles even if the caller stops waiting.
#[derive(Clone)]
pub struct ScriptWorkflow {
    client: GenerationClient,
    prompts: PromptBuilder,
    topic_count: usize,
    session: SessionStore,
}

impl ScriptWorkflow {
    pub fn new(client: GenerationClient, prompts: PromptBuilder, topic_count: usize) -> Self {
        Self {
            client,
            prompts,
            topic_count,
            session: SessionStore::new(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn snapshot(&self) -> SessionState {
        self.session.snapshot().await
    }

    pub async fn statistics(&self) -> SessionStats {
        self.session.read(SessionState::statistics).await
    }

    /// Analyze a sample script and propose topics. `Input -> TopicSelection`.
    pub async fn analyze(&self, raw_script: &str) -> Result<Vec<TopicCandidate>> {
        let script = raw_script.trim();
        if script.is_empty() {
            return Err(StudioError::InvalidInput("script text is empty".to_string()));
        }

        let ticket = self
            .session
            .dispatch(SessionEvent::AnalysisStarted {
                script: script.to_string(),
            })
            .await?;
        info!("🔍 Analyzing script ({} chars)", script.len());

        let this = self.clone();
        let script = script.to_string();
        run_detached(async move { this.finish_analysis(ticket, &script).await }).await
    }

    async fn finish_analysis(&self, ticket: Ticket, script: &str) -> Result<Vec<TopicCandidate>> {
        match self.run_analysis(script).await {
            Ok((analysis, topics)) => {
                let (_, topics) = self
                    .session
                    .dispatch_and_read(
                        SessionEvent::AnalysisCompleted {
                            ticket,
                            analysis,
                            topics,
                        },
                        |state| state.topics.clone(),
                    )
                    .await?;
                info!("✅ Analysis complete, {} topics proposed", topics.len());
                Ok(topics)
            }
            Err(e) => {
                warn!("Analysis failed: {}", e);
                self.record_failure(SessionEvent::AnalysisFailed {
                    ticket,
                    message: e.user_message(),
                })
                .await;
                Err(e)
            }
        }
    }

    async fn run_analysis(&self, script: &str) -> Result<(StyleAnalysis, Vec<TopicCandidate>)> {
        let analysis: StyleAnalysis = self
            .client
            .complete_structured(&self.prompts.style_analysis(script))
            .await?;
        debug!("Style: tone={}, pacing={}", analysis.tone, analysis.pacing);

        let topics: Vec<TopicCandidate> = self
            .client
            .complete_structured(&self.prompts.topic_ideas(&analysis, self.topic_count))
            .await?;

        Ok((analysis, topics))
    }

    /// Generate the script and its upload metadata. `TopicSelection -> Result`.
    pub async fn select_topic(&self, topic_id: TopicId) -> Result<ScriptArtifact> {
        let ticket = self
            .session
            .dispatch(SessionEvent::GenerationStarted { topic: topic_id })
            .await?;

        let this = self.clone();
        run_detached(async move { this.finish_generation(ticket, topic_id).await }).await
    }

    async fn finish_generation(&self, ticket: Ticket, topic_id: TopicId) -> Result<ScriptArtifact> {
        let inputs = self
            .session
            .read(|state| {
                if !state.is_current(ticket) {
                    return None;
                }
                Some((state.topic(topic_id)?.clone(), state.analysis.clone()?))
            })
            .await;
        let (topic, analysis) = inputs.ok_or(StudioError::StaleResponse)?;
        info!("✍️  Writing script for \"{}\"", topic.title);

        match self.run_generation(&topic, &analysis).await {
            Ok(artifact) => {
                let (_, artifact) = self
                    .session
                    .dispatch_and_read(SessionEvent::GenerationCompleted { ticket, artifact }, |state| {
                        state.draft.as_ref().map(|d| d.artifact.clone())
                    })
                    .await?;
                info!("✅ Script ready");
                artifact.ok_or(StudioError::StaleResponse)
            }
            Err(e) => {
                warn!("Script generation failed: {}", e);
                self.record_failure(SessionEvent::GenerationFailed {
                    ticket,
                    message: e.user_message(),
                })
                .await;
                Err(e)
            }
        }
    }

    async fn run_generation(&self, topic: &TopicCandidate, analysis: &StyleAnalysis) -> Result<ScriptArtifact> {
        let content = self
            .client
            .complete(&self.prompts.script_writing(topic, analysis))
            .await?;

        let metadata: ScriptMetadata = self
            .client
            .complete_structured(&self.prompts.metadata(topic, analysis, &content))
            .await?;

        let mut artifact = ScriptArtifact::new(topic.title.clone(), content).with_metadata(metadata);
        artifact.topic_id = Some(topic.id);
        Ok(artifact)
    }

    /// Rewrite the displayed version and append the result as a new version.
    pub async fn refine(&self, instruction: &str) -> Result<ScriptVersion> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(StudioError::InvalidInput("refinement instruction is empty".to_string()));
        }

        let (ticket, inputs) = self
            .session
            .dispatch_and_read(SessionEvent::RefineStarted, |state| {
                state.draft.as_ref().map(|draft| {
                    let history: Vec<String> = draft
                        .versions
                        .instruction_history()
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    (draft.current_content().to_string(), history)
                })
            })
            .await?;
        let (current, history) = inputs.ok_or(StudioError::StaleResponse)?;
        info!("🛠️  Refining script: {}", instruction);

        let history: Vec<&str> = history.iter().map(String::as_str).collect();
        let prompt = self
            .prompts
            .refinement(&current, instruction, &history, SCRIPT_FORMAT);

        let this = self.clone();
        let instruction = instruction.to_string();
        run_detached(async move { this.finish_refine(ticket, prompt, instruction).await }).await
    }

    async fn finish_refine(&self, ticket: Ticket, prompt: Prompt, instruction: String) -> Result<ScriptVersion> {
        match self.client.complete(&prompt).await {
            Ok(content) => {
                let (_, version) = self
                    .session
                    .dispatch_and_read(
                        SessionEvent::RefineCompleted {
                            ticket,
                            content,
                            instruction,
                        },
                        |state| state.draft.as_ref().and_then(|d| d.current_version().cloned()),
                    )
                    .await?;
                version.ok_or(StudioError::StaleResponse)
            }
            Err(e) => {
                warn!("Refinement failed: {}", e);
                self.record_failure(SessionEvent::RefineFailed {
                    ticket,
                    message: e.user_message(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Record hand-edited text as a new version
    pub async fn direct_edit(&self, content: &str) -> Result<ScriptVersion> {
        if content.trim().is_empty() {
            return Err(StudioError::InvalidInput("edited script is empty".to_string()));
        }

        let (_, version) = self
            .session
            .dispatch_and_read(
                SessionEvent::DirectEdit {
                    content: content.to_string(),
                },
                |state| state.draft.as_ref().and_then(|d| d.current_version().cloned()),
            )
            .await?;
        version.ok_or(StudioError::StaleResponse)
    }

    pub async fn select_version(&self, index: usize) -> Result<ScriptVersion> {
        let (_, version) = self
            .session
            .dispatch_and_read(SessionEvent::VersionSelected { index }, |state| {
                state.draft.as_ref().and_then(|d| d.current_version().cloned())
            })
            .await?;
        version.ok_or(StudioError::StaleResponse)
    }

    /// `Result -> TopicSelection`, keeping the analysis and topics
    pub async fn back(&self) -> Result<()> {
        self.session.dispatch(SessionEvent::Back).await.map(|_| ())
    }

    /// Back to `Input`; anything still in flight is discarded when it lands
    pub async fn reset(&self) {
        if let Err(e) = self.session.dispatch(SessionEvent::Reset).await {
            warn!("Reset rejected: {}", e);
        }
    }

    pub async fn current_content(&self) -> Option<String> {
        self.session
            .read(|state| state.current_content().map(str::to_string))
            .await
    }

    /// `# title` followed by the displayed version
    pub async fn export(&self) -> Result<String> {
        self.session
            .read(|state| {
                state
                    .draft
                    .as_ref()
                    .map(|draft| export::full_script(&draft.artifact, draft.current_content()))
            })
            .await
            .ok_or_else(|| StudioError::InvalidInput("no script has been generated yet".to_string()))
    }

    async fn record_failure(&self, event: SessionEvent) {
        if let Err(e) = self.session.dispatch(event).await {
            debug!("Failure not recorded: {}", e);
        }
    }
}

/// Run a started stage on its own task and wait for it.
///
/// Dropping the returned future leaves the task running, so the stage's
/// completion or failure event is still applied.
pub(crate) async fn run_detached<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| StudioError::Service(format!("generation task failed: {}", e)))?
}
