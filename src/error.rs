//! Error types shared by the generation client, the workflows and the surfaces.

use crate::prompts::Stage;
use crate::state::WorkflowStage;

/// Result type for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Error types for studio operations
#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    #[error("No API key configured")]
    Authentication,

    #[error("Empty response from the generation service during {stage}")]
    EmptyResponse { stage: Stage },

    #[error("Response for {stage} did not match the expected schema: {reason}")]
    SchemaViolation { stage: Stage, reason: String },

    #[error("Generation service error: {0}")]
    Service(String),

    #[error("Version index {index} out of range ({len} versions)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("`{operation}` is not allowed while the workflow is in {stage}")]
    InvalidTransition {
        operation: &'static str,
        stage: WorkflowStage,
    },

    #[error("Another request is already in flight for {0}")]
    Busy(String),

    #[error("Response discarded because the session changed while it was in flight")]
    StaleResponse,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown {kind}: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StudioError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StudioError::Service(format!("request timed out: {}", err))
        } else {
            StudioError::Service(err.to_string())
        }
    }
}

impl StudioError {
    /// Message suitable for showing to the person driving the workflow.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::Authentication => {
                "API key is missing. Configure SCRIPT_STUDIO_API_KEY or save a key with `script-studio key set`.".to_string()
            }
            StudioError::EmptyResponse { stage } => {
                format!("The AI service returned nothing for {}. Please try again.", stage)
            }
            StudioError::SchemaViolation { stage, .. } => {
                format!("The AI service returned an unexpected result for {}. Please try again.", stage)
            }
            StudioError::Service(_) => {
                "The AI service is unavailable right now. Please try again shortly.".to_string()
            }
            StudioError::Busy(_) => "Please wait for the current request to finish.".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the error came from the generation service rather than local state.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            StudioError::Authentication
                | StudioError::EmptyResponse { .. }
                | StudioError::SchemaViolation { .. }
                | StudioError::Service(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_provider_detail() {
        let err = StudioError::Service("503 upstream overloaded".to_string());
        assert!(!err.user_message().contains("503"));
        assert!(err.is_generation_failure());
    }

    #[test]
    fn test_schema_violation_names_stage() {
        let err = StudioError::SchemaViolation {
            stage: Stage::TopicIdeas,
            reason: "$[0].title: missing".to_string(),
        };
        assert!(err.to_string().contains("topic ideas"));
        assert!(err.user_message().contains("topic ideas"));
    }

    #[test]
    fn test_local_errors_are_not_generation_failures() {
        assert!(!StudioError::StaleResponse.is_generation_failure());
        assert!(!StudioError::IndexOutOfRange { index: 3, len: 1 }.is_generation_failure());
    }
}
