//! API data models

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::StudioError;
use crate::models::HookScriptRequest;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub script: String,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub instruction: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub content: String,
}

/// Convert the given text, or the current full script when absent
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub long_form: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LongFormRequest {
    pub topic: String,
}

pub type HookRequest = HookScriptRequest;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub text: String,
    pub file_name: String,
}

/// HTTP status for a failed operation
pub fn status_for(err: &StudioError) -> StatusCode {
    match err {
        StudioError::Authentication => StatusCode::UNAUTHORIZED,
        StudioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StudioError::NotFound { .. } | StudioError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
        StudioError::InvalidTransition { .. } | StudioError::Busy(_) | StudioError::StaleResponse => {
            StatusCode::CONFLICT
        }
        StudioError::EmptyResponse { .. } | StudioError::SchemaViolation { .. } | StudioError::Service(_) => {
            StatusCode::BAD_GATEWAY
        }
        StudioError::Configuration(_) | StudioError::Io(_) | StudioError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowStage;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&StudioError::Authentication), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&StudioError::Busy("x".to_string())), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&StudioError::InvalidTransition {
                operation: "refine",
                stage: WorkflowStage::Input
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&StudioError::Service("down".to_string())), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_convert_request_defaults_to_current_script() {
        let request: ConvertRequest = serde_json::from_str("{}").unwrap();
        assert!(request.long_form.is_none());
    }
}
