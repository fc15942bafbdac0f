//! Script Studio
//!
//! Core of a YouTube script assistant: style analysis, topic ideas, script
//! generation with revision history, and short-form conversion.

pub mod config;
pub mod credential;
pub mod error;
pub mod export;
pub mod hook;
pub mod llm;
pub mod long_form;
pub mod models;
pub mod prompts;
pub mod shorts;
pub mod state;
pub mod studio;
pub mod versions;
pub mod workflow;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::credential::KeyStore;
pub use crate::error::{Result, StudioError};
pub use crate::hook::HookScriptGenerator;
pub use crate::llm::{GenerationClient, LLMConfig, LLMProvider, OutputSchema};
pub use crate::long_form::LongFormGenerator;
pub use crate::models::{
    HookScript, HookScriptRequest, HookTone, LongFormScript, ScriptArtifact, ShortFormRecommendation,
    StyleAnalysis, TopicCandidate, TopicId,
};
pub use crate::prompts::{Prompt, PromptBuilder, Stage};
pub use crate::shorts::{Conversion, ConversionId, ShortFormWorkflow};
pub use crate::state::{SessionState, SessionStore, WorkflowStage};
pub use crate::studio::Studio;
pub use crate::versions::{ScriptVersion, VersionStore};
pub use crate::workflow::ScriptWorkflow;
