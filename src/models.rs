//! Data produced and consumed by the generation stages.
//!
//! Field names follow the camelCase keys the model is asked to emit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Style profile extracted from a sample script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAnalysis {
    pub tone: String,
    pub target_audience: String,
    pub pacing: String,
    pub key_themes: Vec<String>,
    pub strengths: Vec<String>,
    pub writing_style: String,
}

/// Session-local identifier of a topic candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub u64);

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic-{}", self.0)
    }
}

/// Proposed video topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCandidate {
    /// Assigned locally after the batch is validated
    #[serde(default)]
    pub id: TopicId,
    pub title: String,
    pub premise: String,
    pub reason: String,
    /// Predicted potential, 0-100
    pub virality_score: f64,
}

/// Upload metadata generated for a finished script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMetadata {
    pub youtube_title: String,
    pub youtube_description: String,
    pub hashtags: Vec<String>,
}

/// The generated full-length script shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptArtifact {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
}

impl ScriptArtifact {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            youtube_title: None,
            youtube_description: None,
            hashtags: None,
            topic_id: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ScriptMetadata) -> Self {
        self.youtube_title = Some(metadata.youtube_title);
        self.youtube_description = Some(metadata.youtube_description);
        self.hashtags = Some(metadata.hashtags);
        self
    }

    pub fn has_metadata(&self) -> bool {
        self.youtube_title.is_some()
            || self.youtube_description.is_some()
            || self.hashtags.as_ref().map_or(false, |tags| !tags.is_empty())
    }
}

/// Short-form (Shorts/Reels) candidate cut from a long-form script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortFormRecommendation {
    pub title: String,
    pub hook: String,
    pub angle: String,
    pub estimated_views: String,
    pub script: String,
}

/// Delivery tone for hook scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookTone {
    Friendly,
    Professional,
    Energetic,
}

impl HookTone {
    pub fn description(&self) -> &'static str {
        match self {
            HookTone::Friendly => "friendly and conversational, like talking to a close friend",
            HookTone::Professional => "professional and authoritative, backed by facts",
            HookTone::Energetic => "high-energy and punchy, with fast rhythm",
        }
    }
}

impl std::str::FromStr for HookTone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "friendly" => Ok(HookTone::Friendly),
            "professional" => Ok(HookTone::Professional),
            "energetic" => Ok(HookTone::Energetic),
            other => Err(format!("unknown tone: {}", other)),
        }
    }
}

/// Input for the 30-second hook generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookScriptRequest {
    pub topic: String,
    pub target_audience: String,
    pub tone: HookTone,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Timed sections of a hook script as returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookSections {
    pub hook_0_5: String,
    pub retention_5_15: String,
    pub roadmap_15_30: String,
    pub body: String,
    #[serde(rename = "midCTA")]
    pub mid_cta: String,
    #[serde(rename = "endingCTA")]
    pub ending_cta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookScript {
    pub topic: String,
    pub target_audience: String,
    pub tone: HookTone,
    #[serde(flatten)]
    pub sections: HookSections,
}

/// The five sessions of a long-form script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormSessions {
    pub session1: String,
    pub session2: String,
    pub session3: String,
    pub session4: String,
    pub session5: String,
}

impl LongFormSessions {
    /// Sessions with their headings, in order
    pub fn labelled(&self) -> [(&'static str, &str); 5] {
        [
            ("SESSION 1 - Opening", self.session1.as_str()),
            ("SESSION 2 - Development", self.session2.as_str()),
            ("SESSION 3 - Deep Dive", self.session3.as_str()),
            ("SESSION 4 - Twist / Expansion", self.session4.as_str()),
            ("SESSION 5 - Conclusion", self.session5.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub titles: Vec<String>,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongFormAppendix {
    pub scene_directions: String,
    pub bgm_recommendations: String,
    pub estimated_duration: String,
    pub seo_metadata: SeoMetadata,
}

/// Generated body of a long-form script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormBody {
    pub sessions: LongFormSessions,
    pub appendix: LongFormAppendix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormScript {
    pub topic: String,
    #[serde(flatten)]
    pub body: LongFormBody,
}
