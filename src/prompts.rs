//! Prompt builder: instruction text plus output shape for every stage.
//!
//! Builders are pure. Each one must carry every contextual field the stage
//! relies on; anything left out is something the model will invent.

use crate::llm::{ChatMessage, ChatRequest, OutputSchema};
use crate::models::{HookScriptRequest, StyleAnalysis, TopicCandidate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One logical step of a generation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    StyleAnalysis,
    TopicIdeas,
    ScriptWriting,
    Metadata,
    Refinement,
    ShortFormConversion,
    HookScript,
    LongFormScript,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::StyleAnalysis => "style analysis",
            Stage::TopicIdeas => "topic ideas",
            Stage::ScriptWriting => "script writing",
            Stage::Metadata => "upload metadata",
            Stage::Refinement => "refinement",
            Stage::ShortFormConversion => "short-form conversion",
            Stage::HookScript => "hook script",
            Stage::LongFormScript => "long-form script",
        };
        f.write_str(name)
    }
}

/// A built prompt ready for the generation client
#[derive(Debug, Clone)]
pub struct Prompt {
    pub stage: Stage,
    pub instruction: String,
    /// Source material sent as separate parts after the instruction
    pub context: Vec<String>,
    /// Present when the stage expects structured output
    pub schema: Option<OutputSchema>,
}

impl Prompt {
    pub fn new(stage: Stage, instruction: impl Into<String>) -> Self {
        Self {
            stage,
            instruction: instruction.into(),
            context: Vec::new(),
            schema: None,
        }
    }

    pub fn with_context(mut self, text: impl Into<String>) -> Self {
        self.context.push(text.into());
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Total characters sent
    pub fn len(&self) -> usize {
        self.instruction.len() + self.context.iter().map(String::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_request(&self) -> ChatRequest {
        let mut messages = Vec::with_capacity(1 + self.context.len());
        messages.push(ChatMessage::user(self.instruction.clone()));
        messages.extend(self.context.iter().cloned().map(ChatMessage::user));

        ChatRequest {
            messages,
            response_schema: self.schema.clone(),
        }
    }
}

/// Builds the prompt for each stage in the configured output language
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new("Korean")
    }
}

impl PromptBuilder {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn style_analysis(&self, script: &str) -> Prompt {
        let instruction = format!(
            "Analyze the following YouTube script text.\n\
             Identify the tone, target audience, pacing, key themes, strengths, and writing style.\n\
             Return the result in {}.",
            self.language
        );

        Prompt::new(Stage::StyleAnalysis, instruction)
            .with_context(script)
            .with_schema(style_analysis_schema())
    }

    pub fn topic_ideas(&self, analysis: &StyleAnalysis, count: usize) -> Prompt {
        let instruction = format!(
            "Based on the following script analysis, suggest {count} new, high-potential YouTube video topics.\n\
             The topics should appeal to the same audience and maintain the identified style but cover fresh ground.\n\
             Provide the output in {language}.\n\n\
             Analysis Context:\n{context}",
            count = count,
            language = self.language,
            context = analysis_context(analysis),
        );

        Prompt::new(Stage::TopicIdeas, instruction).with_schema(topic_ideas_schema(count))
    }

    /// Free-form script body; no schema so the model can use Markdown freely
    pub fn script_writing(&self, topic: &TopicCandidate, analysis: &StyleAnalysis) -> Prompt {
        let instruction = format!(
            "Write a complete YouTube video script for the topic: \"{title}\".\n\n\
             Constraint:\n\
             1. Mimic the writing style, tone, and pacing found in the analysis.\n\
             2. Tone: {tone}. Pacing: {pacing}.\n\
             3. Target Audience: {audience}.\n\
             4. Writing Style: {style}.\n\
             5. Structure: Hook (0-60s), Intro, Body (3-4 key points), Conclusion/CTA.\n\
             6. Language: {language}.\n\
             7. Include formatting like [Visual Cue], [Sound Effect], (Host speaking).\n\n\
             Topic Premise: {premise}\n\
             Why it fits the channel: {reason}\n\
             Themes the channel is known for: {themes}\n\
             Strengths to preserve: {strengths}",
            title = topic.title,
            tone = analysis.tone,
            pacing = analysis.pacing,
            audience = analysis.target_audience,
            style = analysis.writing_style,
            language = self.language,
            premise = topic.premise,
            reason = topic.reason,
            themes = analysis.key_themes.join(", "),
            strengths = analysis.strengths.join(", "),
        );

        Prompt::new(Stage::ScriptWriting, instruction)
    }

    pub fn metadata(&self, topic: &TopicCandidate, analysis: &StyleAnalysis, script: &str) -> Prompt {
        let instruction = format!(
            "Create YouTube upload metadata for the script below.\n\
             - youtubeTitle: a click-worthy title under 70 characters, based on \"{title}\".\n\
             - youtubeDescription: 2-4 short paragraphs summarising the video for {audience}, ending with a call to action.\n\
             - hashtags: 5-10 relevant hashtags, each starting with '#'.\n\
             Match the channel tone ({tone}). Write in {language}.",
            title = topic.title,
            audience = analysis.target_audience,
            tone = analysis.tone,
            language = self.language,
        );

        Prompt::new(Stage::Metadata, instruction)
            .with_context(script)
            .with_schema(metadata_schema())
    }

    /// Rewrite `current` following `instruction`, aware of earlier edits
    pub fn refinement(&self, current: &str, instruction: &str, history: &[&str], format_hint: &str) -> Prompt {
        let earlier = if history.is_empty() {
            "None".to_string()
        } else {
            history
                .iter()
                .enumerate()
                .map(|(i, h)| format!("{}. {}", i + 1, h))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let text = format!(
            "You are editing a {format}.\n\
             Apply the following revision request to the script provided after this message.\n\n\
             Revision request: {instruction}\n\n\
             Earlier revision requests (already applied, keep their effect):\n{earlier}\n\n\
             Rules:\n\
             - Return only the full revised script, no commentary.\n\
             - Keep formatting cues such as [Visual Cue] and (Host speaking).\n\
             - Write in {language}.",
            format = format_hint,
            instruction = instruction,
            earlier = earlier,
            language = self.language,
        );

        Prompt::new(Stage::Refinement, text).with_context(current)
    }

    pub fn short_form_conversion(&self, long_form: &str, min: usize, max: usize) -> Prompt {
        let instruction = format!(
            "Read the long-form YouTube script provided after this message and propose between {min} and {max} \
             short-form (YouTube Shorts / Reels, 30-60 seconds) videos cut from it.\n\
             For each one provide:\n\
             - title: catchy short title\n\
             - hook: the first 3 seconds, written to stop the scroll\n\
             - angle: which part of the long-form script it uses and why it works standalone\n\
             - estimatedViews: an estimated view range (e.g. \"50K-100K\")\n\
             - script: the complete 30-60 second script with the hook first and only the core message\n\
             Write in {language}.",
            min = min,
            max = max,
            language = self.language,
        );

        Prompt::new(Stage::ShortFormConversion, instruction)
            .with_context(long_form)
            .with_schema(short_form_schema(min, max))
    }

    pub fn hook_script(&self, request: &HookScriptRequest) -> Prompt {
        let key_points = if request.key_points.is_empty() {
            "None given; choose the most compelling points yourself.".to_string()
        } else {
            request
                .key_points
                .iter()
                .map(|p| format!("- {}", p))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let instruction = format!(
            "Write the opening 30 seconds of a YouTube video plus its body and calls to action.\n\n\
             Topic: {topic}\n\
             Target audience: {audience}\n\
             Tone: {tone}\n\
             Key points:\n{key_points}\n\n\
             Sections:\n\
             - hook_0_5: 0-5 seconds, a line that makes the viewer stay\n\
             - retention_5_15: 5-15 seconds, why this video matters to them\n\
             - roadmap_15_30: 15-30 seconds, what the video will cover\n\
             - body: the main content\n\
             - midCTA: a natural mid-video call to action\n\
             - endingCTA: closing call to action\n\
             Write in {language}.",
            topic = request.topic,
            audience = request.target_audience,
            tone = request.tone.description(),
            key_points = key_points,
            language = self.language,
        );

        Prompt::new(Stage::HookScript, instruction).with_schema(hook_script_schema())
    }

    pub fn long_form_script(&self, topic: &str) -> Prompt {
        let instruction = format!(
            "Write a complete 17-20 minute YouTube script (about 10,000 characters) on the topic: \"{topic}\".\n\n\
             Split it into five sessions:\n\
             - session1: Opening (~2,000 chars) with a 5-second hook and a 30-second hook\n\
             - session2: Development (~2,600 chars): the problem and its background\n\
             - session3: Deep dive (~2,800 chars): concrete cases and multi-angle analysis\n\
             - session4: Twist / expansion (~2,600 chars): mid-roll hook and a soft CTA\n\
             - session5: Conclusion (~2,000 chars): key summary, FAQ, final CTA\n\n\
             Then an appendix with sceneDirections, bgmRecommendations, estimatedDuration and \
             seoMetadata (3-5 title candidates, a description, and tags).\n\
             Write in {language}.",
            topic = topic,
            language = self.language,
        );

        Prompt::new(Stage::LongFormScript, instruction).with_schema(long_form_schema())
    }
}

fn analysis_context(analysis: &StyleAnalysis) -> String {
    format!(
        "Tone: {}\nAudience: {}\nPacing: {}\nThemes: {}\nStrengths: {}\nWriting Style: {}",
        analysis.tone,
        analysis.target_audience,
        analysis.pacing,
        analysis.key_themes.join(", "),
        analysis.strengths.join(", "),
        analysis.writing_style
    )
}

fn style_analysis_schema() -> OutputSchema {
    OutputSchema::object(vec![
        ("tone", OutputSchema::string("The overall mood (e.g., Humorous, Serious, Educational)")),
        ("targetAudience", OutputSchema::string("Who this video is for")),
        ("pacing", OutputSchema::string("Speed of delivery (Fast, Moderate, Slow)")),
        ("keyThemes", OutputSchema::string_list("Main topics covered")),
        ("strengths", OutputSchema::string_list("What makes this script good")),
        (
            "writingStyle",
            OutputSchema::string("Description of the writing style (e.g., First-person narrative, Data-driven)"),
        ),
    ])
}

fn topic_ideas_schema(count: usize) -> OutputSchema {
    OutputSchema::array_of(OutputSchema::object(vec![
        ("title", OutputSchema::string("Catchy YouTube title")),
        ("premise", OutputSchema::string("One sentence summary of the video idea")),
        ("reason", OutputSchema::string("Why this topic fits the channel")),
        ("viralityScore", OutputSchema::number_in("Predicted potential score out of 100", 0.0, 100.0)),
    ]))
    .with_item_bounds(count, count)
}

fn metadata_schema() -> OutputSchema {
    OutputSchema::object(vec![
        ("youtubeTitle", OutputSchema::string("Title for the upload")),
        ("youtubeDescription", OutputSchema::string("Video description")),
        ("hashtags", OutputSchema::string_list("Hashtags including the leading '#'")),
    ])
}

fn short_form_schema(min: usize, max: usize) -> OutputSchema {
    OutputSchema::array_of(OutputSchema::object(vec![
        ("title", OutputSchema::string("Short-form title")),
        ("hook", OutputSchema::string("First 3 seconds")),
        ("angle", OutputSchema::string("Which part of the source it uses")),
        ("estimatedViews", OutputSchema::string("Estimated view range")),
        ("script", OutputSchema::string("Complete 30-60 second script")),
    ]))
    .with_item_bounds(min, max)
}

fn hook_script_schema() -> OutputSchema {
    OutputSchema::object(vec![
        ("hook_0_5", OutputSchema::string("0-5 seconds: the hook")),
        ("retention_5_15", OutputSchema::string("5-15 seconds: retention")),
        ("roadmap_15_30", OutputSchema::string("15-30 seconds: roadmap")),
        ("body", OutputSchema::string("Main content")),
        ("midCTA", OutputSchema::string("Mid-video call to action")),
        ("endingCTA", OutputSchema::string("Closing call to action")),
    ])
}

fn long_form_schema() -> OutputSchema {
    OutputSchema::object(vec![
        (
            "sessions",
            OutputSchema::object(vec![
                ("session1", OutputSchema::string("Opening")),
                ("session2", OutputSchema::string("Development")),
                ("session3", OutputSchema::string("Deep dive")),
                ("session4", OutputSchema::string("Twist / expansion")),
                ("session5", OutputSchema::string("Conclusion")),
            ]),
        ),
        (
            "appendix",
            OutputSchema::object(vec![
                ("sceneDirections", OutputSchema::string("Scene directions")),
                ("bgmRecommendations", OutputSchema::string("BGM and sound effect suggestions")),
                ("estimatedDuration", OutputSchema::string("Estimated running time")),
                (
                    "seoMetadata",
                    OutputSchema::object(vec![
                        ("titles", OutputSchema::string_list("Title candidates")),
                        ("description", OutputSchema::string("Video description")),
                        ("tags", OutputSchema::string_list("Tags")),
                    ]),
                ),
            ]),
        ),
    ])
}
