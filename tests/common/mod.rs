#![allow(dead_code)]

use async_trait::async_trait;
use script_studio::llm::{ChatRequest, LLMProvider, LLMResponse, LLM};
use script_studio::{GenerationClient, StudioError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// What the fake service does with the next request
pub enum Reply {
    Text(String),
    Fail(String),
    /// Hold the response until the test sends it
    Gated(oneshot::Receiver<String>),
}

pub fn text(body: impl Into<String>) -> Reply {
    Reply::Text(body.into())
}

pub fn fail(message: &str) -> Reply {
    Reply::Fail(message.to_string())
}

/// Replays queued replies in order and records every request
#[derive(Default)]
pub struct ScriptedLLM {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLLM {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every text part of the `n`th request joined together
    pub fn request_text(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn wait_for_requests(&self, n: usize) {
        while self.request_count() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn chat(&self, request: ChatRequest) -> script_studio::Result<LLMResponse> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();

        let content = match reply {
            Some(Reply::Text(body)) => body,
            Some(Reply::Fail(message)) => return Err(StudioError::Service(message)),
            Some(Reply::Gated(rx)) => rx
                .await
                .map_err(|_| StudioError::Service("gate dropped".to_string()))?,
            None => return Err(StudioError::Service("no scripted reply left".to_string())),
        };

        Ok(LLMResponse {
            content,
            tokens_used: None,
        })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }
}

pub fn client(llm: &Arc<ScriptedLLM>) -> GenerationClient {
    GenerationClient::new(llm.clone() as Arc<dyn LLM>)
}

pub fn analysis_json() -> String {
    r#"{"tone":"casual","targetAudience":"beginners","pacing":"fast",
        "keyThemes":["growth"],"strengths":["clarity"],"writingStyle":"first-person"}"#
        .to_string()
}

pub fn topics_json(count: usize) -> String {
    let topics: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"title":"Topic {i}","premise":"Premise {i}","reason":"Reason {i}","viralityScore":{score}}}"#,
                i = i,
                score = 60 + i * 10
            )
        })
        .collect();
    format!("[{}]", topics.join(","))
}

pub fn metadata_json() -> String {
    r##"{"youtubeTitle":"Upload title","youtubeDescription":"What the video covers","hashtags":["#growth","#habits"]}"##
        .to_string()
}

pub fn shorts_json(count: usize) -> String {
    let shorts: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"title":"Short {i}","hook":"Hook {i}","angle":"Angle {i}","estimatedViews":"10K-50K","script":"Short script {i}"}}"#,
                i = i
            )
        })
        .collect();
    format!("[{}]", shorts.join(","))
}
