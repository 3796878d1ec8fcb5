use super::{GenerationService, PromptPart};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Scripted stand-in for the Gemini client.
///
/// Queued replies are consumed in order and cycle when exhausted; clones
/// share state so tests can keep a probe handle while the client is moved
/// into a handler.
#[derive(Clone)]
pub struct MockGenerationClient {
    replies: Arc<Mutex<Vec<Reply>>>,
    calls: Arc<Mutex<Vec<Vec<PromptPart>>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push(Reply::Text(text.into()));
        self
    }

    /// Queue a failure whose message is classified like a real provider error.
    pub fn with_failure(self, raw_message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(Reply::Failure(raw_message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every `parts` argument received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<PromptPart>> {
        self.calls.lock().unwrap().clone()
    }

    /// Concatenated text parts of the most recent call.
    pub fn last_prompt_text(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|parts| {
            parts
                .iter()
                .filter_map(|part| match part {
                    PromptPart::Text(text) => Some(text.as_str()),
                    PromptPart::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, parts: &[PromptPart]) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(parts.to_vec());
        let call_index = calls.len() - 1;
        drop(calls);

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok("Mock generation response".to_string());
        }

        match &replies[call_index % replies.len()] {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Failure(raw) => Err(Error::AiProvider(raw.clone())),
        }
    }
}
