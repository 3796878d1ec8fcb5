//! Session orchestration for the two interaction channels.
//!
//! A [`Session`] owns the process-local message log and drives the chat and
//! damage-analysis channels through their `Idle -> Pending -> Idle` cycle.
//! Dispatch and resolution are split: `submit_*` guards the transition,
//! appends what belongs to submission time, and hands back a detached call
//! that can be awaited outside the session, so both channels may be in
//! flight at once while the session itself is only touched between awaits.
//!
//! The log is reset on session restart and never persisted.

use crate::analysis::DamageAnalysisHandler;
use crate::chat::ChatHandler;
use crate::error::ErrorReport;
use crate::models::{AnalysisResult, Author, ImageAttachment, Message, MessageKind};
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

/// Fixed reply appended when a call fails; the classified detail is logged,
/// not shown.
const ERROR_REPLY: &str =
    "Sorry, I encountered an error. Please make sure your Gemini API key is configured correctly.";

const UPLOAD_TEXT: &str = "Uploaded an image for damage analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Pending,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a call is already in flight on this channel")]
    ChannelBusy,
    #[error("message input is empty")]
    EmptyInput,
    #[error("no image selected")]
    NoImageSelected,
}

/// Chat call dispatched from a session, detached so it can be awaited while
/// the session handles other channels.
pub struct ChatCall {
    handler: ChatHandler,
    text: String,
}

impl ChatCall {
    pub async fn run(self) -> Result<String, ErrorReport> {
        self.handler.handle(&self.text).await
    }
}

impl std::fmt::Debug for ChatCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCall").field("text", &self.text).finish()
    }
}

/// Damage-analysis call dispatched from a session; the image payload is
/// captured at submission time.
pub struct AnalysisCall {
    handler: DamageAnalysisHandler,
    image: ImageAttachment,
}

impl AnalysisCall {
    pub async fn run(self) -> Result<AnalysisResult, ErrorReport> {
        self.handler
            .handle(&self.image.data, &self.image.mime_type)
            .await
    }
}

impl std::fmt::Debug for AnalysisCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCall")
            .field("image", &self.image)
            .finish()
    }
}

pub struct Session {
    chat: ChatHandler,
    analysis: DamageAnalysisHandler,
    messages: Vec<Message>,
    chat_state: ChannelState,
    analysis_state: ChannelState,
    input: String,
    selected_image: Option<ImageAttachment>,
    pending_upload: Option<Uuid>,
    last_id: i64,
}

impl Session {
    pub fn new(chat: ChatHandler, analysis: DamageAnalysisHandler) -> Self {
        Self {
            chat,
            analysis,
            messages: Vec::new(),
            chat_state: ChannelState::Idle,
            analysis_state: ChannelState::Idle,
            input: String::new(),
            selected_image: None,
            pending_upload: None,
            last_id: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn chat_state(&self) -> ChannelState {
        self.chat_state
    }

    pub fn analysis_state(&self) -> ChannelState {
        self.analysis_state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn select_image(&mut self, data: Vec<u8>, mime_type: impl Into<String>) {
        self.selected_image = Some(ImageAttachment::new(data, mime_type));
    }

    pub fn selected_image(&self) -> Option<&ImageAttachment> {
        self.selected_image.as_ref()
    }

    /// Models a page reload: the log and all transient state are gone.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.chat_state = ChannelState::Idle;
        self.analysis_state = ChannelState::Idle;
        self.input.clear();
        self.selected_image = None;
        self.pending_upload = None;
    }

    /// IDs are creation-time-derived (millisecond clock) and strictly
    /// monotonic; a clock tie bumps past the previous ID.
    fn next_message_id(&mut self) -> i64 {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }

    /// `Idle --submit--> Pending` for the chat channel.
    ///
    /// Appends the user message immediately; the input field is cleared only
    /// when the call later resolves successfully.
    pub fn submit_chat(&mut self) -> Result<ChatCall, SubmitError> {
        if self.chat_state == ChannelState::Pending {
            return Err(SubmitError::ChannelBusy);
        }
        if self.input.trim().is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        let text = self.input.clone();
        self.chat_state = ChannelState::Pending;

        let id = self.next_message_id();
        self.messages.push(Message::plain(id, Author::User, &*text));

        Ok(ChatCall {
            handler: self.chat.clone(),
            text,
        })
    }

    /// `Pending --resolved--> Idle` for the chat channel.
    pub fn resolve_chat(&mut self, outcome: Result<String, ErrorReport>) -> &Message {
        let text = match outcome {
            Ok(text) => {
                self.input.clear();
                text
            }
            Err(report) => {
                tracing::warn!(
                    category = ?report.category,
                    "Chat call failed: {}",
                    report.human_message
                );
                ERROR_REPLY.to_string()
            }
        };

        let id = self.next_message_id();
        self.messages.push(Message::plain(id, Author::Assistant, text));
        self.chat_state = ChannelState::Idle;

        self.messages.last().expect("assistant message just appended")
    }

    /// Submit, await, and resolve in sequence on the chat channel.
    pub async fn send_chat(&mut self) -> Result<(), SubmitError> {
        let call = self.submit_chat()?;
        let outcome = call.run().await;
        self.resolve_chat(outcome);
        Ok(())
    }

    /// `Idle --submit--> Pending` for the analysis channel.
    ///
    /// The image payload is captured here; no messages are appended until
    /// resolution, where the damage-report pair lands atomically.
    pub fn submit_analysis(&mut self) -> Result<AnalysisCall, SubmitError> {
        if self.analysis_state == ChannelState::Pending {
            return Err(SubmitError::ChannelBusy);
        }
        let image = self
            .selected_image
            .clone()
            .ok_or(SubmitError::NoImageSelected)?;

        self.analysis_state = ChannelState::Pending;
        self.pending_upload = Some(image.id);

        Ok(AnalysisCall {
            handler: self.analysis.clone(),
            image,
        })
    }

    /// `Pending --resolved--> Idle` for the analysis channel.
    ///
    /// Appends the user upload and the assistant reply together — never one
    /// without the other — and clears the selected image unconditionally.
    pub fn resolve_analysis(&mut self, outcome: Result<AnalysisResult, ErrorReport>) -> &[Message] {
        let image_ref = self.pending_upload.take();

        let upload_id = self.next_message_id();
        let mut upload = Message::plain(upload_id, Author::User, UPLOAD_TEXT);
        upload.kind = MessageKind::DamageReport;
        upload.image_ref = image_ref;

        let reply_id = self.next_message_id();
        let reply = match outcome {
            Ok(result) => {
                let mut reply = Message::plain(reply_id, Author::Assistant, &*result.damage_analysis);
                reply.kind = MessageKind::DamageReport;
                reply.damage_analysis = Some(result.damage_analysis);
                reply.prevention_instructions = Some(result.prevention_instructions);
                reply
            }
            Err(report) => {
                tracing::warn!(
                    category = ?report.category,
                    "Analysis call failed: {}",
                    report.human_message
                );
                Message::plain(reply_id, Author::Assistant, ERROR_REPLY)
            }
        };

        self.messages.push(upload);
        self.messages.push(reply);

        self.selected_image = None;
        self.analysis_state = ChannelState::Idle;

        let len = self.messages.len();
        &self.messages[len - 2..]
    }

    /// Submit, await, and resolve in sequence on the analysis channel.
    pub async fn send_analysis(&mut self) -> Result<(), SubmitError> {
        let call = self.submit_analysis()?;
        let outcome = call.run().await;
        self.resolve_analysis(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerationClient;
    use std::sync::Arc;

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

    fn session_with(mock: MockGenerationClient) -> Session {
        let service: Arc<dyn crate::ai::GenerationService> = Arc::new(mock);
        Session::new(
            ChatHandler::new(service.clone()),
            DamageAnalysisHandler::new(service),
        )
    }

    #[tokio::test]
    async fn test_chat_success_appends_user_then_assistant() {
        let mut session = session_with(MockGenerationClient::new().with_response("Hi there"));
        session.set_input("Hello");
        session.send_chat().await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author, Author::User);
        assert_eq!(messages[0].text, "Hello");
        assert_eq!(messages[1].author, Author::Assistant);
        assert_eq!(messages[1].text, "Hi there");
        assert_eq!(session.input(), "");
        assert_eq!(session.chat_state(), ChannelState::Idle);
    }

    #[tokio::test]
    async fn test_chat_failure_appends_apology_and_keeps_input() {
        let mut session =
            session_with(MockGenerationClient::new().with_failure("quota exceeded"));
        session.set_input("Hello");
        session.send_chat().await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].author, Author::Assistant);
        assert!(messages[1].text.starts_with("Sorry, I encountered an error"));
        assert_eq!(session.input(), "Hello");
        assert_eq!(session.chat_state(), ChannelState::Idle);
    }

    #[tokio::test]
    async fn test_empty_input_is_refused() {
        let mut session = session_with(MockGenerationClient::new());
        session.set_input("   ");
        assert_eq!(session.submit_chat().unwrap_err(), SubmitError::EmptyInput);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_reentrant_chat_submission_is_blocked_while_pending() {
        let mut session = session_with(MockGenerationClient::new().with_response("Hi"));
        session.set_input("Hello");
        let call = session.submit_chat().unwrap();
        assert_eq!(session.chat_state(), ChannelState::Pending);

        session.set_input("Again");
        assert_eq!(session.submit_chat().unwrap_err(), SubmitError::ChannelBusy);

        let outcome = call.run().await;
        session.resolve_chat(outcome);
        assert_eq!(session.chat_state(), ChannelState::Idle);
    }

    #[tokio::test]
    async fn test_analysis_success_appends_pair_atomically() {
        let mut session = session_with(
            MockGenerationClient::new()
                .with_response("Cracks detected")
                .with_response("Seal cracks promptly"),
        );
        session.select_image(PNG_BYTES.to_vec(), "image/png");
        let image_ref = session.selected_image().unwrap().id;
        session.send_analysis().await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author, Author::User);
        assert_eq!(messages[0].kind, MessageKind::DamageReport);
        assert_eq!(messages[0].image_ref, Some(image_ref));
        assert_eq!(messages[1].author, Author::Assistant);
        assert_eq!(messages[1].damage_analysis.as_deref(), Some("Cracks detected"));
        assert_eq!(
            messages[1].prevention_instructions.as_deref(),
            Some("Seal cracks promptly")
        );
        assert!(session.selected_image().is_none());
    }

    #[tokio::test]
    async fn test_analysis_failure_still_appends_pair_and_clears_image() {
        let mut session =
            session_with(MockGenerationClient::new().with_failure("PERMISSION_DENIED"));
        session.select_image(PNG_BYTES.to_vec(), "image/png");
        session.send_analysis().await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author, Author::User);
        assert!(messages[1].text.starts_with("Sorry, I encountered an error"));
        assert!(messages[1].damage_analysis.is_none());
        assert!(session.selected_image().is_none());
        assert_eq!(session.analysis_state(), ChannelState::Idle);
    }

    #[tokio::test]
    async fn test_analysis_without_image_is_refused() {
        let mut session = session_with(MockGenerationClient::new());
        assert_eq!(
            session.submit_analysis().unwrap_err(),
            SubmitError::NoImageSelected
        );
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_both_channels_can_be_pending_simultaneously() {
        let mut session = session_with(
            MockGenerationClient::new()
                .with_response("Hi there")
                .with_response("Cracks detected")
                .with_response("Seal cracks promptly"),
        );

        session.set_input("Hello");
        session.select_image(PNG_BYTES.to_vec(), "image/png");

        let chat_call = session.submit_chat().unwrap();
        let analysis_call = session.submit_analysis().unwrap();
        assert_eq!(session.chat_state(), ChannelState::Pending);
        assert_eq!(session.analysis_state(), ChannelState::Pending);

        let (chat_outcome, analysis_outcome) =
            tokio::join!(chat_call.run(), analysis_call.run());
        session.resolve_chat(chat_outcome);
        session.resolve_analysis(analysis_outcome);

        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.chat_state(), ChannelState::Idle);
        assert_eq!(session.analysis_state(), ChannelState::Idle);
    }

    #[tokio::test]
    async fn test_message_ids_are_strictly_monotonic() {
        let mut session = session_with(MockGenerationClient::new().with_response("reply"));
        for turn in 0..3 {
            session.set_input(format!("message {turn}"));
            session.send_chat().await.unwrap();
        }

        let ids: Vec<i64> = session.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_reset_clears_the_log() {
        let mut session = session_with(MockGenerationClient::new().with_response("Hi"));
        session.set_input("Hello");
        session.send_chat().await.unwrap();
        assert!(!session.messages().is_empty());

        session.reset();
        assert!(session.messages().is_empty());
        assert_eq!(session.input(), "");
        assert_eq!(session.chat_state(), ChannelState::Idle);
    }
}
