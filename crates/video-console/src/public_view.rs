//! Public, read-only view of a published video and its chat assistant.

use crate::api::{ApiError, VideoApi};
use crate::markdown;
use crate::mindmap::{self, MindmapNode};
use crate::notify::{Notification, Notifier};
use crate::transcript::TranscriptTimeline;
use shared::{ChatRole, ChatTurn, PublicVideoData, QuizData, VideoTranscript};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NOT_FOUND_MESSAGE: &str = "The requested video was not found or is not public.";
pub const QUIZ_UNAVAILABLE_MESSAGE: &str = "Quiz data is not available.";

pub struct PublicVideoSession {
    api: Arc<dyn VideoApi>,
    slug: String,
    history_limit: usize,
    video: PublicVideoData,
    transcript: VideoTranscript,
    chat: Vec<ChatTurn>,
    chat_in_flight: bool,
}

impl PublicVideoSession {
    /// Fetch a published video by slug and open a chat with its greeting.
    ///
    /// Failures are reported through `notifier` and returned as the
    /// user-facing message.
    pub async fn load(
        api: Arc<dyn VideoApi>,
        notifier: &dyn Notifier,
        slug: &str,
        history_limit: usize,
    ) -> Result<Self, String> {
        match api.get_public_video(slug).await {
            Ok(video) => {
                info!(slug = slug, filename = %video.filename, "Public video loaded");
                let transcript = video.transcript.clone().unwrap_or_default();
                let greeting = ChatTurn::assistant(format!(
                    "I'm ready to answer questions about the video \"{}\".",
                    video.filename
                ));
                Ok(Self {
                    api,
                    slug: slug.to_string(),
                    history_limit: history_limit.max(1),
                    video,
                    transcript,
                    chat: vec![greeting],
                    chat_in_flight: false,
                })
            }
            Err(err) => {
                let message = load_failure_message(&err);
                notifier.notify(Notification::error(message.clone()));
                Err(message)
            }
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn video(&self) -> &PublicVideoData {
        &self.video
    }

    pub fn transcript(&self) -> &VideoTranscript {
        &self.transcript
    }

    pub fn timeline(&self) -> TranscriptTimeline {
        TranscriptTimeline::new(&self.transcript)
    }

    pub fn quiz(&self) -> Result<&QuizData, &'static str> {
        self.video.quiz_data.as_ref().ok_or(QUIZ_UNAVAILABLE_MESSAGE)
    }

    pub fn mindmap(&self) -> Result<MindmapNode, &'static str> {
        self.video
            .mindmap_data
            .as_deref()
            .and_then(|md| mindmap::parse(md, &self.video.filename))
            .ok_or(mindmap::UNAVAILABLE_MESSAGE)
    }

    pub fn chat_history(&self) -> &[ChatTurn] {
        &self.chat
    }

    pub fn is_chat_loading(&self) -> bool {
        self.chat_in_flight
    }

    /// Ask the assistant a question.
    ///
    /// Blank questions are ignored. The last `history_limit` turns, the new
    /// question included, go with the request. A failed request becomes an
    /// apology in the conversation. Returns the appended answer.
    pub async fn send_message(&mut self, question: &str) -> Option<&ChatTurn> {
        if question.trim().is_empty() || self.chat_in_flight {
            return None;
        }

        self.chat.push(ChatTurn::user(question));
        let start = self.chat.len().saturating_sub(self.history_limit);
        let history = self.chat[start..].to_vec();
        debug!(slug = %self.slug, turns = history.len(), "Sending chat question");

        self.chat_in_flight = true;
        let answer = match self.api.chat(&self.slug, question, &history).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(slug = %self.slug, error = %err, "Chat request failed");
                format!("Sorry, I encountered an error: {}", err)
            }
        };
        self.chat_in_flight = false;

        self.chat.push(ChatTurn::assistant(answer));
        self.chat.last()
    }
}

/// Chat turn rendered for display; assistant turns carry simple markdown
pub fn render_turn_html(turn: &ChatTurn) -> String {
    match turn.role {
        ChatRole::Assistant => markdown::render_html(&turn.content),
        ChatRole::User => turn
            .content
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    }
}

fn load_failure_message(err: &ApiError) -> String {
    if err.is_not_found() {
        NOT_FOUND_MESSAGE.to_string()
    } else {
        format!("Error loading public video: {}", err)
    }
}
