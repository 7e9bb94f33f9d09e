//! Conversation sessions keyed by capture id.
//!
//! Every extracted region owns one session: an append-only transcript that
//! is replayed in full on each collaborator call, plus a summary cached
//! until the next turn invalidates it. The gallery keeps sessions in
//! capture order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;

use crate::analysis::{AnalysisFault, ChatRole, HistoryEntry, Summarizer};
use crate::capture::Capture;

/// Inert assistant turn shown when a collaborator call fails.
pub const ANALYSIS_FAILURE_NOTICE: &str =
    "Sorry, I couldn't process your request. Please try again.";

/// One turn of a capture's conversation.
#[derive(Clone, Debug)]
pub struct ConversationTurn {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Data URL of the capture, attached to the seeding turn only.
    pub image: Option<String>,
}

/// Session operations that can be refused.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no session for that capture")]
    UnknownCapture,

    #[error("a reply is still pending for this session")]
    ReplyPending,
}

/// A capture with its conversation state.
pub struct CaptureSession {
    capture_id: String,
    image: Capture,
    created_at: DateTime<Utc>,
    turns: Vec<ConversationTurn>,
    summary: Option<String>,
    awaiting_reply: bool,
}

impl CaptureSession {
    fn new(capture_id: String, image: Capture) -> Self {
        Self {
            capture_id,
            image,
            created_at: Utc::now(),
            turns: Vec::new(),
            summary: None,
            awaiting_reply: true,
        }
    }

    #[must_use]
    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }

    #[must_use]
    pub fn image(&self) -> &Capture {
        &self.image
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// True until the initial explanation arrives.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        !self.turns.is_empty()
    }

    /// True while a collaborator reply for this session is outstanding.
    #[must_use]
    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    #[must_use]
    pub fn cached_summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The full transcript as collaborator context, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.turns
            .iter()
            .map(|turn| HistoryEntry {
                role: turn.role,
                text: turn.text.clone(),
            })
            .collect()
    }

    /// Role-labeled transcript for summarization.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.summary = None;
    }
}

/// Gallery of capture sessions, in capture order.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<String, CaptureSession>,
    order: Vec<String>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capture whose initial explanation is in flight.
    pub fn create_pending(&mut self, capture_id: &str, image: Capture) {
        self.sessions
            .insert(capture_id.to_string(), CaptureSession::new(capture_id.to_string(), image));
        self.order.push(capture_id.to_string());
    }

    /// Seed a session with the initial explanation, attaching the capture
    /// image to the turn. Returns false if the capture is gone.
    pub fn seed(&mut self, capture_id: &str, text: &str, turn_id: String) -> bool {
        let Some(session) = self.sessions.get_mut(capture_id) else {
            return false;
        };
        let image = session.image.to_data_url();
        session.push(ConversationTurn {
            id: turn_id,
            role: ChatRole::Assistant,
            text: text.to_string(),
            timestamp: Utc::now(),
            image: Some(image),
        });
        session.awaiting_reply = false;
        true
    }

    /// Append a user turn and mark the session as awaiting a reply.
    ///
    /// Refused while a prior reply is outstanding so role alternation in
    /// the replayed history stays well-formed.
    pub fn append_user(
        &mut self,
        capture_id: &str,
        text: &str,
        turn_id: String,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(capture_id)
            .ok_or(SessionError::UnknownCapture)?;
        if session.awaiting_reply {
            return Err(SessionError::ReplyPending);
        }
        session.push(ConversationTurn {
            id: turn_id,
            role: ChatRole::User,
            text: text.to_string(),
            timestamp: Utc::now(),
            image: None,
        });
        session.awaiting_reply = true;
        Ok(())
    }

    /// Append an assistant turn, resolving the pending reply. Returns false
    /// if the capture is gone.
    pub fn append_assistant(&mut self, capture_id: &str, text: &str, turn_id: String) -> bool {
        let Some(session) = self.sessions.get_mut(capture_id) else {
            return false;
        };
        session.push(ConversationTurn {
            id: turn_id,
            role: ChatRole::Assistant,
            text: text.to_string(),
            timestamp: Utc::now(),
            image: None,
        });
        session.awaiting_reply = false;
        true
    }

    /// Cache a computed summary. Returns false if the capture is gone.
    pub fn set_summary(&mut self, capture_id: &str, summary: &str) -> bool {
        let Some(session) = self.sessions.get_mut(capture_id) else {
            return false;
        };
        session.summary = Some(summary.to_string());
        true
    }

    /// Return the cached summary, or compute and cache one through the
    /// collaborator. The cache lives until the next appended turn.
    pub fn summarize_with(
        &mut self,
        capture_id: &str,
        summarizer: &dyn Summarizer,
    ) -> Result<String, AnalysisFault> {
        let session = self
            .sessions
            .get_mut(capture_id)
            .ok_or_else(|| AnalysisFault::provider("no session for that capture"))?;

        if let Some(cached) = &session.summary {
            return Ok(cached.clone());
        }
        let reply = summarizer.summarize(&session.transcript())?;
        session.summary = Some(reply.text.clone());
        Ok(reply.text)
    }

    /// Drop a capture and its conversation. Later responses for this id
    /// become stale and are discarded by the caller.
    pub fn remove(&mut self, capture_id: &str) -> bool {
        if self.sessions.remove(capture_id).is_none() {
            return false;
        }
        self.order.retain(|id| id != capture_id);
        debug!("removed capture session {capture_id}");
        true
    }

    #[must_use]
    pub fn get(&self, capture_id: &str) -> Option<&CaptureSession> {
        self.sessions.get(capture_id)
    }

    #[must_use]
    pub fn contains(&self, capture_id: &str) -> bool {
        self.sessions.contains_key(capture_id)
    }

    /// Capture ids in creation order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
