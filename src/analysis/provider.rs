//! The analysis collaborator boundary.
//!
//! Providers are stateless request/response collaborators: all memory lives
//! in the conversation session and is replayed on every call. The interface
//! is deliberately narrow (`{ text }`); whatever schema a concrete provider
//! speaks stays on its side of the trait.

use serde::{Deserialize, Serialize};

use crate::capture::Capture;

/// Who authored a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Label used when formatting transcripts for summarization.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::User => "User",
            ChatRole::Assistant => "AI",
        }
    }
}

/// One prior turn, replayed as context on follow-up calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub text: String,
}

/// The only thing the core reads out of a provider response.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisReply {
    pub text: String,
}

/// Errors from the analysis/summarization collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisFault {
    #[error("analysis provider: {detail}")]
    Provider { detail: String },

    #[error("analysis request timed out")]
    Timeout,
}

impl AnalysisFault {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider { detail: msg.into() }
    }
}

/// Capability: explain an image region and answer follow-up questions.
pub trait AnalysisProvider: Send + Sync {
    /// Either `image` (initial explanation) or `question` (follow-up with
    /// `history` replayed in full) is present on every call.
    fn analyze(
        &self,
        image: Option<&Capture>,
        question: Option<&str>,
        history: &[HistoryEntry],
    ) -> Result<AnalysisReply, AnalysisFault>;
}

/// Capability: compress a role-labeled transcript into a short summary.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, transcript: &str) -> Result<AnalysisReply, AnalysisFault>;
}
