//! Analysis request and response types.

use crate::capture::Capture;

use super::provider::{AnalysisFault, HistoryEntry};

/// Unique identifier for analysis requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to analysis workers.
///
/// Every variant carries the capture id it belongs to; responses are
/// matched back by that id, never by "current" UI state.
#[derive(Debug)]
pub enum AnalysisRequest {
    /// Initial explanation of a freshly extracted region
    Explain {
        id: RequestId,
        capture_id: String,
        image: Capture,
    },

    /// Follow-up question with the session transcript replayed in full
    FollowUp {
        id: RequestId,
        capture_id: String,
        question: String,
        history: Vec<HistoryEntry>,
    },

    /// Summarize a role-labeled transcript
    Summarize {
        id: RequestId,
        capture_id: String,
        transcript: String,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Which collaborator call a request performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Explain,
    FollowUp,
    Summarize,
}

/// Response from analysis workers
#[derive(Debug)]
pub enum AnalysisResponse {
    /// Initial explanation text for a capture
    Explained {
        id: RequestId,
        capture_id: String,
        text: String,
    },

    /// Answer to a follow-up question
    Answered {
        id: RequestId,
        capture_id: String,
        text: String,
    },

    /// Summary of a session transcript
    Summarized {
        id: RequestId,
        capture_id: String,
        text: String,
    },

    /// The collaborator call failed
    Failed {
        id: RequestId,
        capture_id: String,
        error: AnalysisFault,
        during: RequestKind,
    },
}

impl AnalysisResponse {
    /// The capture this response belongs to.
    #[must_use]
    pub fn capture_id(&self) -> &str {
        match self {
            AnalysisResponse::Explained { capture_id, .. }
            | AnalysisResponse::Answered { capture_id, .. }
            | AnalysisResponse::Summarized { capture_id, .. }
            | AnalysisResponse::Failed { capture_id, .. } => capture_id,
        }
    }
}
