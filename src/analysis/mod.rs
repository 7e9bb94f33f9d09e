//! Asynchronous bridge to the external analysis collaborators.

mod provider;
mod request;
mod service;
mod worker;

/// Default number of analysis worker threads.
pub const DEFAULT_ANALYSIS_WORKERS: usize = 2;

pub use provider::{
    AnalysisFault, AnalysisProvider, AnalysisReply, ChatRole, HistoryEntry, Summarizer,
};
pub use request::{AnalysisRequest, AnalysisResponse, RequestId, RequestKind};
pub use service::AnalysisService;
pub use worker::analysis_worker;
