//! Analysis worker - runs provider calls on separate thread(s).

use std::sync::Arc;

use flume::{Receiver, Sender};
use log::debug;

use super::provider::{AnalysisProvider, Summarizer};
use super::request::{AnalysisRequest, AnalysisResponse, RequestKind};

/// Pull requests off the shared queue and call the collaborators.
///
/// Blocking inside the worker keeps the caller's thread non-blocking; the
/// service polls responses on its own schedule.
pub fn analysis_worker(
    provider: &Arc<dyn AnalysisProvider>,
    summarizer: &Arc<dyn Summarizer>,
    requests: &Receiver<AnalysisRequest>,
    responses: &Sender<AnalysisResponse>,
) {
    while let Ok(request) = requests.recv() {
        match request {
            AnalysisRequest::Explain {
                id,
                capture_id,
                image,
            } => {
                let response = match provider.analyze(Some(&image), None, &[]) {
                    Ok(reply) => AnalysisResponse::Explained {
                        id,
                        capture_id,
                        text: reply.text,
                    },
                    Err(error) => AnalysisResponse::Failed {
                        id,
                        capture_id,
                        error,
                        during: RequestKind::Explain,
                    },
                };
                let _ = responses.send(response);
            }

            AnalysisRequest::FollowUp {
                id,
                capture_id,
                question,
                history,
            } => {
                let response = match provider.analyze(None, Some(&question), &history) {
                    Ok(reply) => AnalysisResponse::Answered {
                        id,
                        capture_id,
                        text: reply.text,
                    },
                    Err(error) => AnalysisResponse::Failed {
                        id,
                        capture_id,
                        error,
                        during: RequestKind::FollowUp,
                    },
                };
                let _ = responses.send(response);
            }

            AnalysisRequest::Summarize {
                id,
                capture_id,
                transcript,
            } => {
                let response = match summarizer.summarize(&transcript) {
                    Ok(reply) => AnalysisResponse::Summarized {
                        id,
                        capture_id,
                        text: reply.text,
                    },
                    Err(error) => AnalysisResponse::Failed {
                        id,
                        capture_id,
                        error,
                        during: RequestKind::Summarize,
                    },
                };
                let _ = responses.send(response);
            }

            AnalysisRequest::Shutdown => {
                debug!("analysis worker shutting down");
                break;
            }
        }
    }
}
