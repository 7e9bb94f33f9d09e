//! Analysis service - manages the worker pool and in-flight requests.

use std::collections::HashMap;
use std::sync::Arc;

use flume::{Receiver, Sender};

use crate::capture::Capture;

use super::DEFAULT_ANALYSIS_WORKERS;
use super::provider::{AnalysisProvider, HistoryEntry, Summarizer};
use super::request::{AnalysisRequest, AnalysisResponse, RequestId};
use super::worker::analysis_worker;

#[derive(Debug)]
enum PendingKind {
    Explain,
    FollowUp,
    Summarize,
}

#[derive(Debug)]
struct PendingRequest {
    capture_id: String,
    kind: PendingKind,
}

/// Dispatches collaborator calls to worker threads and polls completions.
pub struct AnalysisService {
    request_tx: Sender<AnalysisRequest>,
    response_rx: Receiver<AnalysisResponse>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, PendingRequest>,
    num_workers: usize,
}

impl AnalysisService {
    /// Create a service with the default worker count
    #[must_use]
    pub fn new(provider: Arc<dyn AnalysisProvider>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self::with_workers(provider, summarizer, DEFAULT_ANALYSIS_WORKERS)
    }

    /// Create a service with a custom worker count
    #[must_use]
    pub fn with_workers(
        provider: Arc<dyn AnalysisProvider>,
        summarizer: Arc<dyn Summarizer>,
        num_workers: usize,
    ) -> Self {
        // Flume gives us the MPMC channel the worker fan-out needs:
        // every worker clones the receiver and pulls from one shared queue.
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        for _ in 0..num_workers.max(1) {
            let provider = provider.clone();
            let summarizer = summarizer.clone();
            let rx = request_rx.clone();
            let tx = response_tx.clone();

            std::thread::spawn(move || {
                analysis_worker(&provider, &summarizer, &rx, &tx);
            });
        }

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            pending_requests: HashMap::new(),
            num_workers: num_workers.max(1),
        }
    }

    /// Queue the initial explanation of a capture
    pub fn request_explain(&mut self, capture_id: &str, image: Capture) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(AnalysisRequest::Explain {
            id,
            capture_id: capture_id.to_string(),
            image,
        });
        self.track(id, capture_id, PendingKind::Explain);
        id
    }

    /// Queue a follow-up question with the full session history
    pub fn request_follow_up(
        &mut self,
        capture_id: &str,
        question: &str,
        history: Vec<HistoryEntry>,
    ) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(AnalysisRequest::FollowUp {
            id,
            capture_id: capture_id.to_string(),
            question: question.to_string(),
            history,
        });
        self.track(id, capture_id, PendingKind::FollowUp);
        id
    }

    /// Queue a transcript summarization
    pub fn request_summary(&mut self, capture_id: &str, transcript: &str) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(AnalysisRequest::Summarize {
            id,
            capture_id: capture_id.to_string(),
            transcript: transcript.to_string(),
        });
        self.track(id, capture_id, PendingKind::Summarize);
        id
    }

    /// True if any analysis (non-summary) request for this capture is in flight.
    #[must_use]
    pub fn has_outstanding_analysis(&self, capture_id: &str) -> bool {
        self.pending_requests.values().any(|p| {
            p.capture_id == capture_id && !matches!(p.kind, PendingKind::Summarize)
        })
    }

    /// Poll for completed responses without blocking
    pub fn poll_responses(&mut self) -> Vec<AnalysisResponse> {
        let mut responses = vec![];

        while let Ok(response) = self.response_rx.try_recv() {
            let id = match &response {
                AnalysisResponse::Explained { id, .. }
                | AnalysisResponse::Answered { id, .. }
                | AnalysisResponse::Summarized { id, .. }
                | AnalysisResponse::Failed { id, .. } => *id,
            };
            self.pending_requests.remove(&id);
            responses.push(response);
        }

        responses
    }

    /// Get the response receiver for async usage
    #[must_use]
    pub fn response_receiver(&self) -> &Receiver<AnalysisResponse> {
        &self.response_rx
    }

    /// Number of requests still in flight
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending_requests.len()
    }

    /// Shutdown all workers
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(AnalysisRequest::Shutdown);
        }
    }

    fn track(&mut self, id: RequestId, capture_id: &str, kind: PendingKind) {
        self.pending_requests.insert(
            id,
            PendingRequest {
                capture_id: capture_id.to_string(),
                kind,
            },
        );
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for AnalysisService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::analysis::provider::{AnalysisFault, AnalysisReply};

    struct EchoProvider;

    impl AnalysisProvider for EchoProvider {
        fn analyze(
            &self,
            image: Option<&Capture>,
            question: Option<&str>,
            history: &[HistoryEntry],
        ) -> Result<AnalysisReply, AnalysisFault> {
            let text = match (image, question) {
                (Some(img), _) => format!("image {}x{}", img.width, img.height),
                (None, Some(q)) => format!("answer[{}]: {q}", history.len()),
                _ => return Err(AnalysisFault::provider("empty request")),
            };
            Ok(AnalysisReply { text })
        }
    }

    impl Summarizer for EchoProvider {
        fn summarize(&self, transcript: &str) -> Result<AnalysisReply, AnalysisFault> {
            Ok(AnalysisReply {
                text: format!("summary of {} chars", transcript.len()),
            })
        }
    }

    fn capture() -> Capture {
        Capture {
            width: 4,
            height: 2,
            png: vec![1, 2, 3],
        }
    }

    fn wait_for_responses(service: &mut AnalysisService, count: usize) -> Vec<AnalysisResponse> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut all = vec![];
        while all.len() < count && Instant::now() < deadline {
            all.extend(service.poll_responses());
            std::thread::sleep(Duration::from_millis(2));
        }
        all
    }

    #[test]
    fn explain_round_trip() {
        let provider = Arc::new(EchoProvider);
        let mut service = AnalysisService::with_workers(provider.clone(), provider, 1);

        service.request_explain("cap-1", capture());
        assert!(service.has_outstanding_analysis("cap-1"));

        let responses = wait_for_responses(&mut service, 1);
        assert_eq!(responses.len(), 1);
        match &responses[0] {
            AnalysisResponse::Explained { capture_id, text, .. } => {
                assert_eq!(capture_id, "cap-1");
                assert_eq!(text, "image 4x2");
            }
            other => panic!("unexpected response: {other:?}"),
        }
        assert!(!service.has_outstanding_analysis("cap-1"));
    }

    #[test]
    fn follow_up_carries_history() {
        let provider = Arc::new(EchoProvider);
        let mut service = AnalysisService::with_workers(provider.clone(), provider, 1);

        let history = vec![HistoryEntry {
            role: crate::analysis::ChatRole::Assistant,
            text: "seed".to_string(),
        }];
        service.request_follow_up("cap-2", "why?", history);

        let responses = wait_for_responses(&mut service, 1);
        match &responses[0] {
            AnalysisResponse::Answered { text, .. } => assert_eq!(text, "answer[1]: why?"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn summary_is_not_outstanding_analysis() {
        let provider = Arc::new(EchoProvider);
        let mut service = AnalysisService::with_workers(provider.clone(), provider, 1);

        service.request_summary("cap-3", "User: hi\n\nAI: hello");
        assert!(!service.has_outstanding_analysis("cap-3"));

        let responses = wait_for_responses(&mut service, 1);
        assert!(matches!(
            responses[0],
            AnalysisResponse::Summarized { .. }
        ));
    }
}
