//! Reading session orchestration.
//!
//! Ties the pieces together: pointer events drive the selection store; a
//! successful commit extracts the region from the cached page render and
//! queues exactly one analysis request; responses are matched back by
//! capture id when they arrive, so a slow reply can never land on state
//! the user has since moved away from.

use std::sync::Arc;

use log::{debug, warn};

use crate::analysis::{
    AnalysisFault, AnalysisProvider, AnalysisResponse, AnalysisService, RequestKind, Summarizer,
};
use crate::capture::{CaptureFault, extract_region};
use crate::ids::IdGenerator;
use crate::render::{CacheKey, PageCache, PageRenderer, RasterSurface, RenderFault};
use crate::select::{
    DragCommit, OverlapPolicy, SelectionRect, SelectionStore, Zoom, delete_affordance_hit,
};
use crate::session::{ANALYSIS_FAILURE_NOTICE, SessionError, SessionStore};

/// Tunables for a reading session.
#[derive(Clone, Copy, Debug)]
pub struct ReaderConfig {
    pub min_selection_size: f32,
    pub overlap_policy: OverlapPolicy,
    pub page_cache_size: usize,
    pub analysis_workers: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            min_selection_size: 10.0,
            overlap_policy: OverlapPolicy::default(),
            page_cache_size: 8,
            analysis_workers: crate::analysis::DEFAULT_ANALYSIS_WORKERS,
        }
    }
}

/// Outcome of releasing a selection drag.
#[derive(Debug)]
pub enum CommitResult {
    /// Selection committed; its capture is on its way to the collaborator.
    Analyzing {
        capture_id: String,
        selection: SelectionRect,
    },
    /// Selection committed but the page surface could not be captured; the
    /// selection stays, nothing is analyzed.
    CaptureFailed {
        selection: SelectionRect,
        fault: CaptureFault,
    },
    /// Nothing was committed (sub-material, overlapping, or stale drag).
    Discarded(DragCommit),
}

/// What the pointer is currently over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverTarget {
    None,
    /// Inside a committed selection.
    Selection(String),
    /// Inside the hovered selection's delete affordance.
    DeleteZone(String),
}

/// State changes produced by polling collaborator responses.
#[derive(Clone, Debug, PartialEq)]
pub enum ReaderEvent {
    /// A capture's initial explanation arrived and seeded its session.
    ExplanationReady { capture_id: String },
    /// A follow-up answer was appended.
    ReplyReady { capture_id: String },
    /// A fresh summary was cached.
    SummaryReady { capture_id: String },
    /// A collaborator call failed; for analysis calls an inert notice turn
    /// was appended to the session.
    AnalysisFailed {
        capture_id: String,
        error: AnalysisFault,
    },
    /// A response arrived for a capture that no longer exists.
    StaleResponseDiscarded { capture_id: String },
}

/// One open document with its selections, captures and conversations.
pub struct Reader {
    renderer: Box<dyn PageRenderer>,
    cache: PageCache,
    store: SelectionStore,
    sessions: SessionStore,
    service: AnalysisService,
    ids: Box<dyn IdGenerator>,
    pub zoom: Zoom,
    current_page: u32,
}

impl Reader {
    #[must_use]
    pub fn new(
        renderer: Box<dyn PageRenderer>,
        provider: Arc<dyn AnalysisProvider>,
        summarizer: Arc<dyn Summarizer>,
        ids: Box<dyn IdGenerator>,
        config: ReaderConfig,
    ) -> Self {
        Self {
            renderer,
            cache: PageCache::new(config.page_cache_size),
            store: SelectionStore::new(config.min_selection_size, config.overlap_policy),
            sessions: SessionStore::new(),
            service: AnalysisService::with_workers(provider, summarizer, config.analysis_workers),
            ids,
            zoom: Zoom::default(),
            current_page: 1,
        }
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.renderer.page_count()
    }

    /// Current page, 1-based.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Go to a page, clamped to the document range.
    pub fn go_to_page(&mut self, page: u32) {
        self.current_page = page.clamp(1, self.page_count().max(1));
    }

    #[must_use]
    pub fn selections(&self) -> &SelectionStore {
        &self.store
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// The current page's render surface at the current zoom, cached.
    pub fn surface_for_current(&mut self) -> Result<Arc<RasterSurface>, RenderFault> {
        let key = CacheKey::new(self.current_page, self.zoom.factor());
        if let Some(surface) = self.cache.get(&key) {
            return Ok(surface);
        }
        let surface = self
            .renderer
            .render_page(self.current_page, self.zoom.factor())?;
        Ok(self.cache.insert(key, surface))
    }

    /// Start a selection drag at a screen position. Returns the draft id.
    pub fn begin_selection(&mut self, screen_x: f32, screen_y: f32) -> String {
        let point = self.zoom.viewport().to_document(screen_x, screen_y);
        let id = self.ids.next_id();
        self.store.begin_drag(self.current_page, point, id.clone());
        id
    }

    /// Move the drag's end corner.
    pub fn update_selection(&mut self, draft_id: &str, screen_x: f32, screen_y: f32) -> bool {
        let point = self.zoom.viewport().to_document(screen_x, screen_y);
        self.store.update_drag(draft_id, point)
    }

    /// Release the drag. A material, policy-passing commit triggers exactly
    /// one extraction + analysis request.
    pub fn finish_selection(&mut self, draft_id: &str) -> CommitResult {
        let rect = match self.store.commit_drag(draft_id) {
            DragCommit::Committed(rect) => rect,
            other => return CommitResult::Discarded(other),
        };

        let surface = match self.surface_for_current() {
            Ok(surface) => surface,
            Err(fault) => {
                warn!("page surface unavailable for capture: {fault}");
                return CommitResult::CaptureFailed {
                    selection: rect,
                    fault: CaptureFault::Unavailable,
                };
            }
        };

        match extract_region(&surface, &rect.bounds(), self.zoom.factor()) {
            Ok(capture) => {
                let capture_id = self.ids.next_id();
                self.sessions.create_pending(&capture_id, capture.clone());
                self.service.request_explain(&capture_id, capture);
                CommitResult::Analyzing {
                    capture_id,
                    selection: rect,
                }
            }
            Err(fault) => {
                warn!("capture failed for selection {}: {fault}", rect.id);
                CommitResult::CaptureFailed {
                    selection: rect,
                    fault,
                }
            }
        }
    }

    /// Hit-test a screen position against the current page's selections.
    #[must_use]
    pub fn hover(&self, screen_x: f32, screen_y: f32) -> HoverTarget {
        let viewport = self.zoom.viewport();
        let point = viewport.to_document(screen_x, screen_y);

        // Last inserted wins, mirroring z-order.
        for rect in self.store.selections(self.current_page).iter().rev() {
            let bounds = rect.bounds();
            if !bounds.contains(point) {
                continue;
            }
            return if delete_affordance_hit(screen_x, screen_y, &bounds, &viewport) {
                HoverTarget::DeleteZone(rect.id.clone())
            } else {
                HoverTarget::Selection(rect.id.clone())
            };
        }
        HoverTarget::None
    }

    /// Delete the selection whose affordance is under the pointer, if any.
    pub fn delete_at(&mut self, screen_x: f32, screen_y: f32) -> Option<String> {
        match self.hover(screen_x, screen_y) {
            HoverTarget::DeleteZone(id) => {
                self.store.remove(self.current_page, &id);
                Some(id)
            }
            _ => None,
        }
    }

    /// Clear every selection on the current page.
    pub fn clear_current_page(&mut self) {
        self.store.clear_page(self.current_page);
    }

    /// Drop a capture from the gallery. In-flight responses for it will be
    /// discarded as stale.
    pub fn remove_capture(&mut self, capture_id: &str) -> bool {
        self.sessions.remove(capture_id)
    }

    /// Ask a follow-up question about a capture.
    ///
    /// The session's transcript so far (excluding the new question, which
    /// travels separately) is replayed in full. Refused while a prior reply
    /// is outstanding.
    pub fn ask(&mut self, capture_id: &str, question: &str) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get(capture_id)
            .ok_or(SessionError::UnknownCapture)?;
        let history = session.history();

        let turn_id = self.ids.next_id();
        self.sessions.append_user(capture_id, question, turn_id)?;
        self.service
            .request_follow_up(capture_id, question, history);
        Ok(())
    }

    /// Drain completed collaborator responses into state changes.
    pub fn poll(&mut self) -> Vec<ReaderEvent> {
        let mut events = Vec::new();

        for response in self.service.poll_responses() {
            let capture_id = response.capture_id().to_string();

            if !self.sessions.contains(&capture_id) {
                debug!("discarding stale response for removed capture {capture_id}");
                events.push(ReaderEvent::StaleResponseDiscarded { capture_id });
                continue;
            }

            match response {
                AnalysisResponse::Explained { text, .. } => {
                    let turn_id = self.ids.next_id();
                    self.sessions.seed(&capture_id, &text, turn_id);
                    self.refresh_summary(&capture_id);
                    events.push(ReaderEvent::ExplanationReady { capture_id });
                }

                AnalysisResponse::Answered { text, .. } => {
                    let turn_id = self.ids.next_id();
                    self.sessions.append_assistant(&capture_id, &text, turn_id);
                    self.refresh_summary(&capture_id);
                    events.push(ReaderEvent::ReplyReady { capture_id });
                }

                AnalysisResponse::Summarized { text, .. } => {
                    self.sessions.set_summary(&capture_id, &text);
                    events.push(ReaderEvent::SummaryReady { capture_id });
                }

                AnalysisResponse::Failed { error, during, .. } => {
                    warn!("collaborator call failed for {capture_id}: {error}");
                    if during != RequestKind::Summarize {
                        // Surface the failure as one inert turn; the session
                        // itself stays usable.
                        let turn_id = self.ids.next_id();
                        self.sessions
                            .append_assistant(&capture_id, ANALYSIS_FAILURE_NOTICE, turn_id);
                    }
                    events.push(ReaderEvent::AnalysisFailed { capture_id, error });
                }
            }
        }

        events
    }

    fn refresh_summary(&mut self, capture_id: &str) {
        if let Some(session) = self.sessions.get(capture_id) {
            self.service
                .request_summary(capture_id, &session.transcript());
        }
    }
}
