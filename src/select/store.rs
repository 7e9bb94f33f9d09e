//! Per-page selection state.
//!
//! The store owns every committed [`SelectionRect`] for the lifetime of the
//! open document, plus at most one in-progress drag. Insertion order within
//! a page is z-order for hit-testing.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::geometry::{self, Point, RectBounds, SelectionRect};

/// What happens when a committed drag overlaps an existing selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Drop commits that overlap an existing selection on the same page.
    #[default]
    Reject,
    /// Accept overlapping selections unconditionally.
    Allow,
}

/// An in-progress drag. Only `end` moves while the pointer is down.
#[derive(Clone, Debug)]
pub struct Draft {
    pub id: String,
    pub page: u32,
    pub start: Point,
    pub end: Point,
}

impl Draft {
    #[must_use]
    pub fn bounds(&self) -> RectBounds {
        RectBounds::from_corners(self.start, self.end)
    }
}

/// Result of releasing a drag.
#[derive(Clone, Debug, PartialEq)]
pub enum DragCommit {
    /// The selection was appended to its page.
    Committed(SelectionRect),
    /// Below the material-size threshold; dropped silently.
    BelowMinimum,
    /// Rejected by [`OverlapPolicy::Reject`]; dropped silently.
    Overlapping,
    /// The draft id did not match the active draft (already released or
    /// superseded by a newer drag).
    Stale,
}

/// Per-page collection of committed selections plus the active draft.
pub struct SelectionStore {
    pages: HashMap<u32, Vec<SelectionRect>>,
    draft: Option<Draft>,
    min_size: f32,
    policy: OverlapPolicy,
}

impl SelectionStore {
    #[must_use]
    pub fn new(min_size: f32, policy: OverlapPolicy) -> Self {
        Self {
            pages: HashMap::new(),
            draft: None,
            min_size,
            policy,
        }
    }

    /// Start a drag at `point`. A still-active previous draft is abandoned;
    /// pointer capture guarantees at most one drag at a time.
    pub fn begin_drag(&mut self, page: u32, point: Point, id: impl Into<String>) -> &Draft {
        if let Some(old) = self.draft.take() {
            debug!("abandoning unfinished draft {}", old.id);
        }
        self.draft = Some(Draft {
            id: id.into(),
            page,
            start: point,
            end: point,
        });
        self.draft.as_ref().expect("draft was just set")
    }

    /// Move the draft's end corner. Returns false if `draft_id` is not the
    /// active draft.
    pub fn update_drag(&mut self, draft_id: &str, point: Point) -> bool {
        match self.draft.as_mut() {
            Some(draft) if draft.id == draft_id => {
                draft.end = point;
                true
            }
            _ => false,
        }
    }

    /// Release the drag. Sub-material drafts and (under the reject policy)
    /// overlapping drafts are dropped without side effects.
    pub fn commit_drag(&mut self, draft_id: &str) -> DragCommit {
        let Some(draft) = self.draft.take_if(|d| d.id == draft_id) else {
            return DragCommit::Stale;
        };

        let bounds = draft.bounds();
        if !bounds.is_material(self.min_size) {
            debug!(
                "dropping sub-material draft {} ({}x{})",
                draft.id, bounds.width, bounds.height
            );
            return DragCommit::BelowMinimum;
        }

        let existing = self.pages.entry(draft.page).or_default();
        if self.policy == OverlapPolicy::Reject
            && existing.iter().any(|r| r.bounds().overlaps(&bounds))
        {
            debug!("dropping overlapping draft {} on page {}", draft.id, draft.page);
            return DragCommit::Overlapping;
        }

        let rect = SelectionRect {
            id: draft.id,
            start: draft.start,
            end: draft.end,
        };
        existing.push(rect.clone());
        DragCommit::Committed(rect)
    }

    /// Remove a selection by id. No-op if absent.
    pub fn remove(&mut self, page: u32, id: &str) -> bool {
        let Some(rects) = self.pages.get_mut(&page) else {
            return false;
        };
        let before = rects.len();
        rects.retain(|r| r.id != id);
        rects.len() != before
    }

    /// Drop every selection on `page`; other pages are untouched.
    pub fn clear_page(&mut self, page: u32) {
        self.pages.remove(&page);
    }

    /// Committed selections on `page`, in insertion (z) order.
    #[must_use]
    pub fn selections(&self, page: u32) -> &[SelectionRect] {
        self.pages.get(&page).map_or(&[], Vec::as_slice)
    }

    /// Topmost committed selection under `point`, if any.
    #[must_use]
    pub fn hover(&self, page: u32, point: Point) -> Option<&str> {
        geometry::hit_test(point, self.selections(page))
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SelectionStore {
        SelectionStore::new(10.0, OverlapPolicy::Reject)
    }

    fn drag(store: &mut SelectionStore, id: &str, page: u32, sx: f32, sy: f32, ex: f32, ey: f32) -> DragCommit {
        store.begin_drag(page, Point::new(sx, sy), id);
        store.update_drag(id, Point::new(ex, ey));
        store.commit_drag(id)
    }

    #[test]
    fn commit_appends_in_order() {
        let mut store = store();
        drag(&mut store, "a", 1, 0.0, 0.0, 50.0, 50.0);
        drag(&mut store, "b", 1, 100.0, 100.0, 150.0, 150.0);

        let ids: Vec<_> = store.selections(1).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(store.selections(2).is_empty());
    }

    #[test]
    fn sub_material_drag_is_dropped() {
        let mut store = store();
        let outcome = drag(&mut store, "tiny", 1, 0.0, 0.0, 3.0, 3.0);
        assert_eq!(outcome, DragCommit::BelowMinimum);
        assert!(store.selections(1).is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut store = store();
        // Exactly 10x10 is not material; must strictly exceed the threshold.
        assert_eq!(
            drag(&mut store, "edge", 1, 0.0, 0.0, 10.0, 10.0),
            DragCommit::BelowMinimum
        );
        assert_eq!(
            drag(&mut store, "ok", 1, 0.0, 0.0, 10.5, 10.5),
            DragCommit::Committed(store.selections(1)[0].clone())
        );
    }

    #[test]
    fn overlapping_commit_rejected_and_length_unchanged() {
        let mut store = store();
        drag(&mut store, "a", 1, 0.0, 0.0, 50.0, 50.0);
        let outcome = drag(&mut store, "b", 1, 40.0, 40.0, 90.0, 90.0);
        assert_eq!(outcome, DragCommit::Overlapping);
        assert_eq!(store.selections(1).len(), 1);
    }

    #[test]
    fn overlap_allowed_under_allow_policy() {
        let mut store = SelectionStore::new(10.0, OverlapPolicy::Allow);
        drag(&mut store, "a", 1, 0.0, 0.0, 50.0, 50.0);
        let outcome = drag(&mut store, "b", 1, 40.0, 40.0, 90.0, 90.0);
        assert!(matches!(outcome, DragCommit::Committed(_)));
        assert_eq!(store.selections(1).len(), 2);
    }

    #[test]
    fn backward_drag_commits_like_forward() {
        let mut store = store();
        let outcome = drag(&mut store, "back", 1, 50.0, 50.0, 0.0, 0.0);
        assert!(matches!(outcome, DragCommit::Committed(_)));
        let bounds = store.selections(1)[0].bounds();
        assert_eq!((bounds.left, bounds.top), (0.0, 0.0));
    }

    #[test]
    fn new_drag_abandons_previous_draft() {
        let mut store = store();
        store.begin_drag(1, Point::new(0.0, 0.0), "first");
        store.begin_drag(1, Point::new(5.0, 5.0), "second");
        assert!(!store.update_drag("first", Point::new(99.0, 99.0)));
        assert_eq!(store.commit_drag("first"), DragCommit::Stale);
        assert_eq!(store.draft().map(|d| d.id.as_str()), Some("second"));
    }

    #[test]
    fn remove_and_clear() {
        let mut store = store();
        drag(&mut store, "a", 1, 0.0, 0.0, 50.0, 50.0);
        drag(&mut store, "b", 2, 0.0, 0.0, 50.0, 50.0);

        assert!(store.remove(1, "a"));
        assert!(!store.remove(1, "a"));
        assert!(store.selections(1).is_empty());

        store.clear_page(2);
        assert!(store.selections(2).is_empty());
    }

    #[test]
    fn hover_reports_topmost() {
        let mut store = SelectionStore::new(10.0, OverlapPolicy::Allow);
        drag(&mut store, "below", 1, 0.0, 0.0, 50.0, 50.0);
        drag(&mut store, "above", 1, 25.0, 25.0, 75.0, 75.0);
        assert_eq!(store.hover(1, Point::new(30.0, 30.0)), Some("above"));
        assert_eq!(store.hover(1, Point::new(5.0, 5.0)), Some("below"));
        assert_eq!(store.hover(1, Point::new(200.0, 200.0)), None);
    }
}
