//! Rectangle geometry for region selections.
//!
//! All persistent coordinates live in document space (zoom-independent page
//! units). Screen coordinates appear only at the pointer boundary and are
//! converted through a [`Viewport`].

use serde::{Deserialize, Serialize};

/// Size of the circular delete affordance, in screen pixels.
pub const DELETE_ZONE_SIZE: f32 = 24.0;
/// Inset of the affordance from the selection's top-right corner, in screen pixels.
pub const DELETE_ZONE_INSET: f32 = 8.0;

/// A document-space coordinate pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A committed rectangular selection, identified by an opaque id.
///
/// `start`/`end` are the raw drag corners and may be in any order; use
/// [`SelectionRect::bounds`] before doing geometry with them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub id: String,
    pub start: Point,
    pub end: Point,
}

impl SelectionRect {
    #[must_use]
    pub fn bounds(&self) -> RectBounds {
        RectBounds::from_corners(self.start, self.end)
    }
}

/// Normalized axis-aligned bounds with non-negative extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl RectBounds {
    /// Normalize two arbitrary drag corners. The result is identical for
    /// forward and backward drags.
    #[must_use]
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self {
            left: start.x.min(end.x),
            top: start.y.min(end.y),
            width: (end.x - start.x).abs(),
            height: (end.y - start.y).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Axis-aligned bounding-box overlap test. Touching edges count as overlap.
    #[must_use]
    pub fn overlaps(&self, other: &RectBounds) -> bool {
        !(self.right() < other.left
            || other.right() < self.left
            || self.bottom() < other.top
            || other.bottom() < self.top)
    }

    /// True if both extents exceed `min_size` document units.
    #[must_use]
    pub fn is_material(&self, min_size: f32) -> bool {
        self.width > min_size && self.height > min_size
    }
}

/// Screen-to-document transform: zoom factor plus viewport origin offset in
/// screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub origin_x: f32,
    pub origin_y: f32,
    pub zoom: f32,
}

impl Viewport {
    #[must_use]
    pub const fn new(origin_x: f32, origin_y: f32, zoom: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            zoom,
        }
    }

    /// `doc = (screen - origin) / zoom`. Exact inverse of [`Viewport::to_screen`].
    #[must_use]
    pub fn to_document(&self, screen_x: f32, screen_y: f32) -> Point {
        Point {
            x: (screen_x - self.origin_x) / self.zoom,
            y: (screen_y - self.origin_y) / self.zoom,
        }
    }

    /// `screen = doc * zoom + origin`.
    #[must_use]
    pub fn to_screen(&self, p: Point) -> (f32, f32) {
        (
            p.x * self.zoom + self.origin_x,
            p.y * self.zoom + self.origin_y,
        )
    }
}

/// Return the id of the topmost selection containing `point`.
///
/// Insertion order is z-order; the last inserted rect wins on overlap.
#[must_use]
pub fn hit_test(point: Point, rects: &[SelectionRect]) -> Option<&str> {
    rects
        .iter()
        .rev()
        .find(|rect| rect.bounds().contains(point))
        .map(|rect| rect.id.as_str())
}

/// Screen-space center of the delete affordance for a selection.
///
/// The affordance is a `DELETE_ZONE_SIZE` square anchored at the scaled
/// top-right corner, inset by `DELETE_ZONE_INSET` on both axes.
#[must_use]
pub fn delete_zone_center(bounds: &RectBounds, viewport: &Viewport) -> (f32, f32) {
    let (right, top) = viewport.to_screen(Point::new(bounds.right(), bounds.top));
    (
        right - DELETE_ZONE_INSET - DELETE_ZONE_SIZE / 2.0,
        top + DELETE_ZONE_INSET + DELETE_ZONE_SIZE / 2.0,
    )
}

/// True if a screen-space point lands inside the circular delete affordance.
#[must_use]
pub fn delete_affordance_hit(
    screen_x: f32,
    screen_y: f32,
    bounds: &RectBounds,
    viewport: &Viewport,
) -> bool {
    let (cx, cy) = delete_zone_center(bounds, viewport);
    let dx = screen_x - cx;
    let dy = screen_y - cy;
    (dx * dx + dy * dy).sqrt() <= DELETE_ZONE_SIZE / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str, sx: f32, sy: f32, ex: f32, ey: f32) -> SelectionRect {
        SelectionRect {
            id: id.to_string(),
            start: Point::new(sx, sy),
            end: Point::new(ex, ey),
        }
    }

    #[test]
    fn normalize_is_drag_direction_independent() {
        let p = Point::new(12.5, 80.0);
        let q = Point::new(3.0, 4.25);
        assert_eq!(
            RectBounds::from_corners(p, q),
            RectBounds::from_corners(q, p)
        );

        let b = RectBounds::from_corners(p, q);
        assert_eq!(b.left, 3.0);
        assert_eq!(b.top, 4.25);
        assert_eq!(b.width, 9.5);
        assert_eq!(b.height, 75.75);
    }

    #[test]
    fn screen_doc_round_trip() {
        let viewport = Viewport::new(37.0, -12.0, 1.7);
        for &(x, y) in &[(0.0, 0.0), (100.5, 200.25), (-40.0, 613.0)] {
            let doc = Point::new(x, y);
            let (sx, sy) = viewport.to_screen(doc);
            let back = viewport.to_document(sx, sy);
            assert!((back.x - doc.x).abs() < 1e-3);
            assert!((back.y - doc.y).abs() < 1e-3);
        }
    }

    #[test]
    fn overlaps_is_symmetric_and_reflexive() {
        let a = RectBounds::from_corners(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let b = RectBounds::from_corners(Point::new(5.0, 5.0), Point::new(20.0, 20.0));
        let c = RectBounds::from_corners(Point::new(11.0, 11.0), Point::new(20.0, 20.0));

        assert!(a.overlaps(&a));
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.overlaps(&c), c.overlaps(&a));
    }

    #[test]
    fn hit_test_last_inserted_wins() {
        let rects = vec![
            rect("bottom", 0.0, 0.0, 50.0, 50.0),
            rect("top", 25.0, 25.0, 75.0, 75.0),
        ];
        assert_eq!(hit_test(Point::new(30.0, 30.0), &rects), Some("top"));
        assert_eq!(hit_test(Point::new(10.0, 10.0), &rects), Some("bottom"));
        assert_eq!(hit_test(Point::new(90.0, 90.0), &rects), None);
    }

    #[test]
    fn delete_affordance_hits_near_top_right() {
        let bounds = RectBounds::from_corners(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let viewport = Viewport::new(0.0, 0.0, 1.0);
        let (cx, cy) = delete_zone_center(&bounds, &viewport);
        assert_eq!((cx, cy), (80.0, 20.0));

        assert!(delete_affordance_hit(cx, cy, &bounds, &viewport));
        assert!(delete_affordance_hit(cx + 11.0, cy, &bounds, &viewport));
        assert!(!delete_affordance_hit(cx + 13.0, cy, &bounds, &viewport));
        // Far corner of the square that circumscribes the circle misses.
        assert!(!delete_affordance_hit(cx + 10.0, cy - 10.0, &bounds, &viewport));
    }

    #[test]
    fn delete_affordance_tracks_zoom() {
        let bounds = RectBounds::from_corners(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let viewport = Viewport::new(0.0, 0.0, 2.0);
        let (cx, cy) = delete_zone_center(&bounds, &viewport);
        // Anchored at the *scaled* corner; the zone itself stays 24px.
        assert_eq!((cx, cy), (180.0, 20.0));
    }
}
