//! Selection engine: geometry, drag state, zoom, and overlay painting.

mod geometry;
mod overlay;
mod store;
mod zoom;

pub use geometry::{
    DELETE_ZONE_INSET, DELETE_ZONE_SIZE, Point, RectBounds, SelectionRect, Viewport,
    delete_affordance_hit, delete_zone_center, hit_test,
};
pub use overlay::render_selection_overlay;
pub use store::{Draft, DragCommit, OverlapPolicy, SelectionStore};
pub use zoom::Zoom;
