//! Attention heatmap: density aggregation and overlay rendering.

mod grid;
mod render;

pub use grid::{
    DEFAULT_CELL_SIZE, DensityGrid, HeatRegion, HeatmapData, build_grid, build_heatmap, to_regions,
};
pub use render::{HEAT_POINT_RADIUS, HeatmapStyle, render, render_flat, render_smoothed};
