//! Density grid aggregation over historical highlights.
//!
//! Coverage is deliberately coarse: a highlight increments every cell its
//! normalized bounding box touches. The goal is a glanceable picture of
//! where a page gets selected, not exact area accounting.

use log::warn;
use serde::Serialize;

use crate::highlights::StudentHighlight;
use crate::select::RectBounds;

/// Default edge length of one heatmap cell, in canvas pixels.
pub const DEFAULT_CELL_SIZE: u32 = 20;

/// 2-D histogram of highlight coverage over a page canvas.
#[derive(Clone, Debug)]
pub struct DensityGrid {
    cells: Vec<u32>,
    cols: u32,
    rows: u32,
    cell_size: u32,
}

impl DensityGrid {
    /// Allocate a zeroed grid covering `canvas_width x canvas_height`.
    ///
    /// `cell_size` of zero falls back to [`DEFAULT_CELL_SIZE`].
    #[must_use]
    pub fn new(canvas_width: u32, canvas_height: u32, cell_size: u32) -> Self {
        let cell_size = if cell_size == 0 {
            DEFAULT_CELL_SIZE
        } else {
            cell_size
        };
        let cols = canvas_width.div_ceil(cell_size);
        let rows = canvas_height.div_ceil(cell_size);
        Self {
            cells: vec![0; (cols as usize) * (rows as usize)],
            cols,
            rows,
            cell_size,
        }
    }

    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Count at (row, col), or `None` outside the grid.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<u32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[(row as usize) * (self.cols as usize) + col as usize])
    }

    /// Increment (row, col); out-of-bounds cells are silently ignored.
    fn bump(&mut self, row: u32, col: u32) {
        if row < self.rows && col < self.cols {
            self.cells[(row as usize) * (self.cols as usize) + col as usize] += 1;
        }
    }

    /// Highest count present anywhere on the grid.
    #[must_use]
    pub fn max_intensity(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }
}

/// One non-empty grid cell, positioned in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HeatRegion {
    pub x: u32,
    pub y: u32,
    pub intensity: u32,
}

/// The aggregated heat regions for one page.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapData {
    pub page_number: u32,
    pub regions: Vec<HeatRegion>,
}

/// Aggregate `highlights` for `page_number` into a density grid.
///
/// Rectangles are normalized first, so inverted drags count the same as
/// forward ones. Records with non-finite geometry are skipped.
#[must_use]
pub fn build_grid(
    highlights: &[StudentHighlight],
    page_number: u32,
    canvas_width: u32,
    canvas_height: u32,
    cell_size: u32,
) -> DensityGrid {
    let mut grid = DensityGrid::new(canvas_width, canvas_height, cell_size);
    let cell = grid.cell_size() as f32;

    for highlight in highlights.iter().filter(|h| h.page_number == page_number) {
        if !highlight.has_valid_geometry() {
            warn!("skipping highlight {} with invalid geometry", highlight.id);
            continue;
        }

        let bounds = RectBounds::from_corners(highlight.selection.start, highlight.selection.end);
        let start_col = (bounds.left / cell).floor().max(0.0) as u32;
        let start_row = (bounds.top / cell).floor().max(0.0) as u32;
        let end_col = (bounds.right() / cell).floor().max(0.0) as u32;
        let end_row = (bounds.bottom() / cell).floor().max(0.0) as u32;

        for row in start_row..=end_row {
            for col in start_col..=end_col {
                grid.bump(row, col);
            }
        }
    }

    grid
}

/// Aggregate and convert in one step.
#[must_use]
pub fn build_heatmap(
    highlights: &[StudentHighlight],
    page_number: u32,
    canvas_width: u32,
    canvas_height: u32,
    cell_size: u32,
) -> HeatmapData {
    let grid = build_grid(highlights, page_number, canvas_width, canvas_height, cell_size);
    HeatmapData {
        page_number,
        regions: to_regions(&grid),
    }
}

/// Emit one region per non-zero cell, row-major.
#[must_use]
pub fn to_regions(grid: &DensityGrid) -> Vec<HeatRegion> {
    let mut regions = Vec::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let intensity = grid.get(row, col).unwrap_or(0);
            if intensity > 0 {
                regions.push(HeatRegion {
                    x: col * grid.cell_size(),
                    y: row * grid.cell_size(),
                    intensity,
                });
            }
        }
    }
    regions
}
