//! Heatmap overlay rendering.
//!
//! Two fidelities over the same region list: flat per-cell rectangles, and
//! a smoothed thermal style (radial falloff, blur pass, hue ramp). Both
//! normalize against the hottest cell on the page, so colors are always
//! relative to the current page rather than a global constant. The overlay
//! raster is composited by the embedder and takes no pointer input.

use image::{GrayImage, RgbaImage, imageops};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::grid::HeatRegion;

/// Radius of influence around each heat point, in pixels.
pub const HEAT_POINT_RADIUS: f32 = 30.0;
/// Sigma of the smoothing pass (a 15px gaussian blur).
const BLUR_SIGMA: f32 = 7.5;
/// Alpha ceiling for flat cells.
const FLAT_MAX_ALPHA: f32 = 0.7;

/// Rendering fidelity for the heatmap overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapStyle {
    /// One flat-alpha rectangle per grid cell.
    Flat,
    /// Blurred radial gradients through a blue-green-yellow-red ramp.
    #[default]
    Smoothed,
}

/// Render `regions` at the chosen fidelity onto a `width x height` overlay.
#[must_use]
pub fn render(
    regions: &[HeatRegion],
    style: HeatmapStyle,
    cell_size: u32,
    width: u32,
    height: u32,
) -> RgbaImage {
    match style {
        HeatmapStyle::Flat => render_flat(regions, cell_size, width, height),
        HeatmapStyle::Smoothed => render_smoothed(regions, cell_size, width, height),
    }
}

/// Flat variant: alpha proportional to `intensity / max`, capped at 0.7.
#[must_use]
pub fn render_flat(regions: &[HeatRegion], cell_size: u32, width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let Some(max) = regions.iter().map(|r| r.intensity).max().filter(|&m| m > 0) else {
        return img;
    };

    for region in regions {
        let alpha = (region.intensity as f32 / max as f32 * FLAT_MAX_ALPHA).min(FLAT_MAX_ALPHA);
        let a = (alpha * 255.0).round() as u8;
        let x1 = (region.x + cell_size).min(width);
        let y1 = (region.y + cell_size).min(height);
        for y in region.y..y1 {
            for x in region.x..x1 {
                img.put_pixel(x, y, image::Rgba([255, 0, 0, a]));
            }
        }
    }

    img
}

/// Smoothed variant: accumulate radial falloff per region into an intensity
/// buffer, blur it, then map alpha through the thermal hue ramp.
#[must_use]
pub fn render_smoothed(
    regions: &[HeatRegion],
    cell_size: u32,
    width: u32,
    height: u32,
) -> RgbaImage {
    if width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    let Some(max) = regions.iter().map(|r| r.intensity).max().filter(|&m| m > 0) else {
        return RgbaImage::new(width, height);
    };

    let mut heat = vec![0.0f32; (width as usize) * (height as usize)];
    let half_cell = cell_size as f32 / 2.0;

    for region in regions {
        let normalized = region.intensity as f32 / max as f32;
        let cx = region.x as f32 + half_cell;
        let cy = region.y as f32 + half_cell;

        let x0 = ((cx - HEAT_POINT_RADIUS).floor().max(0.0)) as u32;
        let y0 = ((cy - HEAT_POINT_RADIUS).floor().max(0.0)) as u32;
        let x1 = (((cx + HEAT_POINT_RADIUS).ceil()) as u32).min(width);
        let y1 = (((cy + HEAT_POINT_RADIUS).ceil()) as u32).min(height);

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let t = (dx * dx + dy * dy).sqrt() / HEAT_POINT_RADIUS;
                if t < 1.0 {
                    // Gradient stops 0.8 / 0.4 / 0.0 at t = 0 / 0.5 / 1 are
                    // collinear: one linear falloff.
                    let idx = (y as usize) * (width as usize) + x as usize;
                    heat[idx] = (heat[idx] + normalized * 0.8 * (1.0 - t)).min(1.0);
                }
            }
        }
    }

    let gray = GrayImage::from_raw(
        width,
        height,
        heat.iter().map(|&v| (v * 255.0).round() as u8).collect(),
    )
    .expect("heat buffer sized to dimensions");
    let blurred = imageops::blur(&gray, BLUR_SIGMA).into_raw();

    let mut out = vec![0u8; (width as usize) * (height as usize) * 4];
    out.par_chunks_exact_mut(4).enumerate().for_each(|(idx, px)| {
        let alpha = blurred[idx] as f32 / 255.0;
        if alpha > 0.0 {
            let (r, g, b) = heat_color(alpha * 3.0);
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = (alpha * 255.0).min(255.0) as u8;
        }
    });

    RgbaImage::from_raw(width, height, out).expect("rgba buffer sized to dimensions")
}

/// Blue -> green -> yellow -> red ramp over intensity in [0, 3].
fn heat_color(intensity: f32) -> (u8, u8, u8) {
    if intensity <= 1.0 {
        let t = intensity;
        (0, (255.0 * t).round() as u8, (255.0 * (1.0 - t)).round() as u8)
    } else if intensity <= 2.0 {
        let t = intensity - 1.0;
        ((255.0 * t).round() as u8, 255, 0)
    } else {
        let t = (intensity - 2.0).min(1.0);
        (255, (255.0 * (1.0 - t)).round() as u8, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: u32, y: u32, intensity: u32) -> HeatRegion {
        HeatRegion { x, y, intensity }
    }

    #[test]
    fn flat_alpha_scales_with_intensity() {
        let regions = vec![region(0, 0, 1), region(40, 0, 4)];
        let img = render_flat(&regions, 20, 100, 40);

        let weak = img.get_pixel(10, 10).0[3];
        let strong = img.get_pixel(50, 10).0[3];
        assert_eq!(strong, (0.7f32 * 255.0).round() as u8);
        assert!(weak < strong);
        // Untouched cell stays fully transparent.
        assert_eq!(img.get_pixel(90, 30).0[3], 0);
    }

    #[test]
    fn flat_alpha_is_capped() {
        let regions = vec![region(0, 0, 100)];
        let img = render_flat(&regions, 20, 40, 40);
        assert!(img.get_pixel(5, 5).0[3] <= (0.7f32 * 255.0).round() as u8 + 1);
    }

    #[test]
    fn empty_regions_render_transparent() {
        let flat = render_flat(&[], 20, 50, 50);
        let smooth = render_smoothed(&[], 20, 50, 50);
        assert!(flat.pixels().all(|p| p.0[3] == 0));
        assert!(smooth.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn smoothed_center_is_hotter_than_fringe() {
        let regions = vec![region(40, 40, 3)];
        let img = render_smoothed(&regions, 20, 100, 100);

        let center = img.get_pixel(50, 50).0[3];
        let fringe = img.get_pixel(50, 85).0[3];
        assert!(center > 0);
        assert!(center > fringe);
    }

    #[test]
    fn smoothed_normalizes_to_page_max() {
        // Same relative shape, different absolute counts: the lone hottest
        // cell should reach the same alpha either way.
        let weak = render_smoothed(&[region(40, 40, 1)], 20, 100, 100);
        let strong = render_smoothed(&[region(40, 40, 9)], 20, 100, 100);
        let a = weak.get_pixel(50, 50).0[3] as i32;
        let b = strong.get_pixel(50, 50).0[3] as i32;
        assert!((a - b).abs() <= 1);
    }

    #[test]
    fn heat_ramp_endpoints() {
        assert_eq!(heat_color(0.0), (0, 0, 255));
        assert_eq!(heat_color(1.0), (0, 255, 0));
        assert_eq!(heat_color(2.0), (255, 255, 0));
        assert_eq!(heat_color(3.0), (255, 0, 0));
    }

    #[test]
    fn dispatcher_honors_style() {
        let regions = vec![region(0, 0, 2)];
        let flat = render(&regions, HeatmapStyle::Flat, 20, 60, 60);
        assert_eq!(flat.get_pixel(10, 10).0[..3], [255, 0, 0]);

        let smooth = render(&regions, HeatmapStyle::Smoothed, 20, 60, 60);
        // Hot center of the smoothed map is not pure flat red at low reach.
        assert!(smooth.get_pixel(10, 10).0[3] > 0);
    }
}
