//! Region extraction: turn a committed selection into a standalone image.
//!
//! The source surface is rendered at the current zoom; the extracted
//! capture is resampled back to native document units so the exported
//! snippet does not depend on the zoom level it was selected at.

use std::io::Cursor;
use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use fast_image_resize as fir;
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::render::RasterSurface;
use crate::select::RectBounds;

/// Extraction errors. All are recoverable: the selection stays committed,
/// it just never becomes "analyzed".
#[derive(Debug, thiserror::Error)]
pub enum CaptureFault {
    #[error("render surface unavailable")]
    Unavailable,

    #[error("selection region is empty")]
    EmptyRegion,

    #[error("resample: {detail}")]
    Resample { detail: String },

    #[error("encode: {0}")]
    Encode(#[from] image::ImageError),
}

/// An extracted, PNG-encoded selection snippet in document-unit resolution.
#[derive(Clone)]
pub struct Capture {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Capture {
    /// `data:image/png;base64,...` form used when handing the capture to
    /// the analysis collaborator.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

/// Copy `bounds` (document space) out of a surface rendered at `zoom` and
/// resample it to `bounds.width x bounds.height` document units.
pub fn extract_region(
    surface: &RasterSurface,
    bounds: &RectBounds,
    zoom: f32,
) -> Result<Capture, CaptureFault> {
    if surface.width() == 0 || surface.height() == 0 || !zoom.is_finite() || zoom <= 0.0 {
        return Err(CaptureFault::Unavailable);
    }

    let out_width = bounds.width.round() as u32;
    let out_height = bounds.height.round() as u32;
    if out_width == 0 || out_height == 0 {
        return Err(CaptureFault::EmptyRegion);
    }

    // Source rectangle in surface pixels, clamped to the rendered area.
    let src_left = ((bounds.left * zoom).floor().max(0.0) as u32).min(surface.width());
    let src_top = ((bounds.top * zoom).floor().max(0.0) as u32).min(surface.height());
    let src_right = ((bounds.right() * zoom).ceil() as u32).min(surface.width());
    let src_bottom = ((bounds.bottom() * zoom).ceil() as u32).min(surface.height());

    let src_width = src_right.saturating_sub(src_left);
    let src_height = src_bottom.saturating_sub(src_top);
    if src_width == 0 || src_height == 0 {
        return Err(CaptureFault::EmptyRegion);
    }

    let mut cropped = Vec::with_capacity((src_width as usize) * (src_height as usize) * 3);
    for y in src_top..src_bottom {
        let row = surface.row(y);
        let start = src_left as usize * 3;
        let end = src_right as usize * 3;
        cropped.extend_from_slice(&row[start..end]);
    }

    let pixels = if (src_width, src_height) == (out_width, out_height) {
        cropped
    } else {
        resize_exact(cropped, src_width, src_height, out_width, out_height)?
    };

    let img = RgbImage::from_raw(out_width, out_height, pixels)
        .ok_or_else(|| CaptureFault::Resample {
            detail: "resample produced invalid buffer".to_string(),
        })?;

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(Capture {
        width: out_width,
        height: out_height,
        png,
    })
}

fn resize_exact(
    buf: Vec<u8>,
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Result<Vec<u8>, CaptureFault> {
    let resample_error = |detail: String| CaptureFault::Resample { detail };

    let src_nz_width = NonZeroU32::new(src_width)
        .ok_or_else(|| resample_error("invalid source width".to_string()))?;
    let src_nz_height = NonZeroU32::new(src_height)
        .ok_or_else(|| resample_error("invalid source height".to_string()))?;
    let dst_nz_width = NonZeroU32::new(dst_width)
        .ok_or_else(|| resample_error("invalid target width".to_string()))?;
    let dst_nz_height = NonZeroU32::new(dst_height)
        .ok_or_else(|| resample_error("invalid target height".to_string()))?;

    let src = fir::Image::from_vec_u8(src_nz_width, src_nz_height, buf, fir::PixelType::U8x3)
        .map_err(|e| resample_error(format!("source image: {e}")))?;
    let mut dst = fir::Image::new(dst_nz_width, dst_nz_height, fir::PixelType::U8x3);
    let mut resizer = fir::Resizer::new(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    resizer
        .resize(&src.view(), &mut dst.view_mut())
        .map_err(|e| resample_error(format!("resize: {e}")))?;

    Ok(dst.into_vec())
}
