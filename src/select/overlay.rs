//! Selection-mode overlay raster.
//!
//! Paints the dim mask with cleared holes over each selection, borders, and
//! the hovered delete affordance. The embedder composites the result above
//! the page render; the overlay itself takes no part in hit-testing.

use image::{Rgba, RgbaImage};

use super::geometry::{
    DELETE_ZONE_INSET, DELETE_ZONE_SIZE, Point, RectBounds, SelectionRect, Viewport,
    delete_zone_center,
};
use super::store::Draft;

const DIM: Rgba<u8> = Rgba([0, 0, 0, 128]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
const BORDER: Rgba<u8> = Rgba([0x00, 0x66, 0xCC, 255]);
const DELETE_FILL: Rgba<u8> = Rgba([255, 68, 68, 230]);
const DELETE_CROSS: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BORDER_THICKNESS: i32 = 2;

/// Paint the selection overlay for one page at the viewport's zoom.
#[must_use]
pub fn render_selection_overlay(
    selections: &[SelectionRect],
    draft: Option<&Draft>,
    hovered: Option<&str>,
    viewport: &Viewport,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, DIM);

    let mut paint_bounds = |bounds: &RectBounds| {
        let (left, top) = viewport.to_screen(Point::new(bounds.left, bounds.top));
        let w = bounds.width * viewport.zoom;
        let h = bounds.height * viewport.zoom;
        fill_rect(&mut img, left, top, w, h, CLEAR);
        stroke_rect(&mut img, left, top, w, h);
    };

    for rect in selections {
        paint_bounds(&rect.bounds());
    }
    if let Some(draft) = draft {
        paint_bounds(&draft.bounds());
    }

    if let Some(hovered_id) = hovered {
        if let Some(rect) = selections.iter().find(|r| r.id == hovered_id) {
            paint_delete_affordance(&mut img, &rect.bounds(), viewport);
        }
    }

    img
}

fn fill_rect(img: &mut RgbaImage, left: f32, top: f32, width: f32, height: f32, color: Rgba<u8>) {
    let x0 = left.floor().max(0.0) as i64;
    let y0 = top.floor().max(0.0) as i64;
    let x1 = ((left + width).ceil() as i64).min(i64::from(img.width()));
    let y1 = ((top + height).ceil() as i64).min(i64::from(img.height()));
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn stroke_rect(img: &mut RgbaImage, left: f32, top: f32, width: f32, height: f32) {
    let t = BORDER_THICKNESS as f32;
    // Top, bottom, left, right bands.
    fill_rect(img, left, top, width, t, BORDER);
    fill_rect(img, left, top + height - t, width, t, BORDER);
    fill_rect(img, left, top, t, height, BORDER);
    fill_rect(img, left + width - t, top, t, height, BORDER);
}

fn paint_delete_affordance(img: &mut RgbaImage, bounds: &RectBounds, viewport: &Viewport) {
    let (cx, cy) = delete_zone_center(bounds, viewport);
    let radius = DELETE_ZONE_SIZE / 2.0;

    let x0 = (cx - radius).floor().max(0.0) as i64;
    let y0 = (cy - radius).floor().max(0.0) as i64;
    let x1 = ((cx + radius).ceil() as i64).min(i64::from(img.width()));
    let y1 = ((cy + radius).ceil() as i64).min(i64::from(img.height()));

    // Filled circle.
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if (dx * dx + dy * dy).sqrt() <= radius {
                img.put_pixel(x as u32, y as u32, DELETE_FILL);
            }
        }
    }

    // X icon: the two diagonals of the inner square, inset like the source
    // affordance (8px inside the 24px zone).
    let inset = DELETE_ZONE_INSET - 2.0;
    let a = (cx - radius + inset, cy - radius + inset);
    let b = (cx + radius - inset, cy + radius - inset);
    draw_line(img, a, b, DELETE_CROSS);
    draw_line(img, (b.0, a.1), (a.0, b.1), DELETE_CROSS);
}

fn draw_line(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
    let steps = ((to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil() as u32).max(1);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        // 2px-thick stamp per sample.
        for (ox, oy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            let px = (x + ox).floor();
            let py = (y + oy).floor();
            if px >= 0.0 && py >= 0.0 && (px as u32) < img.width() && (py as u32) < img.height() {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
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
    fn selection_hole_is_cleared_and_outside_is_dim() {
        let selections = vec![rect("a", 10.0, 10.0, 40.0, 40.0)];
        let viewport = Viewport::new(0.0, 0.0, 1.0);
        let img = render_selection_overlay(&selections, None, None, &viewport, 100, 100);

        // Middle of the selection: fully transparent hole.
        assert_eq!(img.get_pixel(25, 25).0[3], 0);
        // Far corner: dim mask.
        assert_eq!(img.get_pixel(90, 90).0, [0, 0, 0, 128]);
        // Border band at the top edge of the selection.
        assert_eq!(img.get_pixel(25, 10).0, [0x00, 0x66, 0xCC, 255]);
    }

    #[test]
    fn hovered_selection_gets_delete_affordance() {
        let selections = vec![rect("a", 0.0, 0.0, 100.0, 100.0)];
        let viewport = Viewport::new(0.0, 0.0, 1.0);
        let img = render_selection_overlay(&selections, None, Some("a"), &viewport, 120, 120);

        let (cx, cy) = delete_zone_center(&selections[0].bounds(), &viewport);
        assert_eq!(img.get_pixel(cx as u32, cy as u32).0[0], 255);

        // Without hover no affordance is painted; the spot stays cleared.
        let plain = render_selection_overlay(&selections, None, None, &viewport, 120, 120);
        assert_eq!(plain.get_pixel(cx as u32, cy as u32).0[3], 0);
    }

    #[test]
    fn draft_is_painted_like_a_selection() {
        let draft = Draft {
            id: "d".to_string(),
            page: 1,
            start: Point::new(50.0, 50.0),
            end: Point::new(80.0, 80.0),
        };
        let viewport = Viewport::new(0.0, 0.0, 1.0);
        let img = render_selection_overlay(&[], Some(&draft), None, &viewport, 100, 100);
        assert_eq!(img.get_pixel(65, 65).0[3], 0);
    }
}
