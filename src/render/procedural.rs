use super::Render;
use crate::shapes::point::PointF32;
use crate::shapes::rect::RectF32;
use image::{Rgb, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_ellipse_mut, draw_hollow_ellipse_mut, draw_line_segment_mut};
use std::f32::consts::PI;
use std::ops::Range;

const ARC_SEGMENTS: usize = 48;
// Largest radius whose square fits in an i32.
const MAX_DIRECT_RADIUS: u32 = 46340;

/// Cartoon chin built from two ellipses, a center seam and an arc.
#[derive(Debug, Clone)]
pub struct Procedural {
    outline: Rgb<u8>,
    stroke_width: u32,
}

impl Procedural {
    pub fn new(outline: Rgb<u8>, stroke_width: u32) -> Self {
        Self {
            outline,
            stroke_width,
        }
    }
}

impl Render for Procedural {
    fn render(&self, img: &mut RgbaImage, area: RectF32, fill: Rgb<u8>, _angle: Option<f32>) {
        draw_balls_chin(
            img,
            area,
            opaque(fill),
            opaque(self.outline),
            self.stroke_width,
        );
    }
}

pub(crate) fn opaque(c: Rgb<u8>) -> Rgba<u8> {
    Rgba([c[0], c[1], c[2], 255])
}

struct Lobe {
    center: (i32, i32),
    rx: i32,
    ry: i32,
}

fn lobes(area: RectF32) -> [Lobe; 2] {
    let rx = (area.w * 0.25).round() as i32;
    let ry = (area.h * 0.4).round() as i32;

    [0.25, 0.75].map(|fx| {
        let c = area.at(fx, 0.6);
        Lobe {
            center: (c.x.round() as i32, c.y.round() as i32),
            rx,
            ry,
        }
    })
}

/// Draw the chin in place. Anything outside the image is clipped.
pub fn draw_balls_chin(
    img: &mut RgbaImage,
    area: RectF32,
    fill: Rgba<u8>,
    outline: Rgba<u8>,
    stroke_width: u32,
) {
    if !area.is_finite() {
        return;
    }

    // Each lobe is filled then stroked before the next, so the right lobe
    // paints over the left one's outline where they overlap.
    for lobe in lobes(area) {
        fill_lobe(img, &lobe, fill);
        stroke_lobe(img, &lobe, outline, stroke_width);
    }
    stroke_seam(img, area, outline, stroke_width);
}

/// Silhouette only, no linework.
pub(crate) fn fill_chin(img: &mut RgbaImage, area: RectF32, fill: Rgba<u8>) {
    for lobe in lobes(area) {
        fill_lobe(img, &lobe, fill);
    }
}

/// Linework only, with the right lobe still masking the left one's outline.
pub(crate) fn outline_chin(
    img: &mut RgbaImage,
    area: RectF32,
    outline: Rgba<u8>,
    stroke_width: u32,
) {
    for lobe in lobes(area) {
        fill_lobe(img, &lobe, Rgba([0, 0, 0, 0]));
        stroke_lobe(img, &lobe, outline, stroke_width);
    }
    stroke_seam(img, area, outline, stroke_width);
}

fn fill_lobe(img: &mut RgbaImage, lobe: &Lobe, color: Rgba<u8>) {
    let radii = (lobe.rx, lobe.ry);
    if lobe.rx < 1 || lobe.ry < 1 || !on_canvas(img, lobe.center, radii) {
        return;
    }

    if fits_canvas(img, radii) {
        draw_filled_ellipse_mut(img, lobe.center, lobe.rx, lobe.ry, color);
    } else {
        scan_ellipse(img, lobe.center, radii, None, color);
    }
}

fn stroke_lobe(img: &mut RgbaImage, lobe: &Lobe, color: Rgba<u8>, width: u32) {
    let offsets = stroke_offsets(width);
    let grow = offsets.end - 1;
    let outer = (lobe.rx.saturating_add(grow), lobe.ry.saturating_add(grow));
    if outer.0 < 1 || outer.1 < 1 || !on_canvas(img, lobe.center, outer) {
        return;
    }

    if fits_canvas(img, outer) {
        for offset in offsets {
            let rx = lobe.rx + offset;
            let ry = lobe.ry + offset;
            if rx < 1 || ry < 1 {
                continue;
            }
            draw_hollow_ellipse_mut(img, lobe.center, rx, ry, color);
        }
    } else {
        let inner = (
            lobe.rx.saturating_add(offsets.start),
            lobe.ry.saturating_add(offsets.start),
        );
        scan_ellipse(img, lobe.center, outer, Some(inner), color);
    }
}

fn on_canvas(img: &RgbaImage, center: (i32, i32), (rx, ry): (i32, i32)) -> bool {
    let (cx, cy) = (center.0 as i64, center.1 as i64);
    let (rx, ry) = (rx as i64, ry as i64);

    cx + rx >= 0
        && cx - rx < img.width() as i64
        && cy + ry >= 0
        && cy - ry < img.height() as i64
}

// imageproc squares radii in i32 and walks the whole outline, clipped or not.
fn fits_canvas(img: &RgbaImage, (rx, ry): (i32, i32)) -> bool {
    let limit = img.width().max(img.height()).min(MAX_DIRECT_RADIUS) as i32;
    rx <= limit && ry <= limit
}

/// Fill the rows of an ellipse that land on the canvas. With `inner` set,
/// only the band between the two ellipses is painted.
fn scan_ellipse(
    img: &mut RgbaImage,
    center: (i32, i32),
    outer: (i32, i32),
    inner: Option<(i32, i32)>,
    color: Rgba<u8>,
) {
    let (cx, cy) = (center.0 as f64, center.1 as f64);
    let (rx, ry) = (outer.0 as f64, outer.1 as f64);

    let top = (cy - ry).ceil().max(0.);
    let bottom = (cy + ry).floor().min(img.height() as f64 - 1.);
    if top > bottom {
        return;
    }

    for y in top as u32..=bottom as u32 {
        let dy = y as f64 - cy;
        let Some(half) = half_chord(rx, ry, dy) else {
            continue;
        };

        match inner.and_then(|(ix, iy)| half_chord(ix as f64, iy as f64, dy)) {
            Some(hole) => {
                fill_span(img, y, cx - half, (cx - hole).floor(), color);
                fill_span(img, y, (cx + hole).ceil(), cx + half, color);
            }
            None => fill_span(img, y, cx - half, cx + half, color),
        }
    }
}

// Half the width of the ellipse on the row `dy` away from its center.
fn half_chord(rx: f64, ry: f64, dy: f64) -> Option<f64> {
    if rx < 1. || ry < 1. {
        return None;
    }
    let t = 1. - (dy / ry).powi(2);
    (t >= 0.).then(|| rx * t.sqrt())
}

fn fill_span(img: &mut RgbaImage, y: u32, from: f64, to: f64, color: Rgba<u8>) {
    let left = from.ceil().max(0.);
    let right = to.floor().min(img.width() as f64 - 1.);
    if left > right {
        return;
    }

    for x in left as u32..=right as u32 {
        img.put_pixel(x, y, color);
    }
}

// Vertical seam down the middle plus the arc joining the tops of the lobes.
fn stroke_seam(img: &mut RgbaImage, area: RectF32, color: Rgba<u8>, width: u32) {
    let top = area.at(0.5, 0.35);
    let bottom = area.at(0.5, 0.8);
    let arc_center = area.at(0.5, 0.2);
    let radius = area.w * 0.25;

    for offset in stroke_offsets(width) {
        let dx = offset as f32;
        draw_clipped_line(
            img,
            PointF32::new(top.x + dx, top.y),
            PointF32::new(bottom.x + dx, bottom.y),
            color,
        );

        let r = radius + dx;
        if r <= 0. {
            continue;
        }
        let points: Vec<PointF32> = (0..=ARC_SEGMENTS)
            .map(|i| {
                // PI -> 0 sweeps over the top in image space
                let t = PI - PI * i as f32 / ARC_SEGMENTS as f32;
                PointF32::new(arc_center.x + r * t.cos(), arc_center.y - r * t.sin())
            })
            .collect();

        for pair in points.windows(2) {
            draw_clipped_line(img, pair[0], pair[1], color);
        }
    }
}

fn draw_clipped_line(img: &mut RgbaImage, a: PointF32, b: PointF32, color: Rgba<u8>) {
    if let Some((a, b)) = clip_segment(a, b, img.width(), img.height()) {
        draw_line_segment_mut(img, (a.x, a.y), (b.x, b.y), color);
    }
}

/// Liang-Barsky clip of the segment `a`-`b` to the canvas plus a pixel of
/// slack on each side. `None` when nothing of it is visible.
fn clip_segment(
    a: PointF32,
    b: PointF32,
    width: u32,
    height: u32,
) -> Option<(PointF32, PointF32)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (mut t0, mut t1) = (0f32, 1f32);

    for (p, q) in [
        (-dx, a.x + 1.),
        (dx, width as f32 - a.x),
        (-dy, a.y + 1.),
        (dy, height as f32 - a.y),
    ] {
        if p == 0. {
            if q < 0. {
                return None;
            }
        } else if p < 0. {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }

    (t0 <= t1).then(|| {
        (
            PointF32::new(a.x + t0 * dx, a.y + t0 * dy),
            PointF32::new(a.x + t1 * dx, a.y + t1 * dy),
        )
    })
}

// Offsets centered on the path, e.g. width 3 -> [-1, 0, 1]
fn stroke_offsets(width: u32) -> Range<i32> {
    let width = width.max(1) as i32;
    let start = -(width / 2);
    start..start + width
}
