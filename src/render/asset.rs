use super::Render;
use super::procedural::{fill_chin, outline_chin, opaque};
use crate::shapes::point::PointF32;
use crate::shapes::rect::{Rect, RectF32};
use image::imageops::{FilterType, overlay, resize};
use image::{Rgb, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use std::path::Path;
use std::sync::Arc;
use tracing::{Level, debug, span, warn};

const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pre-rendered chin silhouette and line art. Either may be missing, in
/// which case the pair is not ready and drawing is skipped.
#[derive(Debug, Clone, Default)]
pub struct OverlayAssets {
    mask: Option<RgbaImage>,
    outline: Option<RgbaImage>,
}

impl OverlayAssets {
    pub fn new(mask: RgbaImage, outline: RgbaImage) -> Self {
        Self {
            mask: Some(mask),
            outline: Some(outline),
        }
    }

    /// Load both images from disk. Failures are logged and leave that half
    /// of the pair empty.
    pub fn load(mask_path: &Path, outline_path: &Path) -> Self {
        let open = |path: &Path| match image::open(path) {
            Ok(img) => Some(img.into_rgba8()),
            Err(e) => {
                warn!("Failed to load overlay asset {}: {e:?}", path.display());
                None
            }
        };

        Self {
            mask: open(mask_path),
            outline: open(outline_path),
        }
    }

    /// Render the pair from the procedural chin, `size` pixels square.
    pub fn builtin(size: u32, outline: Rgb<u8>, stroke_width: u32) -> Self {
        let s = size as f32;
        let inset = stroke_width as f32;
        // Leaves headroom for the arc, which rises above the lobes
        let area = RectF32::from_tl(inset, s * 0.3, s - 2. * inset, s * 0.7 - inset);

        let mut mask = RgbaImage::new(size, size);
        fill_chin(&mut mask, area, Rgba([255, 255, 255, 255]));

        let mut lines = RgbaImage::new(size, size);
        outline_chin(&mut lines, area, opaque(outline), stroke_width);

        Self::new(mask, lines)
    }

    pub fn is_ready(&self) -> bool {
        match (&self.mask, &self.outline) {
            (Some(m), Some(o)) => m.width() > 0 && m.height() > 0 && o.width() > 0,
            _ => false,
        }
    }

    /// Mask-sized buffer holding `fill` wherever the mask is opaque, with the
    /// outline blended over it.
    fn composite(&self, fill: Rgb<u8>) -> Option<RgbaImage> {
        let (mask, outline) = match (&self.mask, &self.outline) {
            (Some(m), Some(o)) if self.is_ready() => (m, o),
            _ => return None,
        };

        let mut offscreen = RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
            Rgba([fill[0], fill[1], fill[2], mask.get_pixel(x, y)[3]])
        });

        if outline.dimensions() == mask.dimensions() {
            overlay(&mut offscreen, outline, 0, 0);
        } else {
            let scaled = resize(outline, mask.width(), mask.height(), FilterType::Triangle);
            overlay(&mut offscreen, &scaled, 0, 0);
        }

        Some(offscreen)
    }
}

#[derive(Debug, Clone)]
pub struct Asset {
    assets: Arc<OverlayAssets>,
    align: bool,
}

impl Asset {
    pub fn new(assets: Arc<OverlayAssets>, align: bool) -> Self {
        Self { assets, align }
    }

    pub fn assets(&self) -> &OverlayAssets {
        &self.assets
    }

    /// Tint the assets with `fill`, scale them into `area` and draw them,
    /// rotated about the area's center when an angle is given. Only the
    /// part of the overlay that lands on `img` is ever rasterized.
    pub fn draw_tinted_chin(
        &self,
        img: &mut RgbaImage,
        area: RectF32,
        fill: Rgb<u8>,
        angle: Option<f32>,
    ) {
        let span = span!(Level::DEBUG, "Asset#draw_tinted_chin");
        let _guard = span.enter();

        let Some(offscreen) = self.assets.composite(fill) else {
            debug!("Overlay assets not ready, skipping");
            return;
        };

        let w = area.w.round();
        let h = area.h.round();
        if !area.is_finite() || w < 1. || h < 1. {
            debug!("Degenerate overlay area {area:?}, skipping");
            return;
        }
        let theta = angle.unwrap_or(0.);

        let Some(window) = visible_window(area, theta, img.width(), img.height()) else {
            debug!("Overlay {area:?} misses the image, skipping");
            return;
        };

        let c = area.center();
        let (mw, mh) = offscreen.dimensions();
        // Offscreen pixels -> centered at the origin -> rotated -> window
        let projection = Projection::scale(w / mw as f32, h / mh as f32)
            .and_then(Projection::translate(-w / 2., -h / 2.))
            .and_then(Projection::rotate(theta))
            .and_then(Projection::translate(c.x - window.x as f32, c.y - window.y as f32));

        let mut out = RgbaImage::from_pixel(window.w, window.h, CLEAR);
        warp_into(&offscreen, &projection, Interpolation::Bilinear, CLEAR, &mut out);
        overlay(img, &out, window.x as i64, window.y as i64);
    }
}

/// Part of the image covered by `area` once rotated by `theta` about its
/// center. `None` when the two don't overlap.
fn visible_window(area: RectF32, theta: f32, width: u32, height: u32) -> Option<Rect> {
    let c = area.center();
    let (sin, cos) = theta.sin_cos();
    let corners = [(0., 0.), (1., 0.), (0., 1.), (1., 1.)].map(|(fx, fy)| {
        let p = area.at(fx, fy);
        let (dx, dy) = (p.x - c.x, p.y - c.y);
        PointF32::new(c.x + dx * cos - dy * sin, c.y + dx * sin + dy * cos)
    });

    let (min_x, min_y, max_x, max_y) = corners.iter().fold(
        (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
        |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
        },
    );

    let left = min_x.floor().clamp(0., width as f32) as u32;
    let top = min_y.floor().clamp(0., height as f32) as u32;
    let right = max_x.ceil().clamp(0., width as f32) as u32;
    let bottom = max_y.ceil().clamp(0., height as f32) as u32;

    (right > left && bottom > top)
        .then(|| Rect::from_tl(left, top, right - left, bottom - top))
}

impl Render for Asset {
    fn render(&self, img: &mut RgbaImage, area: RectF32, fill: Rgb<u8>, angle: Option<f32>) {
        self.draw_tinted_chin(img, area, fill, angle);
    }

    fn aligns_to_face(&self) -> bool {
        self.align
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgba<u8> = Rgba([128, 128, 128, 255]);

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(400, 300, BG)
    }

    // Left half opaque, right half clear; outline is a single opaque row.
    fn half_mask_assets() -> OverlayAssets {
        let mask = RgbaImage::from_fn(20, 10, |x, _| {
            if x < 10 { Rgba([0, 0, 0, 255]) } else { CLEAR }
        });
        let outline = RgbaImage::from_fn(20, 10, |_, y| {
            if y == 0 { Rgba([0, 0, 0, 255]) } else { CLEAR }
        });
        OverlayAssets::new(mask, outline)
    }

    fn assert_near(actual: Rgba<u8>, expected: Rgba<u8>) {
        for (a, e) in actual.0.iter().zip(expected.0.iter()) {
            assert!(a.abs_diff(*e) <= 2, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_not_ready_is_noop() {
        for assets in [
            OverlayAssets::default(),
            OverlayAssets {
                mask: Some(RgbaImage::new(10, 10)),
                outline: None,
            },
            OverlayAssets::new(RgbaImage::new(0, 0), RgbaImage::new(10, 10)),
        ] {
            assert!(!assets.is_ready());
            let renderer = Asset::new(Arc::new(assets), true);
            let mut img = canvas();
            let area = RectF32::from_tl(10., 10., 100., 50.);
            renderer.render(&mut img, area, Rgb([1, 2, 3]), Some(0.3));
            assert_eq!(img, canvas());
        }
    }

    #[test]
    fn test_missing_files_not_ready() {
        let assets = OverlayAssets::load(
            Path::new("/nonexistent/mask.png"),
            Path::new("/nonexistent/outline.png"),
        );
        assert!(!assets.is_ready());
    }

    #[test]
    fn test_composite_tints_mask() {
        let out = half_mask_assets().composite(Rgb([200, 100, 50])).unwrap();

        assert_near(*out.get_pixel(3, 5), Rgba([200, 100, 50, 255]));
        assert_eq!(out.get_pixel(15, 5)[3], 0);
        // Outline lands on top of the tint
        assert_near(*out.get_pixel(3, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_draw_scaled_into_area() {
        let renderer = Asset::new(Arc::new(half_mask_assets()), false);
        let mut img = canvas();
        let area = RectF32::from_tl(100., 100., 200., 100.);
        renderer.render(&mut img, area, Rgb([200, 100, 50]), None);

        // Tinted half
        assert_near(*img.get_pixel(150, 150), Rgba([200, 100, 50, 255]));
        // Clear half leaves the photo alone
        assert_near(*img.get_pixel(250, 150), BG);
        // Outside the area
        assert_eq!(*img.get_pixel(50, 50), BG);
    }

    #[test]
    fn test_rotation_about_center() {
        let renderer = Asset::new(Arc::new(half_mask_assets()), true);
        let area = RectF32::from_tl(100., 100., 200., 100.);

        let mut img = canvas();
        renderer.render(&mut img, area, Rgb([200, 100, 50]), Some(std::f32::consts::PI));

        // Half a turn swaps which side is tinted. Bilinear sampling can be
        // off by a unit.
        assert_near(*img.get_pixel(250, 150), Rgba([200, 100, 50, 255]));
        assert_near(*img.get_pixel(150, 150), BG);
    }

    #[test]
    fn test_huge_area_only_draws_visible_part() {
        let renderer = Asset::new(Arc::new(half_mask_assets()), true);
        // The canvas sits inside the tinted half, far from the outline row
        let area = RectF32::from_tl(-1e6, -1e6, 4e6, 2e6);

        for angle in [None, Some(1e-4)] {
            let mut img = canvas();
            renderer.render(&mut img, area, Rgb([200, 100, 50]), angle);
            for p in img.pixels() {
                assert_near(*p, Rgba([200, 100, 50, 255]));
            }
        }
    }

    #[test]
    fn test_visible_window() {
        let area = RectF32::from_tl(100., 100., 200., 100.);
        assert_eq!(
            visible_window(area, 0., 400, 300),
            Some(Rect::from_tl(100, 100, 200, 100))
        );

        // A quarter turn stands the area on end about (200, 150)
        let w = visible_window(area, std::f32::consts::FRAC_PI_2, 400, 300).unwrap();
        assert!(w.left() <= 150 && w.left() >= 149, "{w:?}");
        assert!(w.top() <= 50 && w.top() >= 49, "{w:?}");
        assert!(w.right() >= 250 && w.right() <= 251, "{w:?}");
        assert!(w.bottom() >= 250 && w.bottom() <= 251, "{w:?}");

        let overhang = visible_window(RectF32::from_tl(-1e9, 250., 2e9, 1e9), 0.3, 400, 300);
        assert_eq!(overhang, Some(Rect::from_tl(0, 0, 400, 300)));

        assert_eq!(visible_window(RectF32::from_tl(500., 0., 50., 50.), 0., 400, 300), None);
    }

    #[test]
    fn test_builtin_ready_and_idempotent() {
        let assets = Arc::new(OverlayAssets::builtin(128, Rgb([0, 0, 0]), 3));
        assert!(assets.is_ready());

        let renderer = Asset::new(assets, true);
        let area = RectF32::from_tl(120., 195., 160., 60.);

        let mut a = canvas();
        let mut b = canvas();
        renderer.render(&mut a, area, Rgb([138, 138, 138]), Some(0.2));
        renderer.render(&mut b, area, Rgb([138, 138, 138]), Some(0.2));

        assert_eq!(a, b);
        assert_ne!(a, canvas());
    }

    #[test]
    fn test_offscreen_does_not_panic() {
        let renderer = Asset::new(Arc::new(OverlayAssets::builtin(64, Rgb([0, 0, 0]), 2)), true);
        let mut img = canvas();
        for area in [
            RectF32::from_tl(-300., -300., 100., 50.),
            RectF32::from_tl(390., 290., 100., 50.),
            RectF32::from_tl(10., 10., 0.2, 50.),
            RectF32::from_tl(10., 10., -100., -50.),
        ] {
            renderer.render(&mut img, area, Rgb([1, 2, 3]), Some(0.5));
            renderer.render(&mut img, area, Rgb([1, 2, 3]), None);
        }
    }
}
