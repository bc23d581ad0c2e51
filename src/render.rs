use crate::shapes::rect::RectF32;
pub use asset::{Asset, OverlayAssets};
use image::{Rgb, RgbaImage};
pub use procedural::{Procedural, draw_balls_chin};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod asset;
mod procedural;

pub trait Render {
    /// Draw the chin into `area` of `img`. Never fails; parts of the overlay
    /// that fall outside the image are dropped.
    fn render(&self, img: &mut RgbaImage, area: RectF32, fill: Rgb<u8>, angle: Option<f32>);

    /// Whether the overlay should be rotated to follow the eye line.
    fn aligns_to_face(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Procedural,
    Asset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub kind: RendererKind,
    pub outline_color: [u8; 3],
    pub stroke_width: u32,
    /// Shape mask for the asset renderer. Both paths must be set to load
    /// from disk; otherwise a built-in pair is drawn.
    pub mask_path: Option<PathBuf>,
    pub outline_path: Option<PathBuf>,
    pub builtin_size: u32,
    pub align_to_face: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Procedural,
            outline_color: [0, 0, 0],
            stroke_width: 3,
            mask_path: None,
            outline_path: None,
            builtin_size: 256,
            align_to_face: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Renderer {
    Procedural(Procedural),
    Asset(Asset),
}

impl From<Procedural> for Renderer {
    fn from(p: Procedural) -> Renderer {
        Renderer::Procedural(p)
    }
}

impl From<Asset> for Renderer {
    fn from(a: Asset) -> Renderer {
        Renderer::Asset(a)
    }
}

impl Renderer {
    /// Build the configured renderer. Asset images are loaded here, once,
    /// and shared by every draw afterwards.
    pub fn from_config(cfg: &RenderConfig) -> Renderer {
        let outline = Rgb(cfg.outline_color);

        match cfg.kind {
            RendererKind::Procedural => Procedural::new(outline, cfg.stroke_width).into(),
            RendererKind::Asset => {
                let assets = match (&cfg.mask_path, &cfg.outline_path) {
                    (Some(mask), Some(outline_path)) => {
                        info!("Loading overlay assets from {mask:?} and {outline_path:?}");
                        OverlayAssets::load(mask, outline_path)
                    }
                    _ => OverlayAssets::builtin(cfg.builtin_size, outline, cfg.stroke_width),
                };

                Asset::new(Arc::new(assets), cfg.align_to_face).into()
            }
        }
    }
}

impl Render for Renderer {
    fn render(&self, img: &mut RgbaImage, area: RectF32, fill: Rgb<u8>, angle: Option<f32>) {
        match self {
            Renderer::Procedural(r) => r.render(img, area, fill, angle),
            Renderer::Asset(r) => r.render(img, area, fill, angle),
        }
    }

    fn aligns_to_face(&self) -> bool {
        match self {
            Renderer::Procedural(r) => r.aligns_to_face(),
            Renderer::Asset(r) => r.aligns_to_face(),
        }
    }
}
