use crate::config::Config;
use crate::detector::{self, LandmarkDetector};
use crate::placement::{self, Placement, PlacementParams};
use crate::render::{Render, Renderer};
use crate::sampler::ColorSampler;
use crate::shapes::rect::Rect;
use anyhow::{Context, Error, Result};
use image::{ImageFormat, Rgb, RgbaImage};
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one generate run decided, for callers that want to report it.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub placement: Placement,
    pub sampled: Rect,
    pub color: Rgb<u8>,
    pub angle: Option<f32>,
}

/// State for one user working on one photo: the upload, the last result,
/// and whether the controls that start a run are live.
pub struct Session {
    config: Config,
    sampler: ColorSampler,
    renderer: Renderer,
    source: Option<RgbaImage>,
    output: Option<RgbaImage>,
    controls_enabled: bool,
}

// Clears the flag for as long as it lives; dropping it restores the flag no
// matter how the run ended.
struct ControlsGuard<'a> {
    enabled: &'a mut bool,
}

impl<'a> ControlsGuard<'a> {
    fn disable(enabled: &'a mut bool) -> Self {
        *enabled = false;
        Self { enabled }
    }
}

impl Drop for ControlsGuard<'_> {
    fn drop(&mut self) {
        *self.enabled = true;
    }
}

impl Session {
    pub fn new(config: Config) -> Self {
        let renderer = Renderer::from_config(&config.render);
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(config: Config, renderer: Renderer) -> Self {
        Self {
            sampler: ColorSampler::new(config.sampler),
            renderer,
            config,
            source: None,
            output: None,
            controls_enabled: true,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    pub fn source(&self) -> Option<&RgbaImage> {
        self.source.as_ref()
    }

    pub fn output(&self) -> Option<&RgbaImage> {
        self.output.as_ref()
    }

    /// Decode an uploaded file, replacing any previous image and result.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<()> {
        let img = image::load_from_memory(bytes).context("decoding image")?;
        self.set_image(img.into_rgba8());
        Ok(())
    }

    pub fn set_image(&mut self, img: RgbaImage) {
        info!("Loaded {}x{} image", img.width(), img.height());
        self.source = Some(img);
        self.output = None;
    }

    /// Place, tint and draw the chin over a fresh copy of the loaded image.
    /// Detector trouble of any kind falls back to the fixed layout; the only
    /// error is having no image to work on.
    pub async fn generate(
        &mut self,
        detector: &dyn LandmarkDetector,
        params: PlacementParams,
    ) -> Result<Generated> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| Error::msg("No image loaded, nothing to generate"))?;
        let _controls = ControlsGuard::disable(&mut self.controls_enabled);
        let start = Instant::now();
        let (width, height) = source.dimensions();

        let landmarks = detector::detect_within(detector, source, &self.config.detector).await;
        debug!("{}ms at Face Detection", start.elapsed().as_millis());

        let placement = placement::place(landmarks.as_ref(), width, height, &params);
        let angle = match &landmarks {
            Some(l) if self.renderer.aligns_to_face() => l.eye_angle(width, height),
            _ => None,
        };

        let area = placement.rect();
        let sampled = self.sampler.region(width, height, area);
        let color = self.sampler.sample(source, area);
        debug!("{}ms at Color Sampling", start.elapsed().as_millis());

        let mut output = source.clone();
        self.renderer.render(&mut output, area, color, angle);
        self.output = Some(output);
        debug!("{}ms at Render", start.elapsed().as_millis());

        info!("Drew chin at {area:?} in {color:?}");

        Ok(Generated {
            placement,
            sampled,
            color,
            angle,
        })
    }

    /// Lossless encoding of the latest result, ready to offer as a download.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| Error::msg("Nothing generated yet"))?;

        let mut buf = Cursor::new(Vec::new());
        output
            .write_to(&mut buf, ImageFormat::Png)
            .context("encoding png")?;

        Ok(buf.into_inner())
    }

    pub fn download_name(&self) -> &str {
        &self.config.output.filename
    }
}
