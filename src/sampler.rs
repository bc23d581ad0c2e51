use crate::shapes::rect::{Rect, RectF32};
use image::{Rgb, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, span};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sample every nth pixel of the region.
    pub stride: usize,
    /// Added to each averaged channel, saturating at 255.
    pub brighten: u8,
    /// Only look at this fraction of the region's height, from the top.
    pub top_fraction: Option<f32>,
    /// Exclusive (low, high) bounds on mean channel brightness.
    pub brightness_range: Option<(u8, u8)>,
    pub default_color: [u8; 3],
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            stride: 10,
            brighten: 10,
            top_fraction: None,
            brightness_range: None,
            default_color: [255, 220, 177],
        }
    }
}

impl SamplerConfig {
    /// Tuned to skip clothing below the chin plus hair, shadow and
    /// highlights.
    pub fn face_aware() -> Self {
        Self {
            brighten: 15,
            top_fraction: Some(0.4),
            brightness_range: Some((40, 230)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorSampler {
    config: SamplerConfig,
}

impl ColorSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Pixels of a `width` by `height` image that `sample` reads for `area`.
    pub fn region(&self, width: u32, height: u32, area: RectF32) -> Rect {
        let mut area = area;
        if let Some(frac) = self.config.top_fraction {
            area.h *= frac;
        }

        area.clamp_to(width, height)
    }

    /// Estimate a skin tone for `area`. Always yields a usable color: areas
    /// that miss the image, or where every pixel is filtered out, get the
    /// configured default.
    pub fn sample(&self, img: &RgbaImage, area: RectF32) -> Rgb<u8> {
        let span = span!(Level::DEBUG, "ColorSampler#sample");
        let _guard = span.enter();

        let region = self.region(img.width(), img.height(), area);
        if region.area() == 0 {
            debug!("Empty sample region for {area:?}, using default color");
            return Rgb(self.config.default_color);
        }

        let mut sums = [0u64; 3];
        let mut count = 0u64;

        let coords = (region.top()..region.bottom())
            .flat_map(|y| (region.left()..region.right()).map(move |x| (x, y)));

        for (x, y) in coords.step_by(self.config.stride.max(1)) {
            let [r, g, b, _] = img.get_pixel(x, y).0;

            if let Some((low, high)) = self.config.brightness_range {
                let brightness = (r as f32 + g as f32 + b as f32) / 3.;
                if brightness <= low as f32 || brightness >= high as f32 {
                    continue;
                }
            }

            sums[0] += r as u64;
            sums[1] += g as u64;
            sums[2] += b as u64;
            count += 1;
        }

        if count == 0 {
            debug!("All samples in {region:?} filtered out, using default color");
            return Rgb(self.config.default_color);
        }

        let color = Rgb(sums.map(|s| (s / count + self.config.brighten as u64).min(255) as u8));
        debug!("Sampled {color:?} from {count} pixels");

        color
    }
}
