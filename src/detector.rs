use crate::landmarks::Landmarks;
use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{Instrument, Level, info, span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    pub max_faces: u32,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            refine_landmarks: false,
            min_detection_confidence: 0.6,
            min_tracking_confidence: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    #[serde(flatten)]
    pub options: DetectorOptions,
    pub timeout_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            options: DetectorOptions::default(),
            timeout_ms: 5000,
        }
    }
}

/// Face landmark source. Implementations resolve to `None` when the image
/// has no face.
pub trait LandmarkDetector {
    fn detect<'a>(
        &'a self,
        img: &'a RgbaImage,
        opts: &'a DetectorOptions,
    ) -> BoxFuture<'a, Result<Option<Landmarks>>>;
}

/// Never finds a face, so every run takes the fallback layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetector;

impl LandmarkDetector for NoDetector {
    fn detect<'a>(
        &'a self,
        _img: &'a RgbaImage,
        _opts: &'a DetectorOptions,
    ) -> BoxFuture<'a, Result<Option<Landmarks>>> {
        futures::future::ready(Ok(None)).boxed()
    }
}

/// Hands back landmarks computed ahead of time, e.g. by a detector run
/// outside this process.
#[derive(Debug, Clone)]
pub struct StaticDetector {
    landmarks: Landmarks,
}

impl StaticDetector {
    pub fn new(landmarks: Landmarks) -> Self {
        Self { landmarks }
    }
}

impl LandmarkDetector for StaticDetector {
    fn detect<'a>(
        &'a self,
        _img: &'a RgbaImage,
        _opts: &'a DetectorOptions,
    ) -> BoxFuture<'a, Result<Option<Landmarks>>> {
        let found = (!self.landmarks.is_empty()).then(|| self.landmarks.clone());
        futures::future::ready(Ok(found)).boxed()
    }
}

/// Run `detector` for at most the configured timeout. Errors and timeouts
/// are logged and reported as no face.
pub async fn detect_within(
    detector: &dyn LandmarkDetector,
    img: &RgbaImage,
    cfg: &DetectorConfig,
) -> Option<Landmarks> {
    let timeout = Duration::from_millis(cfg.timeout_ms);
    let detection = tokio::time::timeout(timeout, detector.detect(img, &cfg.options))
        .instrument(span!(Level::DEBUG, "detect_within"));

    match detection.await {
        Ok(Ok(Some(landmarks))) => Some(landmarks),
        Ok(Ok(None)) => {
            info!("No face detected, using fallback layout");
            None
        }
        Ok(Err(e)) => {
            warn!("Face detection failed, using fallback layout: {e:?}");
            None
        }
        Err(_) => {
            warn!("Face detection timed out after {timeout:?}, using fallback layout");
            None
        }
    }
}
