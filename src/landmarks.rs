use crate::shapes::point::PointF32;
use crate::shapes::rect::RectF32;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Face mesh keypoints sitting roughly on the outer corners of each eye.
pub const L_EYE_IDX: usize = 33;
pub const R_EYE_IDX: usize = 263;

/// One face's keypoints, normalized to [0,1] relative to image dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub points: Vec<PointF32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarksFile {
    Bare(Vec<PointF32>),
    Wrapped { points: Vec<PointF32> },
}

impl From<LandmarksFile> for Landmarks {
    fn from(f: LandmarksFile) -> Landmarks {
        match f {
            LandmarksFile::Bare(points) => Landmarks::new(points),
            LandmarksFile::Wrapped { points } => Landmarks::new(points),
        }
    }
}

impl Landmarks {
    pub fn new(points: Vec<PointF32>) -> Self {
        Self { points }
    }

    /// Accepts either a bare array of `{"x", "y"}` points or an object with
    /// a `points` array.
    pub fn from_json(raw: &str) -> Result<Landmarks> {
        let file: LandmarksFile = serde_json::from_str(raw).context("parsing landmarks")?;
        Ok(file.into())
    }

    pub fn from_json_file(path: &Path) -> Result<Landmarks> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading landmarks at {}", path.display()))?;
        Landmarks::from_json(&raw)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of every keypoint in pixel space.
    pub fn bounds(&self, width: u32, height: u32) -> Option<RectF32> {
        let first = self.points.first()?.scale(width as f32, height as f32);

        let (min_x, min_y, max_x, max_y) = self.points.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| {
                let p = p.scale(width as f32, height as f32);
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        );

        Some(RectF32::from_bounds(min_x, min_y, max_x, max_y))
    }

    /// Tilt of the eye line in radians, measured in pixel space so that
    /// non-square images don't skew the result.
    pub fn eye_angle(&self, width: u32, height: u32) -> Option<f32> {
        let l = self.points.get(L_EYE_IDX)?.scale(width as f32, height as f32);
        let r = self.points.get(R_EYE_IDX)?.scale(width as f32, height as f32);

        Some(l.angle_to(&r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_with_eyes(l: PointF32, r: PointF32) -> Landmarks {
        let mut points = vec![PointF32::new(0.5, 0.5); 468];
        points[L_EYE_IDX] = l;
        points[R_EYE_IDX] = r;
        Landmarks::new(points)
    }

    #[test]
    fn test_bounds() {
        let lm = Landmarks::new(vec![
            PointF32::new(0.4, 0.3),
            PointF32::new(0.6, 0.35),
            PointF32::new(0.5, 0.7),
        ]);

        let b = lm.bounds(200, 100).unwrap();
        assert!((b.x - 80.).abs() < 1e-4);
        assert!((b.y - 30.).abs() < 1e-4);
        assert!((b.w - 40.).abs() < 1e-4);
        assert!((b.h - 40.).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_empty() {
        assert_eq!(Landmarks::new(Vec::new()).bounds(200, 100), None);
    }

    #[test]
    fn test_eye_angle_level() {
        let lm = mesh_with_eyes(PointF32::new(0.3, 0.4), PointF32::new(0.7, 0.4));
        assert_eq!(lm.eye_angle(640, 480), Some(0.));
    }

    #[test]
    fn test_eye_angle_uses_pixel_space() {
        // 0.1 normalized in each axis on a 2:1 image is not 45 degrees
        let lm = mesh_with_eyes(PointF32::new(0.4, 0.4), PointF32::new(0.5, 0.5));
        let theta = lm.eye_angle(200, 100).unwrap();
        assert!((theta - (10f32).atan2(20.)).abs() < 1e-6);
    }

    #[test]
    fn test_eye_angle_short_mesh() {
        let lm = Landmarks::new(vec![PointF32::new(0.5, 0.5); 100]);
        assert_eq!(lm.eye_angle(640, 480), None);
    }

    #[test]
    fn test_from_json() {
        let bare = r#"[{"x": 0.1, "y": 0.2}, {"x": 0.3, "y": 0.4, "z": 0.0}]"#;
        let wrapped = r#"{"points": [{"x": 0.1, "y": 0.2}, {"x": 0.3, "y": 0.4}]}"#;
        let bare = Landmarks::from_json(bare).unwrap();
        let wrapped = Landmarks::from_json(wrapped).unwrap();

        assert_eq!(bare, wrapped);
        assert_eq!(bare.points[1], PointF32::new(0.3, 0.4));
        assert!(Landmarks::from_json(r#"{"faces": []}"#).is_err());
    }
}
