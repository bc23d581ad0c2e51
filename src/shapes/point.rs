use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointF32 {
    pub x: f32,
    pub y: f32,
}

impl PointF32 {
    pub fn new(x: f32, y: f32) -> PointF32 {
        PointF32 { x, y }
    }

    /// Map a normalized [0,1] point into pixel space.
    pub fn scale(&self, scale_x: f32, scale_y: f32) -> PointF32 {
        PointF32 {
            x: self.x * scale_x,
            y: self.y * scale_y,
        }
    }

    /// Angle in radians of the line from `self` to `other`. Positive values
    /// are clockwise in image space, where y grows downward.
    pub fn angle_to(&self, other: &PointF32) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale() {
        let p = PointF32::new(0.25, 0.5).scale(400., 300.);
        assert_eq!(p, PointF32::new(100., 150.));
    }

    #[test]
    fn test_angle_to() {
        let a = PointF32::new(10., 10.);
        assert_eq!(a.angle_to(&PointF32::new(20., 10.)), 0.);

        let down = a.angle_to(&PointF32::new(20., 20.));
        assert!((down - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }
}
