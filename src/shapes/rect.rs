use super::point::PointF32;

// Unlike the detector-facing rects these are anchored at the top-left
// corner, matching how overlays are laid out on the canvas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RectF32 {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl RectF32 {
    pub fn from_tl(x: f32, y: f32, w: f32, h: f32) -> RectF32 {
        RectF32 { x, y, w, h }
    }

    pub fn from_bounds(left: f32, top: f32, right: f32, bottom: f32) -> RectF32 {
        RectF32 {
            x: left,
            y: top,
            w: right - left,
            h: bottom - top,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }
    pub fn right(&self) -> f32 {
        self.x + self.w
    }
    pub fn top(&self) -> f32 {
        self.y
    }
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite())
    }

    pub fn center(&self) -> PointF32 {
        PointF32 {
            x: self.x + self.w / 2.,
            y: self.y + self.h / 2.,
        }
    }

    /// Point at a fractional offset into the rect, e.g. (0.5, 0.5) is the
    /// center.
    pub fn at(&self, fx: f32, fy: f32) -> PointF32 {
        PointF32 {
            x: self.x + self.w * fx,
            y: self.y + self.h * fy,
        }
    }

    /// Whole-pixel rect that lies entirely within a `max_x` by `max_y`
    /// image. Edges snap to the nearest pixel; collapses to zero area when
    /// there is no overlap.
    pub fn clamp_to(&self, max_x: u32, max_y: u32) -> Rect {
        let snap = |v: f32, max: u32| v.round().clamp(0., max as f32) as u32;

        let left = snap(self.left(), max_x);
        let top = snap(self.top(), max_y);
        let right = snap(self.right(), max_x);
        let bottom = snap(self.bottom(), max_y);

        Rect {
            x: left,
            y: top,
            w: right.saturating_sub(left),
            h: bottom.saturating_sub(top),
        }
    }
}

impl Rect {
    pub fn from_tl(x: u32, y: u32, w: u32, h: u32) -> Rect {
        Rect { x, y, w, h }
    }

    pub fn left(&self) -> u32 {
        self.x
    }
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    pub fn top(&self) -> u32 {
        self.y
    }
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u32 {
        self.w * self.h
    }
}
