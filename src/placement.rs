use crate::landmarks::Landmarks;
use crate::shapes::rect::RectF32;
use tracing::debug;

/// User-facing knobs for overlay size and position. None of these are range
/// checked; extreme values just push the overlay off the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    pub intensity: f32,
    pub width_factor: Option<f32>,
    pub vertical_offset: Option<f32>,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            width_factor: None,
            vertical_offset: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Detected(RectF32),
    Fallback(RectF32),
}

impl Placement {
    pub fn rect(&self) -> RectF32 {
        match self {
            Placement::Detected(r) | Placement::Fallback(r) => *r,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Placement::Detected(_))
    }
}

/// Overlay rect hanging off the bottom of a detected face.
pub fn detected(face: RectF32, params: &PlacementParams) -> RectF32 {
    let w = face.w * (0.45 + 0.3 * params.intensity) * params.width_factor.unwrap_or(1.);
    let h = face.h * (0.25 + 0.15 * params.intensity);

    let x = face.center().x - w / 2.;
    let y = face.bottom() - 0.4 * h + params.vertical_offset.unwrap_or(0.) * face.h;

    RectF32::from_tl(x, y, w, h)
}

/// Overlay rect proportional to the whole canvas, for when no face is known.
pub fn fallback(canvas_w: u32, canvas_h: u32, params: &PlacementParams) -> RectF32 {
    let (cw, ch) = (canvas_w as f32, canvas_h as f32);

    let w = cw * (0.3 + 0.2 * params.intensity) * params.width_factor.unwrap_or(1.);
    let h = ch * (0.15 + 0.1 * params.intensity);

    let x = cw / 2. - w / 2.;
    let y = 0.65 * ch + params.vertical_offset.unwrap_or(0.) * ch;

    RectF32::from_tl(x, y, w, h)
}

pub fn place(
    landmarks: Option<&Landmarks>,
    canvas_w: u32,
    canvas_h: u32,
    params: &PlacementParams,
) -> Placement {
    match landmarks.and_then(|l| l.bounds(canvas_w, canvas_h)) {
        Some(face) => {
            debug!("Face bounds: {face:?}");
            Placement::Detected(detected(face, params))
        }
        None => Placement::Fallback(fallback(canvas_w, canvas_h, params)),
    }
}
