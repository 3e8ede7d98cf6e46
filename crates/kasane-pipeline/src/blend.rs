//! Two-input compositing with a selectable formula and opacity.
//!
//! The overlay input is resized (bilinear) and channel-converted to
//! match the base input before blending, so the formulas below always
//! see two buffers of identical shape. All five formulas operate on
//! individual channel bytes.

use serde::{Deserialize, Serialize};

use crate::stage::{Stage, replace_input};
use crate::types::Frame;

/// Compositing formula selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    /// Linear cross-dissolve from base to overlay.
    Normal,
    /// Product of the two inputs, scaled by opacity.
    Multiply,
    /// Double inverse-multiply, lerped with the base by opacity.
    Screen,
    /// Per-pixel conditional: multiply in shadows, screen in
    /// highlights, lerped with the base by opacity.
    Overlay,
    /// Absolute per-channel difference; opacity is ignored.
    Difference,
}

impl BlendMode {
    /// All modes in UI order.
    pub const ALL: [Self; 5] = [
        Self::Normal,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Difference,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
            Self::Overlay => "Overlay",
            Self::Difference => "Difference",
        }
    }
}

/// Parameters for [`Blend`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendParams {
    /// Which compositing formula to apply.
    pub mode: BlendMode,
    /// Overlay weight in `[0, 1]`.
    pub opacity: f32,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            mode: BlendMode::Normal,
            opacity: 0.5,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_channel(mode: BlendMode, opacity: f32, base: u8, over: u8) -> u8 {
    let (a, b) = (f32::from(base), f32::from(over));
    let value = match mode {
        // Opacity 1.0 yields the overlay exactly, 0.0 the base.
        BlendMode::Normal => a.mul_add(1.0 - opacity, b * opacity),
        BlendMode::Multiply => a * b * opacity / 255.0,
        BlendMode::Screen => {
            let screen = 255.0 - (255.0 - a) * (255.0 - b) / 255.0;
            a.mul_add(1.0 - opacity, screen * opacity)
        }
        BlendMode::Overlay => {
            let combined = if base < 128 {
                2.0 * a * b / 255.0
            } else {
                255.0 - 2.0 * (255.0 - a) * (255.0 - b) / 255.0
            };
            combined.mul_add(opacity, a * (1.0 - opacity))
        }
        BlendMode::Difference => (a - b).abs(),
    };
    value.round().clamp(0.0, 255.0) as u8
}

/// Blend `overlay` onto `base`.
///
/// The overlay is first resized and channel-converted to match the
/// base, so differently shaped inputs are accepted.
#[must_use = "returns the blended frame"]
pub fn blend_frames(base: &Frame, overlay: &Frame, params: BlendParams) -> Frame {
    let overlay = if overlay.width() == base.width() && overlay.height() == base.height() {
        overlay.clone()
    } else {
        overlay.resized(base.width(), base.height())
    };
    let overlay = overlay.matched_to(base);

    let combine = |out: &mut [u8], over: &[u8]| {
        for (o, &b) in out.iter_mut().zip(over) {
            *o = blend_channel(params.mode, params.opacity, *o, b);
        }
    };
    match (base, overlay) {
        (Frame::Gray(a), Frame::Gray(b)) => {
            let mut out = a.clone();
            combine(&mut out, b.as_raw());
            Frame::Gray(out)
        }
        (Frame::Rgb(a), Frame::Rgb(b)) => {
            let mut out = a.clone();
            combine(&mut out, b.as_raw());
            Frame::Rgb(out)
        }
        // matched_to guarantees identical variants.
        (base, _) => base.clone(),
    }
}

/// Fifth pipeline stage: compositing of the working frame with the
/// original source frame.
#[derive(Debug)]
pub struct Blend {
    input: Option<Frame>,
    overlay: Option<Frame>,
    output: Option<Frame>,
    params: BlendParams,
    dirty: bool,
}

impl Default for Blend {
    fn default() -> Self {
        Self::new()
    }
}

impl Blend {
    /// Create the stage with a 50% Normal blend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            overlay: None,
            output: None,
            params: BlendParams::default(),
            dirty: true,
        }
    }

    /// Store the secondary (overlay) input, with the same equality
    /// short-circuit as the primary input.
    pub fn set_overlay(&mut self, frame: &Frame) {
        if replace_input(&mut self.overlay, frame) {
            self.dirty = true;
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> BlendParams {
        self.params
    }

    /// Replace the parameters, marking dirty only on actual change.
    pub fn set_params(&mut self, params: BlendParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }
}

impl Stage for Blend {
    fn name(&self) -> &'static str {
        "blend"
    }

    fn set_input(&mut self, frame: &Frame) {
        if replace_input(&mut self.input, frame) {
            self.dirty = true;
        }
    }

    fn process(&mut self) {
        if !self.dirty {
            return;
        }
        let (Some(base), Some(overlay)) = (&self.input, &self.overlay) else {
            tracing::warn!(stage = self.name(), "one or both inputs missing, skipping");
            self.dirty = false;
            return;
        };
        self.output = Some(blend_frames(base, overlay, self.params));
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = BlendParams::default();
        self.output = None;
        self.dirty = true;
    }

    fn output(&self) -> Option<&Frame> {
        self.output.as_ref()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{GrayImage, RgbImage};

    fn base() -> Frame {
        Frame::Rgb(RgbImage::from_pixel(2, 2, image::Rgb([40, 80, 120])))
    }

    fn overlay() -> Frame {
        Frame::Rgb(RgbImage::from_pixel(2, 2, image::Rgb([200, 100, 60])))
    }

    #[test]
    fn normal_full_opacity_equals_overlay() {
        let params = BlendParams {
            mode: BlendMode::Normal,
            opacity: 1.0,
        };
        assert_eq!(blend_frames(&base(), &overlay(), params), overlay());
    }

    #[test]
    fn normal_zero_opacity_equals_base() {
        let params = BlendParams {
            mode: BlendMode::Normal,
            opacity: 0.0,
        };
        assert_eq!(blend_frames(&base(), &overlay(), params), base());
    }

    #[test]
    fn multiply_with_black_is_black() {
        let black = Frame::Rgb(RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0])));
        let params = BlendParams {
            mode: BlendMode::Multiply,
            opacity: 1.0,
        };
        assert_eq!(blend_frames(&base(), &black, params), black);
    }

    #[test]
    fn screen_with_white_is_white() {
        let white = Frame::Rgb(RgbImage::from_pixel(2, 2, image::Rgb([255, 255, 255])));
        let params = BlendParams {
            mode: BlendMode::Screen,
            opacity: 1.0,
        };
        assert_eq!(blend_frames(&base(), &white, params), white);
    }

    #[test]
    fn difference_of_identical_frames_is_black() {
        let params = BlendParams {
            mode: BlendMode::Difference,
            opacity: 0.3,
        };
        let out = blend_frames(&base(), &base(), params);
        assert!(out.raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn overlay_darkens_shadows_and_brightens_highlights() {
        let params = BlendParams {
            mode: BlendMode::Overlay,
            opacity: 1.0,
        };
        let dark = blend_channel(params.mode, params.opacity, 60, 60);
        let bright = blend_channel(params.mode, params.opacity, 200, 200);
        assert!(dark < 60, "shadow should darken, got {dark}");
        assert!(bright > 200, "highlight should brighten, got {bright}");
    }

    #[test]
    fn mismatched_overlay_is_resized_and_converted() {
        let small_gray = Frame::Gray(GrayImage::from_pixel(1, 1, image::Luma([100])));
        let params = BlendParams::default();
        let out = blend_frames(&base(), &small_gray, params);
        assert_eq!((out.width(), out.height(), out.channels()), (2, 2, 3));
    }

    #[test]
    fn missing_overlay_input_skips_processing() {
        let mut stage = Blend::new();
        stage.set_input(&base());
        stage.process();
        assert!(stage.output().is_none());
        assert!(!stage.is_dirty());
    }

    #[test]
    fn process_twice_is_idempotent_once_clean() {
        let mut stage = Blend::new();
        stage.set_input(&base());
        stage.set_overlay(&overlay());
        stage.process();
        let first = stage.output().cloned().unwrap();
        stage.process();
        assert_eq!(stage.output(), Some(&first));
    }
}
