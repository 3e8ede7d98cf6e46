//! Brightness/contrast adjustment.
//!
//! Applies the affine transform `out = in * contrast + brightness` to
//! every channel of every pixel, saturating to the 8-bit range.

use serde::{Deserialize, Serialize};

use crate::stage::{Stage, replace_input};
use crate::types::Frame;

/// Parameters for [`BrightnessContrast`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessContrastParams {
    /// Additive offset, in intensity levels.
    pub brightness: f32,
    /// Multiplicative gain.
    pub contrast: f32,
}

impl BrightnessContrastParams {
    /// Slider range for `brightness`.
    pub const BRIGHTNESS_RANGE: std::ops::RangeInclusive<f32> = -100.0..=100.0;
    /// Slider range for `contrast`.
    pub const CONTRAST_RANGE: std::ops::RangeInclusive<f32> = 0.0..=3.0;
}

impl Default for BrightnessContrastParams {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
        }
    }
}

/// Apply `out = in * contrast + brightness` per channel, saturating.
#[must_use = "returns the adjusted frame"]
pub fn adjust(frame: &Frame, params: BrightnessContrastParams) -> Frame {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let map = |v: u8| {
        f32::from(v)
            .mul_add(params.contrast, params.brightness)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    match frame {
        Frame::Gray(img) => {
            let mut out = img.clone();
            for v in out.iter_mut() {
                *v = map(*v);
            }
            Frame::Gray(out)
        }
        Frame::Rgb(img) => {
            let mut out = img.clone();
            for v in out.iter_mut() {
                *v = map(*v);
            }
            Frame::Rgb(out)
        }
    }
}

/// Second pipeline stage: affine brightness/contrast transform.
#[derive(Debug)]
pub struct BrightnessContrast {
    input: Option<Frame>,
    output: Option<Frame>,
    params: BrightnessContrastParams,
    dirty: bool,
}

impl Default for BrightnessContrast {
    fn default() -> Self {
        Self::new()
    }
}

impl BrightnessContrast {
    /// Create the stage with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            params: BrightnessContrastParams::default(),
            dirty: true,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> BrightnessContrastParams {
        self.params
    }

    /// Replace the parameters, marking the stage dirty only when they
    /// actually changed.
    pub fn set_params(&mut self, params: BrightnessContrastParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }
}

impl Stage for BrightnessContrast {
    fn name(&self) -> &'static str {
        "brightness/contrast"
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
        let Some(input) = &self.input else {
            tracing::debug!(stage = self.name(), "no input frame, skipping");
            self.dirty = false;
            return;
        };
        self.output = Some(adjust(input, self.params));
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = BrightnessContrastParams::default();
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
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{GrayImage, RgbImage};

    #[test]
    fn identity_params_leave_frame_unchanged() {
        let frame = Frame::Rgb(RgbImage::from_pixel(3, 3, image::Rgb([10, 120, 250])));
        assert_eq!(adjust(&frame, BrightnessContrastParams::default()), frame);
    }

    #[test]
    fn brightness_shifts_and_saturates() {
        let frame = Frame::Gray(GrayImage::from_pixel(2, 2, image::Luma([200])));
        let params = BrightnessContrastParams {
            brightness: 100.0,
            contrast: 1.0,
        };
        let Frame::Gray(out) = adjust(&frame, params) else {
            panic!("expected gray output");
        };
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn contrast_scales_around_zero() {
        let frame = Frame::Gray(GrayImage::from_pixel(1, 1, image::Luma([50])));
        let params = BrightnessContrastParams {
            brightness: 0.0,
            contrast: 2.0,
        };
        let Frame::Gray(out) = adjust(&frame, params) else {
            panic!("expected gray output");
        };
        assert_eq!(out.get_pixel(0, 0).0[0], 100);
    }

    #[test]
    fn negative_result_clamps_to_zero() {
        let frame = Frame::Gray(GrayImage::from_pixel(1, 1, image::Luma([30])));
        let params = BrightnessContrastParams {
            brightness: -100.0,
            contrast: 1.0,
        };
        let Frame::Gray(out) = adjust(&frame, params) else {
            panic!("expected gray output");
        };
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn empty_input_is_a_silent_no_op() {
        let mut stage = BrightnessContrast::new();
        stage.process();
        assert!(stage.output().is_none());
        assert!(!stage.is_dirty());
    }

    #[test]
    fn process_twice_is_idempotent_once_clean() {
        let mut stage = BrightnessContrast::new();
        stage.set_input(&Frame::Gray(GrayImage::from_pixel(4, 4, image::Luma([90]))));
        stage.process();
        let first = stage.output().cloned().unwrap();
        stage.process();
        assert_eq!(stage.output(), Some(&first));
    }

    #[test]
    fn reset_restores_defaults_and_marks_dirty() {
        let mut stage = BrightnessContrast::new();
        stage.set_params(BrightnessContrastParams {
            brightness: 40.0,
            contrast: 2.5,
        });
        stage.set_input(&Frame::Gray(GrayImage::new(2, 2)));
        stage.process();
        stage.reset();
        assert_eq!(stage.params(), BrightnessContrastParams::default());
        assert!(stage.is_dirty());
        assert!(stage.output().is_none());
    }

    #[test]
    fn unchanged_params_do_not_mark_dirty() {
        let mut stage = BrightnessContrast::new();
        stage.set_input(&Frame::Gray(GrayImage::new(2, 2)));
        stage.process();
        stage.set_params(stage.params());
        assert!(!stage.is_dirty());
    }
}
