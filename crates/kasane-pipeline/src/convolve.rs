//! Direct convolution with preset or hand-edited kernels.
//!
//! Ships the classic Sharpen / Emboss / Edge-Enhance coefficient
//! tables at 3x3 and 5x5, plus a fully editable custom kernel that
//! defaults to the identity. Kernels are applied by clamped direct
//! correlation with a float accumulator.

use imageproc::kernel::Kernel;
use serde::{Deserialize, Serialize};

use crate::stage::{Stage, replace_input};
use crate::types::Frame;

/// Kernel side length selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelSize {
    /// 3x3, nine coefficients.
    Three,
    /// 5x5, twenty-five coefficients.
    Five,
}

impl KernelSize {
    /// Side length in pixels.
    #[must_use]
    pub const fn side(self) -> u32 {
        match self {
            Self::Three => 3,
            Self::Five => 5,
        }
    }
}

/// Built-in coefficient table selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelPreset {
    /// Hand-edited coefficients.
    Custom,
    /// Center-weighted sharpening.
    Sharpen,
    /// Diagonal relief shading.
    Emboss,
    /// Strong center-surround enhancement.
    EdgeEnhance,
}

impl KernelPreset {
    /// All presets in UI order.
    pub const ALL: [Self; 4] = [Self::Custom, Self::Sharpen, Self::Emboss, Self::EdgeEnhance];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Sharpen => "Sharpen",
            Self::Emboss => "Emboss",
            Self::EdgeEnhance => "Edge Enhance",
        }
    }
}

const SHARPEN_3: [f32; 9] = [
    0.0, -1.0, 0.0, //
    -1.0, 5.0, -1.0, //
    0.0, -1.0, 0.0,
];

const EMBOSS_3: [f32; 9] = [
    -2.0, -1.0, 0.0, //
    -1.0, 1.0, 1.0, //
    0.0, 1.0, 2.0,
];

const EDGE_ENHANCE_3: [f32; 9] = [
    1.0, 1.0, 1.0, //
    1.0, -7.0, 1.0, //
    1.0, 1.0, 1.0,
];

const IDENTITY_3: [f32; 9] = [
    0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0,
];

const SHARPEN_5: [f32; 25] = [
    -1.0, -1.0, -1.0, -1.0, -1.0, //
    -1.0, 2.0, 2.0, 2.0, -1.0, //
    -1.0, 2.0, 8.0, 2.0, -1.0, //
    -1.0, 2.0, 2.0, 2.0, -1.0, //
    -1.0, -1.0, -1.0, -1.0, -1.0,
];

const EMBOSS_5: [f32; 25] = [
    -2.0, -1.0, 0.0, 1.0, 2.0, //
    -2.0, -1.0, 0.0, 1.0, 2.0, //
    -2.0, -1.0, 0.0, 1.0, 2.0, //
    -2.0, -1.0, 0.0, 1.0, 2.0, //
    -2.0, -1.0, 0.0, 1.0, 2.0,
];

const EDGE_ENHANCE_5: [f32; 25] = [
    1.0, 1.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, -24.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 1.0, 1.0,
];

const fn identity_5() -> [f32; 25] {
    let mut k = [0.0; 25];
    k[12] = 1.0;
    k
}

/// Parameters for [`ConvolutionFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvolutionParams {
    /// When disabled the stage passes its input through unchanged.
    pub enabled: bool,
    /// Kernel side length.
    pub size: KernelSize,
    /// Preset table, or [`KernelPreset::Custom`] for hand-edited
    /// coefficients.
    pub preset: KernelPreset,
    /// Editable 3x3 coefficients, row-major.
    pub custom3: [f32; 9],
    /// Editable 5x5 coefficients, row-major.
    pub custom5: [f32; 25],
}

impl ConvolutionParams {
    /// The coefficient table currently in effect.
    #[must_use]
    pub fn coefficients(&self) -> &[f32] {
        match (self.preset, self.size) {
            (KernelPreset::Custom, KernelSize::Three) => &self.custom3,
            (KernelPreset::Custom, KernelSize::Five) => &self.custom5,
            (KernelPreset::Sharpen, KernelSize::Three) => &SHARPEN_3,
            (KernelPreset::Sharpen, KernelSize::Five) => &SHARPEN_5,
            (KernelPreset::Emboss, KernelSize::Three) => &EMBOSS_3,
            (KernelPreset::Emboss, KernelSize::Five) => &EMBOSS_5,
            (KernelPreset::EdgeEnhance, KernelSize::Three) => &EDGE_ENHANCE_3,
            (KernelPreset::EdgeEnhance, KernelSize::Five) => &EDGE_ENHANCE_5,
        }
    }
}

impl Default for ConvolutionParams {
    fn default() -> Self {
        Self {
            enabled: false,
            size: KernelSize::Three,
            preset: KernelPreset::Sharpen,
            custom3: IDENTITY_3,
            custom5: identity_5(),
        }
    }
}

/// Apply the active kernel by clamped direct correlation.
#[must_use = "returns the filtered frame"]
pub fn convolve_frame(frame: &Frame, params: &ConvolutionParams) -> Frame {
    let side = params.size.side();
    let kernel = Kernel::new(params.coefficients(), side, side);
    match frame {
        Frame::Gray(img) => {
            Frame::Gray(imageproc::filter::filter_clamped::<_, f32, u8>(img, kernel))
        }
        Frame::Rgb(img) => {
            Frame::Rgb(imageproc::filter::filter_clamped::<_, f32, u8>(img, kernel))
        }
    }
}

/// Ninth pipeline stage: preset or custom convolution.
#[derive(Debug)]
pub struct ConvolutionFilter {
    input: Option<Frame>,
    output: Option<Frame>,
    params: ConvolutionParams,
    dirty: bool,
}

impl Default for ConvolutionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvolutionFilter {
    /// Create the stage, disabled by default, with the Sharpen preset
    /// selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            params: ConvolutionParams::default(),
            dirty: true,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &ConvolutionParams {
        &self.params
    }

    /// Replace the parameters, marking dirty only on actual change.
    pub fn set_params(&mut self, params: ConvolutionParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }
}

impl Stage for ConvolutionFilter {
    fn name(&self) -> &'static str {
        "convolution filter"
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
        self.output = if self.params.enabled {
            Some(convolve_frame(input, &self.params))
        } else {
            Some(input.clone())
        };
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = ConvolutionParams::default();
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

    #[test]
    fn sharpen_on_flat_gray_is_identity() {
        // The 3x3 sharpen coefficients sum to 1, so a flat field maps
        // to itself.
        let frame = Frame::Gray(GrayImage::from_pixel(8, 8, image::Luma([128])));
        let params = ConvolutionParams {
            enabled: true,
            ..ConvolutionParams::default()
        };
        assert_eq!(convolve_frame(&frame, &params), frame);
    }

    #[test]
    fn custom_identity_kernel_is_identity() {
        let frame = Frame::Rgb(RgbImage::from_pixel(4, 4, image::Rgb([10, 200, 55])));
        for size in [KernelSize::Three, KernelSize::Five] {
            let params = ConvolutionParams {
                enabled: true,
                preset: KernelPreset::Custom,
                size,
                ..ConvolutionParams::default()
            };
            assert_eq!(convolve_frame(&frame, &params), frame);
        }
    }

    #[test]
    fn edge_enhance_table_sums_to_one() {
        // Eight surround coefficients of 1 against a center of -7.
        let sum: f32 = ConvolutionParams {
            enabled: true,
            preset: KernelPreset::EdgeEnhance,
            ..ConvolutionParams::default()
        }
        .coefficients()
        .iter()
        .sum();
        assert!((sum - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn every_preset_table_has_matching_length() {
        for preset in KernelPreset::ALL {
            for size in [KernelSize::Three, KernelSize::Five] {
                let params = ConvolutionParams {
                    preset,
                    size,
                    ..ConvolutionParams::default()
                };
                let side = size.side() as usize;
                assert_eq!(params.coefficients().len(), side * side);
            }
        }
    }

    #[test]
    fn disabled_stage_passes_input_through() {
        let mut stage = ConvolutionFilter::new();
        let frame = Frame::Gray(GrayImage::from_pixel(4, 4, image::Luma([99])));
        stage.set_input(&frame);
        stage.process();
        assert_eq!(stage.output(), Some(&frame));
    }

    #[test]
    fn emboss_shifts_gradient_ramps() {
        let ramp = GrayImage::from_fn(8, 8, |x, _y| image::Luma([(x * 30) as u8]));
        let params = ConvolutionParams {
            enabled: true,
            preset: KernelPreset::Emboss,
            ..ConvolutionParams::default()
        };
        let Frame::Gray(out) = convolve_frame(&Frame::Gray(ramp.clone()), &params) else {
            unreachable!()
        };
        assert_ne!(out, ramp);
    }

    #[test]
    fn process_twice_is_idempotent_once_clean() {
        let mut stage = ConvolutionFilter::new();
        stage.set_params(ConvolutionParams {
            enabled: true,
            ..ConvolutionParams::default()
        });
        stage.set_input(&Frame::Gray(GrayImage::from_pixel(6, 6, image::Luma([40]))));
        stage.process();
        let first = stage.output().cloned().unwrap();
        stage.process();
        assert_eq!(stage.output(), Some(&first));
    }
}
