//! Binarization with fixed, Otsu, or locally-adaptive cutoffs, plus a
//! 256-bin intensity histogram.
//!
//! Fixed and Otsu thresholds wrap [`imageproc::contrast`]; the
//! adaptive method compares each pixel against a Gaussian-weighted
//! local mean minus a constant, with the window size forced odd and at
//! least 3.
//!
//! The histogram always describes what the stage emits: the binarized
//! output when thresholding is enabled, the grayscale input otherwise.

use imageproc::contrast::ThresholdType;
use serde::{Deserialize, Serialize};

use crate::blur::gaussian_kernel;
use crate::stage::{Stage, replace_input};
use crate::types::{Frame, GrayImage};

/// Cutoff selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdMethod {
    /// Global cutoff at a fixed value.
    Fixed,
    /// Global cutoff chosen automatically by Otsu's method.
    Otsu,
    /// Per-pixel cutoff from a Gaussian-weighted local mean.
    Adaptive,
}

impl ThresholdMethod {
    /// All methods in UI order.
    pub const ALL: [Self; 3] = [Self::Fixed, Self::Otsu, Self::Adaptive];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Otsu => "Otsu",
            Self::Adaptive => "Adaptive",
        }
    }
}

/// Parameters for [`Threshold`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// When disabled the stage passes its input through unchanged.
    pub enabled: bool,
    /// Cutoff for [`ThresholdMethod::Fixed`].
    pub value: u8,
    /// Cutoff selection strategy.
    pub method: ThresholdMethod,
    /// Window size for the adaptive method; forced odd, at least 3.
    pub block_size: u32,
    /// Constant subtracted from the local mean (adaptive only).
    pub constant: f32,
}

impl ThresholdParams {
    /// Slider range for `block_size`.
    pub const BLOCK_RANGE: std::ops::RangeInclusive<u32> = 3..=31;
    /// Slider range for `constant`.
    pub const CONSTANT_RANGE: std::ops::RangeInclusive<f32> = -20.0..=20.0;
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            enabled: false,
            value: 128,
            method: ThresholdMethod::Fixed,
            block_size: 11,
            constant: 2.0,
        }
    }
}

/// Count pixel intensities into 256 bins.
#[must_use = "returns the histogram bins"]
pub fn intensity_histogram(image: &GrayImage) -> [u32; 256] {
    let mut bins = [0u32; 256];
    for value in image.iter() {
        bins[usize::from(*value)] += 1;
    }
    bins
}

/// Binarize against a Gaussian-weighted local mean minus `constant`.
///
/// `block_size` is forced odd and clamped to at least 3. A pixel maps
/// to 255 when it exceeds its local cutoff, 0 otherwise.
#[must_use = "returns the binarized image"]
pub fn adaptive_threshold(image: &GrayImage, block_size: u32, constant: f32) -> GrayImage {
    let block = block_size.max(3) | 1;
    let radius = (block - 1) / 2;
    let kernel = gaussian_kernel(radius);
    let local_mean: GrayImage = imageproc::filter::separable_filter(image, &kernel, &kernel);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let cutoff = f32::from(local_mean.get_pixel(x, y).0[0]) - constant;
        if f32::from(image.get_pixel(x, y).0[0]) > cutoff {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

/// Sixth pipeline stage: binarization and histogram.
#[derive(Debug)]
pub struct Threshold {
    input: Option<Frame>,
    output: Option<Frame>,
    params: ThresholdParams,
    histogram: [u32; 256],
    otsu_level: Option<u8>,
    dirty: bool,
}

impl Default for Threshold {
    fn default() -> Self {
        Self::new()
    }
}

impl Threshold {
    /// Create the stage, disabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            params: ThresholdParams::default(),
            histogram: [0; 256],
            otsu_level: None,
            dirty: true,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Replace the parameters, marking dirty only on actual change.
    pub fn set_params(&mut self, params: ThresholdParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }

    /// The 256-bin intensity histogram from the last process cycle.
    #[must_use]
    pub const fn histogram(&self) -> &[u32; 256] {
        &self.histogram
    }

    /// The cutoff Otsu's method computed on the last process cycle, if
    /// that method ran.
    #[must_use]
    pub const fn otsu_level(&self) -> Option<u8> {
        self.otsu_level
    }

    fn binarize(&mut self, gray: &GrayImage) -> GrayImage {
        match self.params.method {
            ThresholdMethod::Fixed => {
                imageproc::contrast::threshold(gray, self.params.value, ThresholdType::Binary)
            }
            ThresholdMethod::Otsu => {
                let level = imageproc::contrast::otsu_level(gray);
                self.otsu_level = Some(level);
                imageproc::contrast::threshold(gray, level, ThresholdType::Binary)
            }
            ThresholdMethod::Adaptive => {
                adaptive_threshold(gray, self.params.block_size, self.params.constant)
            }
        }
    }
}

impl Stage for Threshold {
    fn name(&self) -> &'static str {
        "threshold"
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
        let Some(input) = self.input.clone() else {
            tracing::debug!(stage = self.name(), "no input frame, skipping");
            self.dirty = false;
            return;
        };
        self.otsu_level = None;
        if self.params.enabled {
            let binary = self.binarize(&input.to_gray());
            self.histogram = intensity_histogram(&binary);
            self.output = Some(Frame::Gray(binary));
        } else {
            self.histogram = intensity_histogram(&input.to_gray());
            self.output = Some(input);
        }
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = ThresholdParams::default();
        self.output = None;
        self.histogram = [0; 256];
        self.otsu_level = None;
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
