//! Deterministic procedural noise field.
//!
//! Each pixel sums `octaves` layers of a hash-style value noise,
//! `fract(sin(x·f·12.9898 + y·f·78.233) · 43758.5453)`, with the
//! frequency doubling and the amplitude decaying by `persistence` per
//! layer, then normalizes by the amplitude sum. No RNG is involved, so
//! identical parameters always produce bit-identical output.

use serde::{Deserialize, Serialize};

use crate::stage::{Stage, replace_input};
use crate::types::{Frame, GrayImage, RgbImage};

/// Parameters for [`NoiseGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// When disabled the stage passes its input through unchanged.
    pub enabled: bool,
    /// Base spatial frequency multiplier.
    pub scale: f32,
    /// Number of layered octaves.
    pub octaves: u32,
    /// Per-octave amplitude decay in `[0, 1]`.
    pub persistence: f32,
    /// Generated field width in pixels.
    pub width: u32,
    /// Generated field height in pixels.
    pub height: u32,
    /// Generate three independent planes instead of one.
    pub color: bool,
}

impl NoiseParams {
    /// Slider range for `octaves`.
    pub const OCTAVE_RANGE: std::ops::RangeInclusive<u32> = 1..=8;
    /// Slider range for `persistence`.
    pub const PERSISTENCE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;
    /// Slider range for `scale`.
    pub const SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.001..=0.1;
    /// Slider range for `width` and `height`.
    pub const SIZE_RANGE: std::ops::RangeInclusive<u32> = 16..=2048;
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            enabled: false,
            scale: 0.01,
            octaves: 4,
            persistence: 0.5,
            width: 512,
            height: 512,
            color: false,
        }
    }
}

fn hash_noise(x: f32, y: f32) -> f32 {
    let v = (x.mul_add(12.9898, y * 78.233)).sin() * 43758.5453;
    v - v.floor()
}

/// Normalized octave sum at `(x, y)`, in `[0, 1]`.
#[must_use = "returns the noise sample"]
pub fn noise_value(x: u32, y: u32, params: NoiseParams) -> f32 {
    let octaves = params.octaves.clamp(
        *NoiseParams::OCTAVE_RANGE.start(),
        *NoiseParams::OCTAVE_RANGE.end(),
    );
    let mut frequency = params.scale;
    let mut amplitude = 1.0f32;
    let mut total = 0.0f32;
    let mut total_amplitude = 0.0f32;
    #[allow(clippy::cast_precision_loss)]
    let (fx, fy) = (x as f32, y as f32);
    for _ in 0..octaves {
        total += amplitude * hash_noise(fx * frequency, fy * frequency);
        total_amplitude += amplitude;
        frequency *= 2.0;
        amplitude *= params.persistence;
    }
    total / total_amplitude
}

/// Generate the full noise frame described by `params`.
///
/// In color mode the three planes sample the field at per-plane
/// coordinate offsets, giving independent channels.
#[must_use = "returns the generated frame"]
pub fn generate_noise(params: NoiseParams) -> Frame {
    let (w, h) = (
        params.width.clamp(*NoiseParams::SIZE_RANGE.start(), *NoiseParams::SIZE_RANGE.end()),
        params.height.clamp(*NoiseParams::SIZE_RANGE.start(), *NoiseParams::SIZE_RANGE.end()),
    );
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let sample = |x: u32, y: u32| (noise_value(x, y, params) * 255.0).round() as u8;
    if params.color {
        Frame::Rgb(RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([
                sample(x, y),
                sample(x + w, y),
                sample(x, y + h),
            ])
        }))
    } else {
        Frame::Gray(GrayImage::from_fn(w, h, |x, y| image::Luma([sample(x, y)])))
    }
}

/// Seventh pipeline stage: synthetic noise field, or passthrough.
#[derive(Debug)]
pub struct NoiseGenerator {
    input: Option<Frame>,
    output: Option<Frame>,
    params: NoiseParams,
    dirty: bool,
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseGenerator {
    /// Create the stage, disabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            params: NoiseParams::default(),
            dirty: true,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> NoiseParams {
        self.params
    }

    /// Replace the parameters, marking dirty only on actual change.
    pub fn set_params(&mut self, params: NoiseParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }
}

impl Stage for NoiseGenerator {
    fn name(&self) -> &'static str {
        "noise generator"
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
        if self.params.enabled {
            self.output = Some(generate_noise(self.params));
        } else if let Some(input) = &self.input {
            self.output = Some(input.clone());
        } else {
            tracing::debug!(stage = self.name(), "no input frame, skipping");
        }
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = NoiseParams::default();
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
