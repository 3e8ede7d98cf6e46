//! Separable Gaussian smoothing, isotropic or single-axis.
//!
//! The kernel is derived from an integer radius: size `2*radius + 1`,
//! sigma from the OpenCV convention `0.3*((size-1)/2 - 1) + 0.8`.
//! Directional blur applies the Gaussian along one axis only, with an
//! identity kernel on the other.

use image::Luma;
use serde::{Deserialize, Serialize};

use crate::stage::{Stage, replace_input};
use crate::types::{Frame, GrayImage, RgbImage};

/// Parameters for [`Blur`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlurParams {
    /// When disabled the stage passes its input through unchanged.
    pub enabled: bool,
    /// Kernel radius; kernel size is `2*radius + 1`.
    pub radius: u32,
    /// Blur both axes. When false, `horizontal` picks the axis.
    pub uniform: bool,
    /// Blur along x (true) or y (false); only used when not uniform.
    pub horizontal: bool,
}

impl BlurParams {
    /// Smallest usable radius (radius 0 would be a no-op kernel).
    pub const MIN_RADIUS: u32 = 1;
    /// Largest supported radius.
    pub const MAX_RADIUS: u32 = 20;
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 5,
            uniform: true,
            horizontal: true,
        }
    }
}

/// Build the normalized 1-D Gaussian kernel for `radius`.
///
/// The radius is clamped to `[MIN_RADIUS, MAX_RADIUS]`, so the kernel
/// length `2*radius + 1` is always odd and at least 3.
#[must_use = "returns the normalized kernel weights"]
pub fn gaussian_kernel(radius: u32) -> Vec<f32> {
    let radius = radius.clamp(BlurParams::MIN_RADIUS, BlurParams::MAX_RADIUS);
    let size = 2 * radius + 1;
    #[allow(clippy::cast_precision_loss)]
    let sigma = 0.3f32.mul_add((size - 1) as f32 / 2.0 - 1.0, 0.8);
    let two_sigma_sq = 2.0 * sigma * sigma;
    #[allow(clippy::cast_precision_loss)]
    let mut weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

fn filter_gray(image: &GrayImage, h_kernel: &[f32], v_kernel: &[f32]) -> GrayImage {
    imageproc::filter::separable_filter(image, h_kernel, v_kernel)
}

/// Apply the separable blur to a frame.
///
/// RGB frames are split into planes, filtered independently, and
/// reassembled; Gaussian smoothing is linear and per-channel, so this
/// matches filtering in color space.
#[must_use = "returns the blurred frame"]
pub fn blur_frame(frame: &Frame, params: BlurParams) -> Frame {
    let gaussian = gaussian_kernel(params.radius);
    // `separable_filter` requires both kernels to have the same length,
    // so the identity kernel is zero-padded to match the Gaussian.
    let mut identity = vec![0.0f32; gaussian.len()];
    identity[gaussian.len() / 2] = 1.0;
    let (h_kernel, v_kernel): (&[f32], &[f32]) = if params.uniform {
        (&gaussian, &gaussian)
    } else if params.horizontal {
        (&gaussian, &identity)
    } else {
        (&identity, &gaussian)
    };

    match frame {
        Frame::Gray(img) => Frame::Gray(filter_gray(img, h_kernel, v_kernel)),
        Frame::Rgb(img) => {
            let (w, h) = (img.width(), img.height());
            let planes: [GrayImage; 3] = std::array::from_fn(|c| {
                GrayImage::from_fn(w, h, |x, y| Luma([img.get_pixel(x, y).0[c]]))
            });
            let filtered: [GrayImage; 3] =
                std::array::from_fn(|c| filter_gray(&planes[c], h_kernel, v_kernel));
            Frame::Rgb(RgbImage::from_fn(w, h, |x, y| {
                image::Rgb([
                    filtered[0].get_pixel(x, y).0[0],
                    filtered[1].get_pixel(x, y).0[0],
                    filtered[2].get_pixel(x, y).0[0],
                ])
            }))
        }
    }
}

/// Fourth pipeline stage: Gaussian blur.
#[derive(Debug)]
pub struct Blur {
    input: Option<Frame>,
    output: Option<Frame>,
    params: BlurParams,
    dirty: bool,
}

impl Default for Blur {
    fn default() -> Self {
        Self::new()
    }
}

impl Blur {
    /// Create the stage, disabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            params: BlurParams::default(),
            dirty: true,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> BlurParams {
        self.params
    }

    /// Replace the parameters, marking dirty only on actual change.
    pub fn set_params(&mut self, params: BlurParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }

    /// The kernel currently in effect, for UI preview.
    #[must_use]
    pub fn kernel(&self) -> Vec<f32> {
        gaussian_kernel(self.params.radius)
    }
}

impl Stage for Blur {
    fn name(&self) -> &'static str {
        "blur"
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
            Some(blur_frame(input, self.params))
        } else {
            Some(input.clone())
        };
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = BlurParams::default();
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

    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 { Luma([0]) } else { Luma([255]) }
        })
    }

    #[test]
    fn kernel_is_odd_and_normalized_for_every_radius() {
        for radius in BlurParams::MIN_RADIUS..=BlurParams::MAX_RADIUS {
            let kernel = gaussian_kernel(radius);
            assert_eq!(kernel.len(), (2 * radius + 1) as usize);
            assert_eq!(kernel.len() % 2, 1, "kernel must be odd for radius {radius}");
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "kernel sum {sum} for radius {radius}");
        }
    }

    #[test]
    fn radius_zero_clamps_to_minimum() {
        assert_eq!(gaussian_kernel(0).len(), 3);
    }

    #[test]
    fn kernel_is_symmetric_and_peaked_at_center() {
        let kernel = gaussian_kernel(3);
        let center = kernel[3];
        for i in 0..3 {
            assert!((kernel[i] - kernel[6 - i]).abs() < 1e-6);
            assert!(kernel[i] < center);
        }
    }

    #[test]
    fn disabled_stage_passes_input_through() {
        let mut stage = Blur::new();
        let frame = Frame::Gray(sharp_edge_image());
        stage.set_input(&frame);
        stage.process();
        assert_eq!(stage.output(), Some(&frame));
    }

    #[test]
    fn uniform_blur_smooths_sharp_edge() {
        let params = BlurParams {
            enabled: true,
            radius: 2,
            uniform: true,
            horizontal: true,
        };
        let Frame::Gray(out) = blur_frame(&Frame::Gray(sharp_edge_image()), params) else {
            unreachable!()
        };
        let left = out.get_pixel(4, 5).0[0];
        let right = out.get_pixel(5, 5).0[0];
        assert!(left > 0, "expected blur to raise left-of-edge above 0, got {left}");
        assert!(right < 255, "expected blur to lower right-of-edge below 255, got {right}");
    }

    #[test]
    fn vertical_blur_leaves_vertical_edge_sharp() {
        // The test image varies only along x; blurring along y must not
        // change it.
        let img = sharp_edge_image();
        let params = BlurParams {
            enabled: true,
            radius: 3,
            uniform: false,
            horizontal: false,
        };
        let Frame::Gray(out) = blur_frame(&Frame::Gray(img.clone()), params) else {
            unreachable!()
        };
        for (a, b) in out.iter().zip(img.iter()) {
            let diff = i16::from(*a) - i16::from(*b);
            assert!(diff.abs() <= 1, "expected y-axis blur to leave columns intact");
        }
    }

    #[test]
    fn horizontal_blur_softens_vertical_edge() {
        let params = BlurParams {
            enabled: true,
            radius: 3,
            uniform: false,
            horizontal: true,
        };
        let Frame::Gray(out) = blur_frame(&Frame::Gray(sharp_edge_image()), params) else {
            unreachable!()
        };
        let boundary = out.get_pixel(4, 0).0[0];
        assert!(boundary > 0, "expected softened boundary, got {boundary}");
    }

    #[test]
    fn rgb_blur_preserves_dimensions() {
        let img = RgbImage::new(17, 9);
        let params = BlurParams {
            enabled: true,
            radius: 1,
            uniform: true,
            horizontal: true,
        };
        let out = blur_frame(&Frame::Rgb(img), params);
        assert_eq!((out.width(), out.height()), (17, 9));
    }

    #[test]
    fn process_twice_is_idempotent_once_clean() {
        let mut stage = Blur::new();
        stage.set_params(BlurParams {
            enabled: true,
            ..BlurParams::default()
        });
        stage.set_input(&Frame::Gray(sharp_edge_image()));
        stage.process();
        let first = stage.output().cloned().unwrap();
        stage.process();
        assert_eq!(stage.output(), Some(&first));
    }
}
