//! Edge detection: directional-gradient magnitude or Canny edge map,
//! optionally composited over the original frame.
//!
//! The gradient path applies two separable 1-D passes (derivative
//! along one axis, binomial smoothing along the other) with an `i32`
//! intermediate, then combines the axes as `|gx|/2 + |gy|/2` saturated
//! to 8 bits. The derivative/smoothing coefficient pairs for kernel
//! sizes 1/3/5/7 follow the OpenCV `getDerivKernels` tables. The Canny
//! path wraps [`imageproc::edges::canny`].

use serde::{Deserialize, Serialize};

use crate::stage::{Stage, replace_input};
use crate::types::{Frame, GrayImage, RgbImage};

/// Minimum allowed Canny threshold.
///
/// A threshold of zero treats every pixel with any gradient as a
/// potential edge, producing a degenerate edge map that drowns the
/// overlay output.
pub const MIN_CANNY_THRESHOLD: f32 = 1.0;

/// Edge detection algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeMethod {
    /// Directional-gradient magnitude (Sobel family).
    Sobel,
    /// Binary edge map with hysteresis thresholds.
    Canny,
}

impl EdgeMethod {
    /// All methods in UI order.
    pub const ALL: [Self; 2] = [Self::Sobel, Self::Canny];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sobel => "Sobel",
            Self::Canny => "Canny",
        }
    }
}

/// Parameters for [`EdgeDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeParams {
    /// Which detector to run.
    pub method: EdgeMethod,
    /// Sobel kernel size; snapped to {1, 3, 5, 7}.
    pub kernel_size: u32,
    /// Canny low hysteresis threshold.
    pub low_threshold: u8,
    /// Canny high hysteresis threshold.
    pub high_threshold: u8,
    /// Additively composite the edge map over the original frame.
    pub overlay: bool,
}

impl EdgeParams {
    /// Largest supported Sobel kernel size.
    pub const MAX_KERNEL_SIZE: u32 = 7;
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            method: EdgeMethod::Sobel,
            kernel_size: 3,
            low_threshold: 100,
            high_threshold: 200,
            overlay: true,
        }
    }
}

/// Derivative and smoothing 1-D kernels for a snapped Sobel size.
///
/// Size 1 means a bare central difference with no cross-axis
/// smoothing; sizes 3/5/7 pair the difference-of-binomials derivative
/// with the matching binomial smoother.
const fn deriv_kernels(size: u32) -> (&'static [i32], &'static [i32]) {
    match size {
        0 | 1 => (&[-1, 0, 1], &[1]),
        2 | 3 => (&[-1, 0, 1], &[1, 2, 1]),
        4 | 5 => (&[-1, -2, 0, 2, 1], &[1, 4, 6, 4, 1]),
        _ => (&[-1, -4, -5, 0, 5, 4, 1], &[1, 6, 15, 20, 15, 6, 1]),
    }
}

/// Two-pass separable correlation with replicated borders and an
/// `i32` accumulator, so signed derivative responses survive intact.
fn separable_correlate(image: &GrayImage, row: &[i32], col: &[i32]) -> Vec<i32> {
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn clamp_index(i: i64, len: u32) -> usize {
        i.clamp(0, i64::from(len) - 1) as usize
    }

    let (w, h) = (image.width(), image.height());
    let (wi, hi) = (w as usize, h as usize);
    let src = image.as_raw();

    let row_half = i64::try_from(row.len() / 2).unwrap_or(0);
    let mut horizontal = vec![0i32; wi * hi];
    for y in 0..hi {
        for x in 0..wi {
            let mut acc = 0i32;
            for (k, &weight) in row.iter().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let sx = clamp_index(x as i64 + k as i64 - row_half, w);
                acc += weight * i32::from(src[y * wi + sx]);
            }
            horizontal[y * wi + x] = acc;
        }
    }

    let col_half = i64::try_from(col.len() / 2).unwrap_or(0);
    let mut out = vec![0i32; wi * hi];
    for y in 0..hi {
        for x in 0..wi {
            let mut acc = 0i32;
            for (k, &weight) in col.iter().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let sy = clamp_index(y as i64 + k as i64 - col_half, h);
                acc += weight * horizontal[sy * wi + x];
            }
            out[y * wi + x] = acc;
        }
    }
    out
}

/// Gradient magnitude as `|gx|/2 + |gy|/2`, saturated to 8 bits.
#[must_use = "returns the gradient-magnitude map"]
pub fn gradient_magnitude(image: &GrayImage, kernel_size: u32) -> GrayImage {
    let size = kernel_size.min(EdgeParams::MAX_KERNEL_SIZE) | 1;
    let (deriv, smooth) = deriv_kernels(size);
    let gx = separable_correlate(image, deriv, smooth);
    let gy = separable_correlate(image, smooth, deriv);

    let mut out = GrayImage::new(image.width(), image.height());
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    for (dst, (&x, &y)) in out.iter_mut().zip(gx.iter().zip(&gy)) {
        *dst = ((x.abs() + y.abs()) / 2).min(255) as u8;
    }
    out
}

/// Binary edge map with hysteresis thresholds.
///
/// Both thresholds are clamped to at least [`MIN_CANNY_THRESHOLD`] and
/// the low threshold is clamped to be at most the high one.
#[must_use = "returns the binary edge map"]
pub fn canny_edges(image: &GrayImage, low_threshold: u8, high_threshold: u8) -> GrayImage {
    let high = f32::from(high_threshold).max(MIN_CANNY_THRESHOLD);
    let low = f32::from(low_threshold).max(MIN_CANNY_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}

/// Additively composite a gray edge map over an RGB frame.
#[must_use = "returns the composited image"]
pub fn overlay_edges(base: &RgbImage, edges: &GrayImage) -> RgbImage {
    let mut out = base.clone();
    for (pixel, edge) in out.pixels_mut().zip(edges.iter()) {
        for value in &mut pixel.0 {
            *value = value.saturating_add(*edge);
        }
    }
    out
}

/// Eighth pipeline stage: edge map extraction.
#[derive(Debug)]
pub struct EdgeDetector {
    input: Option<Frame>,
    output: Option<Frame>,
    params: EdgeParams,
    dirty: bool,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeDetector {
    /// Create the stage with the Sobel detector and overlay enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            params: EdgeParams::default(),
            dirty: true,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> EdgeParams {
        self.params
    }

    /// Replace the parameters, marking dirty only on actual change.
    pub fn set_params(&mut self, params: EdgeParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }
}

impl Stage for EdgeDetector {
    fn name(&self) -> &'static str {
        "edge detector"
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
            tracing::debug!(stage = self.name(), "no input frame, clearing output");
            self.output = None;
            self.dirty = false;
            return;
        };
        let gray = input.to_gray();
        let edges = match self.params.method {
            EdgeMethod::Sobel => gradient_magnitude(&gray, self.params.kernel_size),
            EdgeMethod::Canny => {
                canny_edges(&gray, self.params.low_threshold, self.params.high_threshold)
            }
        };
        let rgb = match (&self.params.overlay, input) {
            (true, Frame::Rgb(base)) => overlay_edges(base, &edges),
            _ => Frame::Gray(edges).to_rgb(),
        };
        self.output = Some(Frame::Rgb(rgb));
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = EdgeParams::default();
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
        GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 { image::Luma([0]) } else { image::Luma([255]) }
        })
    }

    #[test]
    fn uniform_image_has_zero_gradient() {
        let img = GrayImage::from_pixel(10, 10, image::Luma([128]));
        for size in [1, 3, 5, 7] {
            let grad = gradient_magnitude(&img, size);
            assert!(grad.iter().all(|&v| v == 0), "size {size} produced nonzero gradient");
        }
    }

    #[test]
    fn gradient_responds_at_step_boundary() {
        let grad = gradient_magnitude(&sharp_edge_image(), 3);
        assert!(grad.get_pixel(9, 10).0[0] > 0);
        assert!(grad.get_pixel(10, 10).0[0] > 0);
        // Far from the boundary there is nothing to respond to.
        assert_eq!(grad.get_pixel(2, 10).0[0], 0);
        assert_eq!(grad.get_pixel(17, 10).0[0], 0);
    }

    #[test]
    fn even_kernel_sizes_snap_to_next_odd() {
        let img = sharp_edge_image();
        assert_eq!(gradient_magnitude(&img, 2), gradient_magnitude(&img, 3));
        assert_eq!(gradient_magnitude(&img, 6), gradient_magnitude(&img, 7));
    }

    #[test]
    fn oversized_kernel_clamps_to_seven() {
        let img = sharp_edge_image();
        assert_eq!(gradient_magnitude(&img, 11), gradient_magnitude(&img, 7));
    }

    #[test]
    fn canny_finds_sharp_boundary() {
        let edges = canny_edges(&sharp_edge_image(), 50, 150);
        let count: u32 = edges.pixels().map(|p| u32::from(p.0[0] > 0)).sum();
        assert!(count > 0, "expected edges at sharp boundary");
    }

    #[test]
    fn canny_low_above_high_is_clamped() {
        let img = sharp_edge_image();
        assert_eq!(canny_edges(&img, 200, 100), canny_edges(&img, 100, 100));
    }

    #[test]
    fn overlay_saturates_instead_of_wrapping() {
        let base = RgbImage::from_pixel(2, 2, image::Rgb([200, 200, 200]));
        let edges = GrayImage::from_pixel(2, 2, image::Luma([255]));
        let out = overlay_edges(&base, &edges);
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn missing_input_clears_output() {
        let mut stage = EdgeDetector::new();
        stage.set_input(&Frame::Gray(sharp_edge_image()));
        stage.process();
        assert!(stage.output().is_some());

        // Simulate the upstream going away: a fresh stage with no
        // input clears its output on process.
        let mut empty = EdgeDetector::new();
        empty.process();
        assert!(empty.output().is_none());
        assert!(!empty.is_dirty());
    }

    #[test]
    fn output_is_always_rgb() {
        let mut stage = EdgeDetector::new();
        stage.set_input(&Frame::Gray(sharp_edge_image()));
        stage.process();
        assert_eq!(stage.output().unwrap().channels(), 3);
    }

    #[test]
    fn process_twice_is_idempotent_once_clean() {
        let mut stage = EdgeDetector::new();
        stage.set_input(&Frame::Rgb(Frame::Gray(sharp_edge_image()).to_rgb()));
        stage.process();
        let first = stage.output().cloned().unwrap();
        stage.process();
        assert_eq!(stage.output(), Some(&first));
    }
}
