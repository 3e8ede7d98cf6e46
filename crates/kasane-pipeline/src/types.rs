//! Shared types for the kasane stage pipeline.

use std::path::PathBuf;

/// Re-export `GrayImage` so downstream crates can reference
/// single-channel frames without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference
/// three-channel frames without depending on `image` directly.
pub use image::RgbImage;

/// A decoded raster image flowing between pipeline stages.
///
/// Frames are 8-bit with either one or three channels. A stage never
/// mutates a frame in place: reprocessing replaces the output frame
/// wholesale, so `PartialEq` (exact buffer comparison) is sufficient
/// for the set-input short-circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Single-channel 8-bit frame.
    Gray(GrayImage),
    /// Three-channel 8-bit frame.
    Rgb(RgbImage),
}

impl Frame {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Gray(img) => img.width(),
            Self::Rgb(img) => img.width(),
        }
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        match self {
            Self::Gray(img) => img.height(),
            Self::Rgb(img) => img.height(),
        }
    }

    /// Number of channels (1 for gray, 3 for RGB).
    #[must_use]
    pub const fn channels(&self) -> u8 {
        match self {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    /// Convert to a three-channel frame, replicating the gray channel
    /// if needed.
    #[must_use]
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Self::Gray(img) => image::DynamicImage::ImageLuma8(img.clone()).to_rgb8(),
            Self::Rgb(img) => img.clone(),
        }
    }

    /// Convert to a single-channel frame using the standard luminance
    /// weighting (`0.299*R + 0.587*G + 0.114*B`).
    #[must_use]
    pub fn to_gray(&self) -> GrayImage {
        match self {
            Self::Gray(img) => img.clone(),
            Self::Rgb(img) => image::DynamicImage::ImageRgb8(img.clone()).to_luma8(),
        }
    }

    /// Resize to the given dimensions with bilinear filtering,
    /// preserving the channel count.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        use image::imageops::{self, FilterType};
        match self {
            Self::Gray(img) => Self::Gray(imageops::resize(img, width, height, FilterType::Triangle)),
            Self::Rgb(img) => Self::Rgb(imageops::resize(img, width, height, FilterType::Triangle)),
        }
    }

    /// Convert the channel layout to match `other`, leaving the pixel
    /// grid untouched.
    #[must_use]
    pub fn matched_to(&self, other: &Self) -> Self {
        match other {
            Self::Gray(_) => Self::Gray(self.to_gray()),
            Self::Rgb(_) => Self::Rgb(self.to_rgb()),
        }
    }

    /// Borrow the raw interleaved channel bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        match self {
            Self::Gray(img) => img.as_raw(),
            Self::Rgb(img) => img.as_raw(),
        }
    }
}

/// Errors produced at the pipeline's file boundaries.
///
/// Empty inputs are deliberately *not* errors: a stage fed no frame
/// skips processing silently (logged at debug level at most).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read or decode an image file.
    #[error("failed to read image from {path}: {source}")]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },

    /// Failed to encode or write an image file.
    #[error("failed to write image to {path}: {source}")]
    Write {
        /// Path that was being written.
        path: PathBuf,
        /// Underlying encode error.
        source: image::ImageError,
    },

    /// A save was requested before the pipeline produced any output.
    #[error("no output frame available")]
    NoOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_rgb(width: u32, height: u32) -> RgbImage {
        #[allow(clippy::cast_possible_truncation)]
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 20 % 256) as u8, (y * 30 % 256) as u8, 128])
        })
    }

    #[test]
    fn channel_counts() {
        assert_eq!(Frame::Gray(GrayImage::new(2, 2)).channels(), 1);
        assert_eq!(Frame::Rgb(RgbImage::new(2, 2)).channels(), 3);
    }

    #[test]
    fn gray_to_rgb_replicates_channel() {
        let gray = GrayImage::from_pixel(3, 3, image::Luma([77]));
        let rgb = Frame::Gray(gray).to_rgb();
        for pixel in rgb.pixels() {
            assert_eq!(pixel.0, [77, 77, 77]);
        }
    }

    #[test]
    fn rgb_to_gray_weighs_green_highest() {
        let red = Frame::Rgb(RgbImage::from_pixel(1, 1, image::Rgb([255, 0, 0]))).to_gray();
        let green = Frame::Rgb(RgbImage::from_pixel(1, 1, image::Rgb([0, 255, 0]))).to_gray();
        let blue = Frame::Rgb(RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 255]))).to_gray();
        let (r, g, b) = (
            red.get_pixel(0, 0).0[0],
            green.get_pixel(0, 0).0[0],
            blue.get_pixel(0, 0).0[0],
        );
        assert!(g > r && r > b, "expected G > R > B luminance, got R={r} G={g} B={b}");
    }

    #[test]
    fn resized_changes_dimensions_only() {
        let frame = Frame::Rgb(gradient_rgb(8, 6));
        let resized = frame.resized(4, 3);
        assert_eq!(resized.width(), 4);
        assert_eq!(resized.height(), 3);
        assert_eq!(resized.channels(), 3);
    }

    #[test]
    fn matched_to_converts_channel_layout() {
        let gray = Frame::Gray(GrayImage::from_pixel(2, 2, image::Luma([10])));
        let rgb = Frame::Rgb(gradient_rgb(2, 2));
        assert_eq!(gray.matched_to(&rgb).channels(), 3);
        assert_eq!(rgb.matched_to(&gray).channels(), 1);
    }

    #[test]
    fn frame_equality_is_exact() {
        let a = Frame::Gray(GrayImage::from_pixel(2, 2, image::Luma([10])));
        let b = Frame::Gray(GrayImage::from_pixel(2, 2, image::Luma([10])));
        let mut c = GrayImage::from_pixel(2, 2, image::Luma([10]));
        c.put_pixel(1, 1, image::Luma([11]));
        assert_eq!(a, b);
        assert_ne!(a, Frame::Gray(c));
    }

    #[test]
    fn error_display_mentions_path() {
        let err = PipelineError::NoOutput;
        assert_eq!(err.to_string(), "no output frame available");
    }
}
