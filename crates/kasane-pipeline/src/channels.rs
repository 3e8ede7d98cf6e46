//! Color channel splitting and selective recombination.
//!
//! Splits an RGB frame into its three planes and merges back only the
//! selected ones, zero-filling the rest. Frames with fewer than three
//! channels cannot be split and pass through unchanged.

use serde::{Deserialize, Serialize};

use crate::stage::{Stage, replace_input};
use crate::types::{Frame, RgbImage};

/// Parameters for [`ChannelSplitter`]: per-plane visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSplitterParams {
    /// Keep the red plane in the recombined output.
    pub show_red: bool,
    /// Keep the green plane in the recombined output.
    pub show_green: bool,
    /// Keep the blue plane in the recombined output.
    pub show_blue: bool,
}

impl Default for ChannelSplitterParams {
    fn default() -> Self {
        Self {
            show_red: true,
            show_green: true,
            show_blue: true,
        }
    }
}

/// Recombine the selected planes of an RGB image, zero-filling the
/// deselected ones.
#[must_use = "returns the recombined image"]
pub fn select_channels(image: &RgbImage, params: ChannelSplitterParams) -> RgbImage {
    let mask = [params.show_red, params.show_green, params.show_blue];
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for (value, keep) in pixel.0.iter_mut().zip(mask) {
            if !keep {
                *value = 0;
            }
        }
    }
    out
}

/// Third pipeline stage: channel plane selection.
#[derive(Debug)]
pub struct ChannelSplitter {
    input: Option<Frame>,
    output: Option<Frame>,
    params: ChannelSplitterParams,
    dirty: bool,
}

impl Default for ChannelSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSplitter {
    /// Create the stage with all planes visible.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            params: ChannelSplitterParams::default(),
            dirty: true,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> ChannelSplitterParams {
        self.params
    }

    /// Replace the parameters, marking dirty only on actual change.
    pub fn set_params(&mut self, params: ChannelSplitterParams) {
        if params != self.params {
            self.params = params;
            self.dirty = true;
        }
    }
}

impl Stage for ChannelSplitter {
    fn name(&self) -> &'static str {
        "channel splitter"
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
        match &self.input {
            None => {
                tracing::debug!(stage = self.name(), "no input frame, skipping");
            }
            // Single-channel frames have no planes to split.
            Some(frame @ Frame::Gray(_)) => {
                self.output = Some(frame.clone());
            }
            Some(Frame::Rgb(img)) => {
                self.output = Some(Frame::Rgb(select_channels(img, self.params)));
            }
        }
        self.dirty = false;
    }

    fn reset(&mut self) {
        self.params = ChannelSplitterParams::default();
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
    use crate::types::GrayImage;

    fn sample() -> RgbImage {
        RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]))
    }

    #[test]
    fn all_planes_selected_is_identity() {
        let img = sample();
        assert_eq!(select_channels(&img, ChannelSplitterParams::default()), img);
    }

    #[test]
    fn deselected_planes_are_zero_filled() {
        let params = ChannelSplitterParams {
            show_red: true,
            show_green: false,
            show_blue: false,
        };
        let out = select_channels(&sample(), params);
        assert_eq!(out.get_pixel(0, 0).0, [10, 0, 0]);
    }

    #[test]
    fn no_planes_selected_yields_black() {
        let params = ChannelSplitterParams {
            show_red: false,
            show_green: false,
            show_blue: false,
        };
        let out = select_channels(&sample(), params);
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn gray_input_passes_through_unsplit() {
        let mut stage = ChannelSplitter::new();
        stage.set_params(ChannelSplitterParams {
            show_red: false,
            show_green: false,
            show_blue: false,
        });
        let frame = Frame::Gray(GrayImage::from_pixel(2, 2, image::Luma([99])));
        stage.set_input(&frame);
        stage.process();
        assert_eq!(stage.output(), Some(&frame));
    }

    #[test]
    fn process_twice_is_idempotent_once_clean() {
        let mut stage = ChannelSplitter::new();
        stage.set_input(&Frame::Rgb(sample()));
        stage.process();
        let first = stage.output().cloned().unwrap();
        stage.process();
        assert_eq!(stage.output(), Some(&first));
    }
}
