//! Terminal stage: holds the finished frame and encodes it to disk on
//! request.

use std::path::Path;

use crate::stage::{Stage, replace_input};
use crate::types::{Frame, PipelineError};

/// Final pipeline stage: passthrough plus on-demand file export.
///
/// The encoder is chosen from the path extension by the `image` crate
/// (PNG, JPEG, BMP, WebP are enabled).
#[derive(Debug)]
pub struct ImageSink {
    input: Option<Frame>,
    output: Option<Frame>,
    dirty: bool,
}

impl Default for ImageSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSink {
    /// Create an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: None,
            output: None,
            dirty: true,
        }
    }

    /// Encode the held frame to `path`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoOutput`] when nothing has been processed yet,
    /// [`PipelineError::Write`] when encoding or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let frame = self.output.as_ref().ok_or(PipelineError::NoOutput)?;
        let result = match frame {
            Frame::Gray(img) => img.save(path),
            Frame::Rgb(img) => img.save(path),
        };
        result.map_err(|source| PipelineError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "saved output frame");
        Ok(())
    }
}

impl Stage for ImageSink {
    fn name(&self) -> &'static str {
        "image sink"
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
            Some(frame) => self.output = Some(frame.clone()),
            None => {
                tracing::debug!(stage = self.name(), "no input frame, skipping");
            }
        }
        self.dirty = false;
    }

    fn reset(&mut self) {
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

    #[test]
    fn save_without_output_is_an_error() {
        let sink = ImageSink::new();
        let err = sink.save(Path::new("/tmp/never-written.png")).unwrap_err();
        assert!(matches!(err, PipelineError::NoOutput));
    }

    #[test]
    fn unknown_extension_is_a_write_error() {
        let mut sink = ImageSink::new();
        sink.set_input(&Frame::Gray(GrayImage::from_pixel(2, 2, image::Luma([1]))));
        sink.process();
        let dir = std::env::temp_dir();
        let err = sink.save(&dir.join("frame.not-an-image")).unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
    }

    #[test]
    fn save_round_trips_through_png() {
        let mut sink = ImageSink::new();
        let frame = Frame::Gray(GrayImage::from_fn(4, 4, |x, y| {
            image::Luma([(x * 16 + y) as u8])
        }));
        sink.set_input(&frame);
        sink.process();
        let path = std::env::temp_dir().join("kasane-sink-test.png");
        sink.save(&path).unwrap();
        let reloaded = image::open(&path).unwrap().to_luma8();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(Frame::Gray(reloaded), frame);
    }

    #[test]
    fn passthrough_preserves_input() {
        let mut sink = ImageSink::new();
        let frame = Frame::Gray(GrayImage::from_pixel(3, 3, image::Luma([200])));
        sink.set_input(&frame);
        sink.process();
        assert_eq!(sink.output(), Some(&frame));
    }
}
