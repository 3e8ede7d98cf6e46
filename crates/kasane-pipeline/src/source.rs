//! Image source: decodes a file into the pipeline's initial frame.
//!
//! Decoding happens once per [`ImageSource::load`] call; the stage
//! itself is a passthrough that republishes the decoded frame each
//! cycle. A failed load leaves the previous frame (if any) in place.

use std::path::{Path, PathBuf};

use crate::stage::{Stage, replace_input};
use crate::types::{Frame, PipelineError};

/// First pipeline stage: holds the decoded source frame.
#[derive(Debug)]
pub struct ImageSource {
    input: Option<Frame>,
    output: Option<Frame>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl Default for ImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource {
    /// Create an empty source with no frame loaded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: None,
            output: None,
            path: None,
            dirty: true,
        }
    }

    /// Decode the image at `path` (PNG, JPEG, BMP, WebP) and make it
    /// the source frame, converted to RGB.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Read`] if the file cannot be opened or
    /// decoded; the previously loaded frame is kept in that case.
    pub fn load(&mut self, path: &Path) -> Result<(), PipelineError> {
        let decoded = image::open(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let frame = Frame::Rgb(decoded.to_rgb8());
        tracing::info!(
            path = %path.display(),
            width = frame.width(),
            height = frame.height(),
            "loaded source image",
        );
        self.input = Some(frame);
        self.path = Some(path.to_path_buf());
        self.dirty = true;
        Ok(())
    }

    /// Path of the currently loaded image, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Stage for ImageSource {
    fn name(&self) -> &'static str {
        "image source"
    }

    fn set_input(&mut self, frame: &Frame) {
        if replace_input(&mut self.input, frame) {
            self.path = None;
            self.dirty = true;
        }
    }

    fn process(&mut self) {
        if !self.dirty {
            return;
        }
        self.output = self.input.clone();
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
    use crate::types::RgbImage;

    #[test]
    fn load_missing_file_is_an_error() {
        let mut source = ImageSource::new();
        let result = source.load(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(PipelineError::Read { .. })));
        assert!(source.output().is_none());
    }

    #[test]
    fn set_input_then_process_republishes_frame() {
        let mut source = ImageSource::new();
        let frame = Frame::Rgb(RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3])));
        source.set_input(&frame);
        source.process();
        assert_eq!(source.output(), Some(&frame));
        assert!(!source.is_dirty());
    }

    #[test]
    fn identical_input_leaves_stage_clean() {
        let mut source = ImageSource::new();
        let frame = Frame::Rgb(RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3])));
        source.set_input(&frame);
        source.process();
        source.set_input(&frame);
        assert!(!source.is_dirty());
    }
}
