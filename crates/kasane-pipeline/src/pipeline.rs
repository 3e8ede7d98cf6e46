//! Fixed-topology pipeline: ten stages wired source to sink, with the
//! blend stage additionally fed the untouched source frame as its
//! overlay input.
//!
//! `run` pushes each stage's output into the next stage's input and
//! processes in topological order. Because `set_input` short-circuits
//! on identical frames and `process` on a clean dirty flag, a run over
//! an unchanged pipeline is a cheap no-op; editing one stage's
//! parameters recomputes that stage and everything downstream, nothing
//! upstream.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blend::{Blend, BlendParams};
use crate::blur::{Blur, BlurParams};
use crate::brightness::{BrightnessContrast, BrightnessContrastParams};
use crate::channels::{ChannelSplitter, ChannelSplitterParams};
use crate::convolve::{ConvolutionFilter, ConvolutionParams};
use crate::edge::{EdgeDetector, EdgeParams};
use crate::noise::{NoiseGenerator, NoiseParams};
use crate::sink::ImageSink;
use crate::source::ImageSource;
use crate::stage::Stage;
use crate::threshold::{Threshold, ThresholdParams};
use crate::types::{Frame, PipelineError};

/// Identifies one stage of the fixed pipeline, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    /// Image file input.
    Source,
    /// Linear brightness and contrast adjustment.
    BrightnessContrast,
    /// Channel plane selection.
    ChannelSplitter,
    /// Separable Gaussian blur.
    Blur,
    /// Compositing with the source frame.
    Blend,
    /// Binarization and histogram.
    Threshold,
    /// Procedural noise field.
    NoiseGenerator,
    /// Edge map extraction.
    EdgeDetector,
    /// Preset or custom convolution.
    ConvolutionFilter,
    /// Output frame and file export.
    Sink,
}

impl StageId {
    /// All stages in processing order.
    pub const ALL: [Self; 10] = [
        Self::Source,
        Self::BrightnessContrast,
        Self::ChannelSplitter,
        Self::Blur,
        Self::Blend,
        Self::Threshold,
        Self::NoiseGenerator,
        Self::EdgeDetector,
        Self::ConvolutionFilter,
        Self::Sink,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::BrightnessContrast => "Brightness / Contrast",
            Self::ChannelSplitter => "Channel Splitter",
            Self::Blur => "Blur",
            Self::Blend => "Blend",
            Self::Threshold => "Threshold",
            Self::NoiseGenerator => "Noise Generator",
            Self::EdgeDetector => "Edge Detection",
            Self::ConvolutionFilter => "Convolution",
            Self::Sink => "Output",
        }
    }
}

/// Every tunable parameter of the pipeline in one serializable bundle.
///
/// Missing fields deserialize to their defaults, so a parameter file
/// may name only the stages it wants to change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Brightness / contrast stage.
    pub brightness: BrightnessContrastParams,
    /// Channel splitter stage.
    pub channels: ChannelSplitterParams,
    /// Blur stage.
    pub blur: BlurParams,
    /// Blend stage.
    pub blend: BlendParams,
    /// Threshold stage.
    pub threshold: ThresholdParams,
    /// Noise generator stage.
    pub noise: NoiseParams,
    /// Edge detection stage.
    pub edge: EdgeParams,
    /// Convolution stage.
    pub convolution: ConvolutionParams,
}

/// The fixed ten-stage pipeline.
#[derive(Debug, Default)]
pub struct Pipeline {
    /// Image file input.
    pub source: ImageSource,
    /// Linear brightness and contrast adjustment.
    pub brightness: BrightnessContrast,
    /// Channel plane selection.
    pub channels: ChannelSplitter,
    /// Separable Gaussian blur.
    pub blur: Blur,
    /// Compositing of the working frame with the source frame.
    pub blend: Blend,
    /// Binarization and histogram.
    pub threshold: Threshold,
    /// Procedural noise field.
    pub noise: NoiseGenerator,
    /// Edge map extraction.
    pub edge: EdgeDetector,
    /// Preset or custom convolution.
    pub convolution: ConvolutionFilter,
    /// Output frame and file export.
    pub sink: ImageSink,
}

impl Pipeline {
    /// Create a pipeline with every stage at its defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an image file into the source stage.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Read`] when the file cannot be opened or
    /// decoded; the previously loaded frame (if any) is kept.
    pub fn load_image(&mut self, path: &Path) -> Result<(), PipelineError> {
        self.source.load(path)
    }

    /// Encode the sink's frame to `path`.
    ///
    /// # Errors
    ///
    /// See [`ImageSink::save`].
    pub fn save_output(&self, path: &Path) -> Result<(), PipelineError> {
        self.sink.save(path)
    }

    /// Process every dirty stage in topological order, pushing outputs
    /// downstream as they are produced.
    pub fn run(&mut self) {
        self.source.process();
        if let Some(frame) = self.source.output() {
            self.brightness.set_input(frame);
            // The blend stage composites against the untouched source.
            self.blend.set_overlay(frame);
        }
        self.brightness.process();
        if let Some(frame) = self.brightness.output() {
            self.channels.set_input(frame);
        }
        self.channels.process();
        if let Some(frame) = self.channels.output() {
            self.blur.set_input(frame);
        }
        self.blur.process();
        if let Some(frame) = self.blur.output() {
            self.blend.set_input(frame);
        }
        self.blend.process();
        if let Some(frame) = self.blend.output() {
            self.threshold.set_input(frame);
        }
        self.threshold.process();
        if let Some(frame) = self.threshold.output() {
            self.noise.set_input(frame);
        }
        self.noise.process();
        if let Some(frame) = self.noise.output() {
            self.edge.set_input(frame);
        }
        self.edge.process();
        if let Some(frame) = self.edge.output() {
            self.convolution.set_input(frame);
        }
        self.convolution.process();
        if let Some(frame) = self.convolution.output() {
            self.sink.set_input(frame);
        }
        self.sink.process();
    }

    /// Whether any stage still has work pending.
    #[must_use]
    pub fn any_dirty(&self) -> bool {
        self.stages().iter().any(|stage| stage.is_dirty())
    }

    /// Reset every stage to its default parameters and drop all
    /// computed frames. The loaded source image is kept.
    pub fn reset_all(&mut self) {
        self.source.reset();
        self.brightness.reset();
        self.channels.reset();
        self.blur.reset();
        self.blend.reset();
        self.threshold.reset();
        self.noise.reset();
        self.edge.reset();
        self.convolution.reset();
        self.sink.reset();
    }

    /// The output frame of one stage, if it has produced one.
    #[must_use]
    pub fn output_of(&self, id: StageId) -> Option<&Frame> {
        self.stage(id).output()
    }

    /// Snapshot every stage's parameters.
    #[must_use]
    pub fn params(&self) -> PipelineParams {
        PipelineParams {
            brightness: self.brightness.params(),
            channels: self.channels.params(),
            blur: self.blur.params(),
            blend: self.blend.params(),
            threshold: self.threshold.params(),
            noise: self.noise.params(),
            edge: self.edge.params(),
            convolution: *self.convolution.params(),
        }
    }

    /// Apply a parameter bundle; only stages whose parameters actually
    /// change are marked dirty.
    pub fn set_params(&mut self, params: PipelineParams) {
        self.brightness.set_params(params.brightness);
        self.channels.set_params(params.channels);
        self.blur.set_params(params.blur);
        self.blend.set_params(params.blend);
        self.threshold.set_params(params.threshold);
        self.noise.set_params(params.noise);
        self.edge.set_params(params.edge);
        self.convolution.set_params(params.convolution);
    }

    fn stage(&self, id: StageId) -> &dyn Stage {
        match id {
            StageId::Source => &self.source,
            StageId::BrightnessContrast => &self.brightness,
            StageId::ChannelSplitter => &self.channels,
            StageId::Blur => &self.blur,
            StageId::Blend => &self.blend,
            StageId::Threshold => &self.threshold,
            StageId::NoiseGenerator => &self.noise,
            StageId::EdgeDetector => &self.edge,
            StageId::ConvolutionFilter => &self.convolution,
            StageId::Sink => &self.sink,
        }
    }

    fn stages(&self) -> [&dyn Stage; 10] {
        [
            &self.source,
            &self.brightness,
            &self.channels,
            &self.blur,
            &self.blend,
            &self.threshold,
            &self.noise,
            &self.edge,
            &self.convolution,
            &self.sink,
        ]
    }
}
