//! kasane-pipeline: Dirty-flag image processing pipeline.
//!
//! A fixed chain of stages transforms a decoded raster frame:
//! source -> brightness/contrast -> channel split -> blur ->
//! blend (with the source frame) -> threshold -> noise ->
//! edge detection -> convolution -> sink.
//!
//! Every stage follows the same contract ([`stage::Stage`]): it caches
//! its input and output frames and a dirty flag, recomputes only when
//! the input or a parameter actually changed, and republishes a stable
//! output otherwise. [`pipeline::Pipeline::run`] drives the chain in
//! topological order, so an idle pipeline costs a handful of equality
//! checks per frame.
//!
//! File decoding and encoding live at the edges ([`source`] and
//! [`sink`]); everything between operates on in-memory frames only.

pub mod blend;
pub mod blur;
pub mod brightness;
pub mod channels;
pub mod convolve;
pub mod edge;
pub mod noise;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod stage;
pub mod threshold;
pub mod types;

pub use pipeline::{Pipeline, PipelineParams, StageId};
pub use stage::Stage;
pub use types::{Frame, PipelineError};
