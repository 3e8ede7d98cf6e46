//! The stage contract shared by every pipeline unit.
//!
//! Each stage is a two-state machine: **Dirty** (output is stale
//! relative to the stored input and parameters) or **Clean** (output
//! reflects both exactly). Stages are constructed Dirty, move to Clean
//! on a successful [`Stage::process`], and back to Dirty whenever the
//! input or a parameter actually changes.
//!
//! Processing with a missing required input is a silent skip, not an
//! error: the stage logs, clears its dirty flag, and the driver moves
//! on.

use crate::types::Frame;

/// One pipeline unit performing one image transform.
pub trait Stage {
    /// Human-readable stage name, used in log lines.
    fn name(&self) -> &'static str;

    /// Store a copy of `frame` as the stage input.
    ///
    /// Marks the stage dirty only when the new frame differs from the
    /// stored one, so an unchanged upstream output does not force
    /// redundant reprocessing downstream.
    fn set_input(&mut self, frame: &Frame);

    /// Recompute the output from the stored input and current
    /// parameters, then clear the dirty flag. No-op when clean.
    fn process(&mut self);

    /// Restore default parameters and mark the stage dirty. The stored
    /// input is kept.
    fn reset(&mut self);

    /// The most recently produced output frame, if any.
    fn output(&self) -> Option<&Frame>;

    /// Whether the output is stale relative to input and parameters.
    fn is_dirty(&self) -> bool;

    /// Force reprocessing on the next [`Stage::process`] call.
    fn mark_dirty(&mut self);
}

/// Replace `slot` with a clone of `frame`, returning whether the
/// stored input actually changed.
///
/// This is the uniform set-input short-circuit: frames are integer
/// buffers, so equality comparison is exact and cheap relative to
/// reprocessing the whole downstream pipeline every redraw.
pub(crate) fn replace_input(slot: &mut Option<Frame>, frame: &Frame) -> bool {
    if slot.as_ref() == Some(frame) {
        return false;
    }
    *slot = Some(frame.clone());
    true
}
