//! Compute sequencing primitives for the legacy-style backend.
//!
//! A backend without native compute emulates it with a vertex shader
//! capturing into a buffer (transform feedback) while rasterization is
//! discarded. That scheme assumes strictly alternating
//! begin → dispatch → finish calls, and swaps double-buffered capture
//! targets exactly once per dispatch. [`ComputeSequencer`] turns that
//! assumption into an explicit state machine that errors on violation,
//! and [`DualBuffer`] is the swap pair itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{Result, WeftError};
use crate::resources::BufferRef;

/// Phase of a compute batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputePhase {
    Idle,
    Recording,
}

/// Enforces the begin/dispatch/finish contract of a compute batch.
///
/// Owned by the renderer; a second batch must not begin until the
/// previous one's `finish()` has run, because finishing is what swaps
/// the dual capture buffers and re-enables rasterization.
#[derive(Debug)]
pub struct ComputeSequencer {
    phase: ComputePhase,
}

impl Default for ComputeSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: ComputePhase::Idle,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ComputePhase {
        self.phase
    }

    pub fn begin(&mut self) -> Result<()> {
        match self.phase {
            ComputePhase::Idle => {
                self.phase = ComputePhase::Recording;
                Ok(())
            }
            ComputePhase::Recording => Err(WeftError::ComputePhase(
                "begin() while a previous compute batch is still recording".into(),
            )),
        }
    }

    /// Precondition check for a dispatch.
    pub fn ensure_recording(&self) -> Result<()> {
        match self.phase {
            ComputePhase::Recording => Ok(()),
            ComputePhase::Idle => Err(WeftError::ComputePhase(
                "dispatch outside a begin()/finish() pair".into(),
            )),
        }
    }

    pub fn finish(&mut self) -> Result<()> {
        match self.phase {
            ComputePhase::Recording => {
                self.phase = ComputePhase::Idle;
                Ok(())
            }
            ComputePhase::Idle => Err(WeftError::ComputePhase(
                "finish() without a matching begin()".into(),
            )),
        }
    }
}

/// Double-buffered capture target for transform-feedback compute.
///
/// The front buffer feeds the vertex stage; the back buffer captures the
/// output. `swap()` runs once at the end of each dispatch.
#[derive(Debug)]
pub struct DualBuffer {
    buffers: [BufferRef; 2],
    current: usize,
}

impl DualBuffer {
    #[must_use]
    pub fn new(front: BufferRef, back: BufferRef) -> Self {
        Self {
            buffers: [front, back],
            current: 0,
        }
    }

    /// Allocates a zero-filled pair of `len`-byte buffers.
    #[must_use]
    pub fn zeroed(len: usize, usage: wgpu::BufferUsages, label: &str) -> Self {
        Self::new(
            BufferRef::zeroed(len, usage, Some(label)),
            BufferRef::zeroed(len, usage, Some(label)),
        )
    }

    #[must_use]
    pub fn front(&self) -> &BufferRef {
        &self.buffers[self.current]
    }

    #[must_use]
    pub fn back(&self) -> &BufferRef {
        &self.buffers[1 - self.current]
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}

/// Shared cancellation token for poll-driven async work (pipeline
/// compile polling, buffer readback).
///
/// Checked at every continuation point; once disposed, in-flight
/// operations resolve with their last known value instead of erroring,
/// so mid-frame teardown never crashes the loop.
#[derive(Debug, Clone, Default)]
pub struct DisposeFlag(Arc<AtomicBool>);

impl DisposeFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispose(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencer_accepts_strictly_alternating_batches() {
        let mut sequencer = ComputeSequencer::new();
        for _ in 0..3 {
            sequencer.begin().unwrap();
            sequencer.ensure_recording().unwrap();
            sequencer.finish().unwrap();
        }
    }

    #[test]
    fn sequencer_rejects_overlapping_begin() {
        let mut sequencer = ComputeSequencer::new();
        sequencer.begin().unwrap();
        assert!(sequencer.begin().is_err());
    }

    #[test]
    fn sequencer_rejects_dispatch_outside_batch() {
        let sequencer = ComputeSequencer::new();
        assert!(sequencer.ensure_recording().is_err());
    }

    #[test]
    fn sequencer_rejects_unmatched_finish() {
        let mut sequencer = ComputeSequencer::new();
        assert!(sequencer.finish().is_err());
    }

    #[test]
    fn dual_buffer_swaps_roles() {
        let mut dual = DualBuffer::zeroed(64, wgpu::BufferUsages::VERTEX, "capture");
        let front = dual.front().id();
        let back = dual.back().id();
        dual.swap();
        assert_eq!(dual.front().id(), back);
        assert_eq!(dual.back().id(), front);
    }

    #[test]
    fn dispose_flag_is_shared() {
        let flag = DisposeFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_disposed());
        flag.dispose();
        assert!(observer.is_disposed());
    }
}
