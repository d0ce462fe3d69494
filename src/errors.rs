//! Error Types
//!
//! This module defines the error types used throughout the cache.
//!
//! # Overview
//!
//! The main error type [`WeftError`] covers the failure modes that are
//! fatal for a single resource:
//! - Unsupported index data formats
//! - Compute sequencing violations
//! - Uniform layout mismatches
//!
//! Shader compile and link failures are deliberately *not* represented
//! here — they are logged (and routed to a user hook) so the render loop
//! keeps presenting frames. See `cache::pipelines`.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, WeftError>`.

use thiserror::Error;

/// The main error type for the weft cache.
#[derive(Error, Debug)]
pub enum WeftError {
    /// An attribute was submitted as an index buffer with a format other
    /// than `Uint16` / `Uint32`. No sane GPU index type can be inferred.
    #[error("Unsupported index format {format:?} for buffer {label:?}")]
    UnsupportedIndexFormat {
        /// Label of the backing buffer.
        label: String,
        /// The offending vertex format.
        format: wgpu::VertexFormat,
    },

    /// Compute begin/dispatch/finish calls arrived out of order.
    #[error("Compute sequencing violation: {0}")]
    ComputePhase(String),

    /// A uniform name was set that the group does not contain.
    #[error("Unknown uniform {0:?}")]
    UnknownUniform(String),

    /// A uniform was set with a value of a different kind than it was
    /// declared with, which would silently corrupt the byte layout.
    #[error("Uniform {name:?} declared as {declared} but set with {provided}")]
    UniformTypeMismatch {
        /// Name of the uniform.
        name: String,
        /// Kind the uniform was declared with.
        declared: &'static str,
        /// Kind of the provided value.
        provided: &'static str,
    },
}

/// Alias for `Result<T, WeftError>`.
pub type Result<T> = std::result::Result<T, WeftError>;
