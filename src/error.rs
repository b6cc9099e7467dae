// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types
//!
//! Argument errors are raised by the call that introduced them. Engine errors
//! originate outside the modeling core and are kept in their own category so
//! callers can tell the two apart.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or evaluating geometry
#[derive(Debug, Error)]
pub enum Error {
    /// A construction argument is outside its valid domain
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// A scale factor of exactly zero (the transform could never be inverted)
    #[error("scale factor on axis {axis} is zero")]
    ZeroScale { axis: char },

    /// A mirror normal of zero length
    #[error("mirror normal has zero length")]
    ZeroNormal,

    /// An index into a vertex list is out of range
    #[error("{what} index {index} is out of range for {len} vertices")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Not enough vertices, faces, or children were supplied
    #[error("{what} needs at least {min} elements, got {got}")]
    TooFewElements {
        what: &'static str,
        min: usize,
        got: usize,
    },

    /// The geometry engine failed
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors raised by the engine rather than by argument checks
    pub fn is_engine_error(&self) -> bool {
        matches!(self, Error::Engine(_))
    }
}

/// Failures of an external geometry engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine process ran but reported failure
    #[error("{program} exited with {status}: {stderr}")]
    Process {
        program: String,
        status: String,
        stderr: String,
    },

    /// Engine output could not be decoded
    #[error("could not decode engine output {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The resolved geometry is empty, so it has no extent
    #[error("geometry is empty and has no extent")]
    EmptyGeometry,

    /// The engine does not provide this capability
    #[error("operation `{0}` is not supported by this engine")]
    Unsupported(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Check that a collection has at least `min` elements
pub(crate) fn require_len(what: &'static str, min: usize, got: usize) -> Result<()> {
    if got < min {
        return Err(Error::TooFewElements { what, min, got });
    }
    Ok(())
}

/// Check that a resolution is usable for a polygonal approximation
pub(crate) fn require_resolution(resolution: u32) -> Result<()> {
    if resolution < 3 {
        return Err(Error::invalid(
            "angular_resolution",
            format!("must be at least 3, got {resolution}"),
        ));
    }
    Ok(())
}

/// Check that a size is finite and not negative
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::invalid(
            name,
            format!("must be a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_are_distinguishable() {
        let arg = Error::ZeroScale { axis: 'x' };
        let engine: Error = EngineError::EmptyGeometry.into();

        assert!(!arg.is_engine_error());
        assert!(engine.is_engine_error());
    }

    #[test]
    fn test_require_resolution() {
        assert!(require_resolution(3).is_ok());
        assert!(matches!(
            require_resolution(2),
            Err(Error::InvalidArgument { name: "angular_resolution", .. })
        ));
    }
}
