use std::fmt;

use serde::{Deserialize, Serialize};

/// Result alias used throughout the kernel.
pub type KernelResult<T> = Result<T, KernelError>;

/// Parametric direction of a tensor-product surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    U,
    V,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U => f.write_str("u"),
            Self::V => f.write_str("v"),
        }
    }
}

/// Broad class of a [`KernelError`].
///
/// Configuration errors only come out of construction; retrying with the
/// same input can never succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Domain,
    Degenerate,
    Buffer,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("control net must be non-empty, got {u_count}x{v_count}")]
    EmptyControlNet { u_count: usize, v_count: usize },

    #[error("degree {degree} in {direction} needs at least {} control points, got {count}", .degree + 1)]
    DegreeTooHigh {
        direction: Direction,
        degree: usize,
        count: usize,
    },

    #[error("control net {u_count}x{v_count} is too large to address")]
    ControlNetTooLarge { u_count: usize, v_count: usize },

    #[error("degree {degree} in {direction} needs at least {minimum} knots, got {actual}")]
    KnotVectorTooShort {
        direction: Direction,
        degree: usize,
        minimum: usize,
        actual: usize,
    },

    #[error("{direction} knot vector length must be {expected}, got {actual}")]
    KnotCountMismatch {
        direction: Direction,
        expected: usize,
        actual: usize,
    },

    #[error("{direction} knots must be non-decreasing (knot {index} is smaller than knot {})", .index - 1)]
    NonMonotonicKnots { direction: Direction, index: usize },

    #[error("{direction} parametric domain [{start}, {end}] is empty")]
    EmptyDomain {
        direction: Direction,
        start: f64,
        end: f64,
    },

    #[error("{what} value at index {index} is not finite")]
    NonFiniteValue { what: &'static str, index: usize },

    #[error("weight {index} must be > 0, got {weight}")]
    NonPositiveWeight { index: usize, weight: f64 },

    #[error("{what} must hold {expected} values, got {actual}")]
    InputLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} buffer must hold {expected} values, got {actual}")]
    BufferLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{direction} = {value} is outside the domain [{start}, {end}]")]
    OutOfDomain {
        direction: Direction,
        value: f64,
        start: f64,
        end: f64,
    },

    #[error("{direction} grid needs at least 2 samples, got {count}")]
    InvalidSampleCount { direction: Direction, count: usize },

    #[error("{u_samples}x{v_samples} grid is too large to allocate")]
    GridTooLarge { u_samples: usize, v_samples: usize },

    #[error("clamped knot vector needs count > degree, got count {count} for degree {degree}")]
    InvalidKnotRequest { count: usize, degree: usize },

    #[error("surface is degenerate at ({u}, {v}): {reason}")]
    Degenerate { u: f64, v: f64, reason: &'static str },
}

impl KernelError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyControlNet { .. }
            | Self::ControlNetTooLarge { .. }
            | Self::DegreeTooHigh { .. }
            | Self::KnotVectorTooShort { .. }
            | Self::KnotCountMismatch { .. }
            | Self::NonMonotonicKnots { .. }
            | Self::EmptyDomain { .. }
            | Self::NonFiniteValue { .. }
            | Self::NonPositiveWeight { .. }
            | Self::InputLength { .. }
            | Self::InvalidKnotRequest { .. } => ErrorKind::Configuration,
            Self::OutOfDomain { .. } | Self::InvalidSampleCount { .. } | Self::GridTooLarge { .. } => {
                ErrorKind::Domain
            }
            Self::Degenerate { .. } => ErrorKind::Degenerate,
            Self::BufferLength { .. } => ErrorKind::Buffer,
        }
    }
}
