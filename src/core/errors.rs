//! Error types for the input reorder stage.
//!
//! Construction-time contract violations (wrong destination layout, rank,
//! batch size, element type, or a destination that is too small) surface as
//! [`ReorderError`] values. They indicate a caller bug rather than a runtime
//! data problem: upstream configuration is expected to have been validated
//! before a stage is built, so callers typically treat these as fatal.
//!
//! Non-finite pixel values are *not* errors; they are sanitized to a safe
//! default during execution and never reported.

use crate::tensor::{DataLayout, DataType};
use thiserror::Error;

/// Errors raised while validating or converting reorder stage inputs.
#[derive(Debug, Error)]
pub enum ReorderError {
    /// The destination tensor does not use the expected channel-blocked layout.
    #[error("destination layout mismatch: expected {expected}, got {actual}")]
    LayoutMismatch {
        /// The layout the stage requires.
        expected: DataLayout,
        /// The layout the destination descriptor carries.
        actual: DataLayout,
    },

    /// The destination tensor is not rank 4.
    #[error("destination must be a rank-4 tensor, got rank {rank}")]
    RankMismatch {
        /// The actual rank of the destination descriptor.
        rank: usize,
    },

    /// The destination batch dimension is not 1.
    #[error("destination batch dimension must be 1, got {batch}")]
    BatchMismatch {
        /// The actual batch dimension.
        batch: usize,
    },

    /// The destination element type is not f32.
    #[error("destination element type must be {expected}, got {actual}")]
    DataTypeMismatch {
        /// The element type the stage requires.
        expected: DataType,
        /// The element type the destination descriptor carries.
        actual: DataType,
    },

    /// The destination spatial extent cannot hold the color image.
    #[error(
        "destination {dst_height}x{dst_width} too small for {src_height}x{src_width} color image"
    )]
    DestinationTooSmall {
        /// Destination height (H2).
        dst_height: usize,
        /// Destination width (W2).
        dst_width: usize,
        /// Color image height (H1).
        src_height: usize,
        /// Color image width (W1).
        src_width: usize,
    },

    /// The destination channel extent cannot hold the packed channels, or is
    /// not a whole number of blocks.
    #[error(
        "destination channel extent {channels_capacity} cannot hold {channels_written} packed channels with block size {block}"
    )]
    ChannelCapacity {
        /// Destination channel extent (C2).
        channels_capacity: usize,
        /// Number of channels the stage will write (3, 6 or 9).
        channels_written: usize,
        /// Channel block size (K).
        block: usize,
    },

    /// An image view has invalid geometry (zero extent, stride below 3, or a
    /// backing buffer too short for the declared dimensions).
    #[error("invalid image geometry: {message}")]
    InvalidImage {
        /// A message describing the invalid geometry.
        message: String,
    },

    /// An auxiliary (albedo or normal) image does not match the color image
    /// dimensions.
    #[error(
        "{kind} image {height}x{width} does not match color image {color_height}x{color_width}"
    )]
    AuxiliarySizeMismatch {
        /// Which auxiliary image mismatched ("albedo" or "normal").
        kind: &'static str,
        /// Auxiliary image height.
        height: usize,
        /// Auxiliary image width.
        width: usize,
        /// Color image height.
        color_height: usize,
        /// Color image width.
        color_width: usize,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from basic tensor operations (fallback for ndarray errors).
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),
}

impl ReorderError {
    /// Creates an invalid image geometry error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
