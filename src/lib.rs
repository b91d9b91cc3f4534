//! Input reorder stage for a CNN image denoiser.
//!
//! This crate converts a set of 2D image buffers (color, optional albedo,
//! optional normal) into a single padded, channel-blocked f32 tensor
//! suitable as the input of a convolutional network inference pass. The
//! stage fuses four concerns into one row-parallel fill loop:
//!
//! - boundary handling via mirror padding
//! - per-channel sanitization (non-finite values become safe defaults) and
//!   channel-group-specific normalization
//! - a pluggable transfer function applied to color data only
//! - a channel-blocked (nChwKc) destination layout addressed with
//!   closed-form index arithmetic
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use denoise_preproc::{
//!     BlockedTensor, ImageView, InputReorder, LogTransfer, TensorDesc,
//! };
//!
//! // 2x2 HDR color image, interleaved RGB.
//! let pixels = vec![1.0f32; 2 * 2 * 3];
//! let color = ImageView::new(&pixels, 2, 2, 3)?;
//!
//! // Destination: [1, 8, 4, 4] in nChw8c layout.
//! let dst = BlockedTensor::new(TensorDesc::chw_blocked(8, 4, 4, 8))?;
//! let transfer = Arc::new(LogTransfer::default());
//!
//! let stage = InputReorder::new(color, None, None, Arc::clone(&dst), transfer, 8)?;
//! stage.execute();
//!
//! let packed = stage.dst().to_nchw()?;
//! assert_eq!(packed[[0, 0, 0, 0]], 2.0f32.ln());
//! assert_eq!(packed[[0, 3, 0, 0]], 0.0); // unwritten channel stays zero
//! # Ok::<(), denoise_preproc::ReorderError>(())
//! ```

pub mod core;
pub mod image_view;
pub mod reorder;
pub mod tensor;
pub mod transfer;

pub use crate::core::{ParallelPolicy, ReorderError};
pub use crate::image_view::ImageView;
pub use crate::reorder::InputReorder;
pub use crate::tensor::{blocked_offset, BlockedTensor, DataLayout, DataType, TensorDesc};
pub use crate::transfer::{LinearTransfer, LogTransfer, SrgbTransfer, TransferFunction};
