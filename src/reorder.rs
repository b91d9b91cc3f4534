//! The input reorder stage.
//!
//! Reads up to three source images (color, optional albedo, optional
//! normal), sanitizes and normalizes each channel group, applies the
//! transfer function to color, and packs everything into a zero-padded
//! channel-blocked destination tensor. Mirror padding extends the image
//! past its edges so the downstream convolutions see reflected content
//! instead of an artificial border.

use std::sync::Arc;

use rayon::prelude::*;

use crate::core::{ParallelPolicy, ReorderError};
use crate::image_view::ImageView;
use crate::tensor::{BlockedTensor, DataLayout, DataType};
use crate::transfer::TransferFunction;

/// Per-channel-group sanitize/normalize policy.
///
/// The three groups share the store path but differ in clamp range and in
/// whether the transfer function applies.
#[derive(Debug, Clone, Copy)]
enum ChannelPolicy {
    /// Radiance: non-negative, unbounded above, transfer function applied.
    Color,
    /// Reflectance: clamped into [0, 1], stored linearly.
    Albedo,
    /// Unit normal: clamped into [-1, 1], rescaled to [0, 1].
    Normal,
}

impl ChannelPolicy {
    #[inline]
    fn apply(self, x: f32, transfer: &dyn TransferFunction) -> f32 {
        match self {
            ChannelPolicy::Color => {
                let x = if x.is_finite() { x.max(0.0) } else { 0.0 };
                transfer.forward(x)
            }
            ChannelPolicy::Albedo => {
                if x.is_finite() {
                    x.clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            ChannelPolicy::Normal => {
                let x = if x.is_finite() { x.clamp(-1.0, 1.0) } else { 0.0 };
                x * 0.5 + 0.5
            }
        }
    }
}

/// Input reorder stage of the denoising pipeline.
///
/// Construction validates the destination tensor against the stage's
/// contract and zero-fills its entire backing buffer exactly once; padded
/// rows, columns and channels must read as zero downstream, and `execute`
/// never re-zeros. [`InputReorder::execute`] then fills the written
/// sub-rectangle, one destination row per parallel work item, with a full
/// join before it returns.
///
/// The source images are borrowed for the stage's lifetime; the destination
/// tensor and transfer function are shared with the rest of the pipeline.
pub struct InputReorder<'a> {
    color: ImageView<'a>,
    albedo: Option<ImageView<'a>>,
    normal: Option<ImageView<'a>>,
    dst: Arc<BlockedTensor>,
    transfer: Arc<dyn TransferFunction>,
    policy: ParallelPolicy,
    // Cached from the destination descriptor at construction.
    block: usize,
    height2: usize,
    width2: usize,
}

impl<'a> InputReorder<'a> {
    /// Creates the stage with the default [`ParallelPolicy`].
    ///
    /// # Arguments
    ///
    /// * `color` - Required color (radiance) image
    /// * `albedo` - Optional albedo image, same dimensions as `color`
    /// * `normal` - Optional normal image, same dimensions as `color`
    /// * `dst` - Destination tensor in channel-blocked layout
    /// * `transfer` - Transfer function applied to color channels
    /// * `block` - Expected channel block size (K) of the destination
    ///
    /// # Errors
    ///
    /// Returns an error when the destination violates the stage's contract:
    /// wrong layout or block size, rank other than 4, batch dimension other
    /// than 1, element type other than f32, spatial or channel extent too
    /// small, or auxiliary images whose dimensions differ from the color
    /// image. These indicate caller bugs and are not recoverable at runtime.
    pub fn new(
        color: ImageView<'a>,
        albedo: Option<ImageView<'a>>,
        normal: Option<ImageView<'a>>,
        dst: Arc<BlockedTensor>,
        transfer: Arc<dyn TransferFunction>,
        block: usize,
    ) -> Result<Self, ReorderError> {
        Self::with_policy(
            color,
            albedo,
            normal,
            dst,
            transfer,
            block,
            ParallelPolicy::default(),
        )
    }

    /// Creates the stage with an explicit [`ParallelPolicy`].
    #[allow(clippy::too_many_arguments)]
    pub fn with_policy(
        color: ImageView<'a>,
        albedo: Option<ImageView<'a>>,
        normal: Option<ImageView<'a>>,
        dst: Arc<BlockedTensor>,
        transfer: Arc<dyn TransferFunction>,
        block: usize,
        policy: ParallelPolicy,
    ) -> Result<Self, ReorderError> {
        let desc = dst.desc();

        let expected = DataLayout::ChwBlocked { block };
        if desc.layout() != expected {
            return Err(ReorderError::LayoutMismatch {
                expected,
                actual: desc.layout(),
            });
        }
        if desc.rank() != 4 {
            return Err(ReorderError::RankMismatch { rank: desc.rank() });
        }
        let dims = desc.dims();
        let (batch, channels2, height2, width2) = (dims[0], dims[1], dims[2], dims[3]);
        if batch != 1 {
            return Err(ReorderError::BatchMismatch { batch });
        }
        if desc.data_type() != DataType::F32 {
            return Err(ReorderError::DataTypeMismatch {
                expected: DataType::F32,
                actual: desc.data_type(),
            });
        }
        if height2 < color.height() || width2 < color.width() {
            return Err(ReorderError::DestinationTooSmall {
                dst_height: height2,
                dst_width: width2,
                src_height: color.height(),
                src_width: color.width(),
            });
        }

        let channels_written = 3 + albedo.map_or(0, |_| 3) + normal.map_or(0, |_| 3);
        if channels2 % block != 0 || channels2 < channels_written {
            return Err(ReorderError::ChannelCapacity {
                channels_capacity: channels2,
                channels_written,
                block,
            });
        }

        for (kind, aux) in [("albedo", &albedo), ("normal", &normal)] {
            if let Some(aux) = aux {
                if aux.height() != color.height() || aux.width() != color.width() {
                    return Err(ReorderError::AuxiliarySizeMismatch {
                        kind,
                        height: aux.height(),
                        width: aux.width(),
                        color_height: color.height(),
                        color_width: color.width(),
                    });
                }
            }
        }

        // Zero the destination once; it may be larger than the region the
        // fill pass writes, and downstream consumers must see zeros there.
        // No other writer may touch the buffer between this and execute().
        dst.data_mut().fill(0.0);

        tracing::debug!(
            src_height = color.height(),
            src_width = color.width(),
            dst_channels = channels2,
            dst_height = height2,
            dst_width = width2,
            block,
            channels_written,
            "input reorder stage constructed"
        );

        Ok(Self {
            color,
            albedo,
            normal,
            dst,
            transfer,
            policy,
            block,
            height2,
            width2,
        })
    }

    /// The shared destination tensor, for downstream consumers.
    pub fn dst(&self) -> Arc<BlockedTensor> {
        Arc::clone(&self.dst)
    }

    /// Fills the destination from the source images.
    ///
    /// Mirror padding reflects the image about its last row/column (without
    /// duplicating the edge pixel), so the filled extent is
    /// `min(H2, 2*H1 - 2)` by `min(W2, 2*W1 - 2)`; everything beyond keeps
    /// the zero written at construction. Rows are processed in parallel and
    /// the call returns only after every row is written. Re-running with
    /// unchanged inputs overwrites the filled region with identical values.
    pub fn execute(&self) {
        let src_h = self.color.height();
        let src_w = self.color.width();
        let fill_h = self.height2.min((2 * src_h).saturating_sub(2));
        let fill_w = self.width2.min((2 * src_w).saturating_sub(2));

        tracing::debug!(fill_h, fill_w, "input reorder fill pass");

        let row_len = self.width2 * self.block;
        let block_len = self.height2 * row_len;

        let mut guard = self.dst.data_mut();

        // Split the buffer so each destination row becomes an independent
        // mutable unit: one row-slice per channel block. Rows of one block
        // are contiguous; a row of the whole tensor is not.
        let mut block_rows: Vec<_> = guard
            .chunks_mut(block_len)
            .map(|b| b.chunks_mut(row_len))
            .collect();
        let mut rows: Vec<Vec<&mut [f32]>> = Vec::with_capacity(fill_h);
        for _ in 0..fill_h {
            rows.push(
                block_rows
                    .iter_mut()
                    .map(|block| block.next().expect("buffer shorter than its descriptor"))
                    .collect(),
            );
        }

        if fill_h <= self.policy.row_threshold {
            for (h, blocks) in rows.iter_mut().enumerate() {
                self.fill_row(h, blocks, fill_w);
            }
        } else {
            rows.into_par_iter().enumerate().for_each(|(h, mut blocks)| {
                self.fill_row(h, &mut blocks, fill_w);
            });
        }
    }

    /// Writes one destination row: mirror the source coordinate, sanitize
    /// each channel group and pack the channels contiguously.
    fn fill_row(&self, h: usize, blocks: &mut [&mut [f32]], fill_w: usize) {
        let k = self.block;
        let src_h = self.color.height();
        let src_w = self.color.width();
        let h1 = if h < src_h { h } else { 2 * src_h - 2 - h };

        for w in 0..fill_w {
            let w1 = if w < src_w { w } else { 2 * src_w - 2 - w };

            // Channels pack contiguously per pixel: 0-2 color, then albedo
            // and normal if present.
            let mut c = 0;
            let mut store = |value: f32| {
                blocks[c / k][w * k + c % k] = value;
                c += 1;
            };

            for &x in &self.color.get(h1, w1)[..3] {
                store(ChannelPolicy::Color.apply(x, self.transfer.as_ref()));
            }
            if let Some(albedo) = &self.albedo {
                for &x in &albedo.get(h1, w1)[..3] {
                    store(ChannelPolicy::Albedo.apply(x, self.transfer.as_ref()));
                }
            }
            if let Some(normal) = &self.normal {
                for &x in &normal.get(h1, w1)[..3] {
                    store(ChannelPolicy::Normal.apply(x, self.transfer.as_ref()));
                }
            }
        }
    }
}
