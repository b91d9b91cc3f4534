//! Channel-blocked tensor descriptor and backing buffer.
//!
//! The destination of the reorder stage is a rank-4 `[N, C, H, W]` tensor
//! stored in a channel-blocked (nChwKc) layout: channels are grouped into
//! blocks of `K`, and each block is stored as a contiguous `H*W*K` plane.
//! The flat offset of channel `c` at row `h`, column `w` is computed by
//! [`blocked_offset`], which is kept as a pure function so the addressing
//! scheme can be tested independently of the pixel-processing logic.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::ReorderError;
use ndarray::Array4;

/// Element type tag for a tensor descriptor.
///
/// The reorder stage only writes f32 data; the tag exists so construction
/// can validate the destination rather than assume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 32-bit IEEE float.
    F32,
    /// 16-bit IEEE float (not written by this crate).
    F16,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::F32 => write!(f, "f32"),
            DataType::F16 => write!(f, "f16"),
        }
    }
}

/// Memory layout tag for a tensor descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLayout {
    /// Plain planar `[N, C, H, W]` layout.
    Nchw,
    /// Channel-blocked nChwKc layout with the given block size.
    ChwBlocked {
        /// Channel block size (K).
        block: usize,
    },
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLayout::Nchw => write!(f, "nchw"),
            DataLayout::ChwBlocked { block } => write!(f, "nChw{block}c"),
        }
    }
}

/// Shape, layout and element type of a tensor buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDesc {
    layout: DataLayout,
    dims: Vec<usize>,
    data_type: DataType,
}

impl TensorDesc {
    /// Creates a descriptor from raw parts.
    pub fn new(layout: DataLayout, dims: Vec<usize>, data_type: DataType) -> Self {
        Self {
            layout,
            dims,
            data_type,
        }
    }

    /// Creates a rank-4, single-sample, f32, channel-blocked descriptor.
    pub fn chw_blocked(channels: usize, height: usize, width: usize, block: usize) -> Self {
        Self {
            layout: DataLayout::ChwBlocked { block },
            dims: vec![1, channels, height, width],
            data_type: DataType::F32,
        }
    }

    /// The memory layout tag.
    pub fn layout(&self) -> DataLayout {
        self.layout
    }

    /// The logical dimensions, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// The element type tag.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Total number of elements (product of all dimensions).
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Whether the descriptor has any zero dimension.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat offset of channel `c` at row `h`, column `w` in a channel-blocked
/// buffer with spatial extent `h2` x `w2` and block size `k`.
///
/// Channels are grouped into blocks of `k`; block `c / k` occupies a
/// contiguous `h2 * w2 * k` plane, within which a pixel's `k` in-block
/// channels are stored contiguously.
#[inline]
pub fn blocked_offset(c: usize, h: usize, w: usize, h2: usize, w2: usize, k: usize) -> usize {
    (c / k) * (h2 * w2 * k) + h * w2 * k + w * k + (c % k)
}

/// A reference-counted tensor buffer in channel-blocked layout.
///
/// The buffer is shared between the reorder stage and the downstream
/// consumers of the packed input (lifetime = longest holder). Writes go
/// through the write lock, which the reorder stage holds for the whole fill
/// pass; downstream readers take read guards. The descriptor is immutable
/// for the tensor's lifetime.
#[derive(Debug)]
pub struct BlockedTensor {
    desc: TensorDesc,
    data: RwLock<Vec<f32>>,
}

impl BlockedTensor {
    /// Allocates a zero-initialized tensor for the given descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor's channel extent is not a whole
    /// number of blocks, since such a buffer cannot be addressed by
    /// [`blocked_offset`].
    pub fn new(desc: TensorDesc) -> Result<Arc<Self>, ReorderError> {
        if let DataLayout::ChwBlocked { block } = desc.layout() {
            let channels = desc.dims().get(1).copied().unwrap_or(0);
            if block == 0 || channels % block != 0 {
                return Err(ReorderError::ChannelCapacity {
                    channels_capacity: channels,
                    channels_written: 0,
                    block,
                });
            }
        }
        let len = desc.len();
        Ok(Arc::new(Self {
            desc,
            data: RwLock::new(vec![0.0; len]),
        }))
    }

    /// The tensor's descriptor.
    pub fn desc(&self) -> &TensorDesc {
        &self.desc
    }

    /// Read access to the backing buffer.
    pub fn data(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to the backing buffer. Held by the reorder stage for
    /// the duration of its zero-fill and fill passes.
    pub(crate) fn data_mut(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Converts the blocked buffer into a planar `[N, C, H, W]` array.
    ///
    /// This is intended for downstream consumers and tests that want to
    /// inspect the packed input without replicating the blocked addressing.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor is not rank 4 or not channel-blocked.
    pub fn to_nchw(&self) -> Result<Array4<f32>, ReorderError> {
        let DataLayout::ChwBlocked { block } = self.desc.layout() else {
            return Err(ReorderError::config(format!(
                "cannot unblock a {} tensor",
                self.desc.layout()
            )));
        };
        let &[n, c2, h2, w2] = self.desc.dims() else {
            return Err(ReorderError::RankMismatch {
                rank: self.desc.rank(),
            });
        };

        let data = self.data();
        let mut planar = vec![0.0f32; n * c2 * h2 * w2];
        for c in 0..c2 {
            for h in 0..h2 {
                for w in 0..w2 {
                    planar[c * h2 * w2 + h * w2 + w] = data[blocked_offset(c, h, w, h2, w2, block)];
                }
            }
        }
        Array4::from_shape_vec((n, c2, h2, w2), planar).map_err(ReorderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_offset_round_trip_across_blocks() {
        // Writing through the offset formula and reading back through the
        // same formula must be lossless for channels spanning several blocks.
        for &k in &[4usize, 8, 16] {
            let (c2, h2, w2) = (2 * k, 3, 5);
            let mut buf = vec![0.0f32; c2 * h2 * w2];
            for c in 0..c2 {
                for h in 0..h2 {
                    for w in 0..w2 {
                        let value = (c * 10_000 + h * 100 + w) as f32;
                        buf[blocked_offset(c, h, w, h2, w2, k)] = value;
                    }
                }
            }
            for c in 0..c2 {
                for h in 0..h2 {
                    for w in 0..w2 {
                        let expected = (c * 10_000 + h * 100 + w) as f32;
                        assert_eq!(buf[blocked_offset(c, h, w, h2, w2, k)], expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_blocked_offset_is_a_permutation() {
        // Every (c, h, w) triple must map to a distinct in-bounds offset.
        let (c2, h2, w2, k) = (8usize, 2, 3, 4);
        let mut seen = vec![false; c2 * h2 * w2];
        for c in 0..c2 {
            for h in 0..h2 {
                for w in 0..w2 {
                    let off = blocked_offset(c, h, w, h2, w2, k);
                    assert!(off < seen.len());
                    assert!(!seen[off], "offset {off} produced twice");
                    seen[off] = true;
                }
            }
        }
    }

    #[test]
    fn test_tensor_desc_accessors() {
        let desc = TensorDesc::chw_blocked(8, 4, 6, 8);
        assert_eq!(desc.layout(), DataLayout::ChwBlocked { block: 8 });
        assert_eq!(desc.dims(), &[1, 8, 4, 6]);
        assert_eq!(desc.rank(), 4);
        assert_eq!(desc.data_type(), DataType::F32);
        assert_eq!(desc.len(), 8 * 4 * 6);
    }

    #[test]
    fn test_blocked_tensor_rejects_partial_block() {
        let desc = TensorDesc::chw_blocked(6, 2, 2, 4);
        assert!(matches!(
            BlockedTensor::new(desc),
            Err(ReorderError::ChannelCapacity { .. })
        ));
    }

    #[test]
    fn test_blocked_tensor_starts_zeroed() {
        let dst = BlockedTensor::new(TensorDesc::chw_blocked(8, 2, 2, 8)).unwrap();
        assert!(dst.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_to_nchw_matches_blocked_offsets() {
        let (c2, h2, w2, k) = (8usize, 3, 2, 4);
        let dst = BlockedTensor::new(TensorDesc::chw_blocked(c2, h2, w2, k)).unwrap();
        {
            let mut data = dst.data_mut();
            for c in 0..c2 {
                for h in 0..h2 {
                    for w in 0..w2 {
                        data[blocked_offset(c, h, w, h2, w2, k)] =
                            (c * 100 + h * 10 + w) as f32;
                    }
                }
            }
        }
        let planar = dst.to_nchw().unwrap();
        assert_eq!(planar.dim(), (1, c2, h2, w2));
        for c in 0..c2 {
            for h in 0..h2 {
                for w in 0..w2 {
                    assert_eq!(planar[[0, c, h, w]], (c * 100 + h * 10 + w) as f32);
                }
            }
        }
    }

    #[test]
    fn test_to_nchw_rejects_planar_layout() {
        let desc = TensorDesc::new(DataLayout::Nchw, vec![1, 3, 2, 2], DataType::F32);
        let dst = BlockedTensor::new(desc).unwrap();
        assert!(matches!(dst.to_nchw(), Err(ReorderError::Config { .. })));
    }
}
