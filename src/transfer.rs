//! Transfer functions applied to color data before it enters the network.
//!
//! Color (radiance) inputs have a large dynamic range; a compressive
//! transfer function squashes them into the range the network was trained
//! on. Only the forward mapping matters to the reorder stage, and it is
//! applied to color channels only — albedo and normal data stay linear.

use std::fmt::Debug;

/// A monotonic scalar mapping applied to sanitized color values.
///
/// Implementations must be stateless or hold externally-owned state; the
/// stage shares the function with the rest of the pipeline behind an `Arc`
/// and evaluates it concurrently from multiple rows.
pub trait TransferFunction: Debug + Send + Sync {
    /// Forward evaluation of the transfer curve.
    fn forward(&self, x: f32) -> f32;
}

/// Identity transfer for inputs that are already in network range.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTransfer;

impl TransferFunction for LinearTransfer {
    #[inline]
    fn forward(&self, x: f32) -> f32 {
        x
    }
}

/// Gamma-compressive transfer (exponent 1/2.2) for low-dynamic-range color.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrgbTransfer;

impl TransferFunction for SrgbTransfer {
    #[inline]
    fn forward(&self, x: f32) -> f32 {
        x.powf(1.0 / 2.2)
    }
}

/// Logarithmic transfer `ln(1 + scale * x)` for high-dynamic-range color.
#[derive(Debug, Clone, Copy)]
pub struct LogTransfer {
    scale: f32,
}

impl LogTransfer {
    /// Creates a log transfer with the given pre-scale.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale` is not finite and positive.
    pub fn new(scale: f32) -> Result<Self, crate::core::ReorderError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(crate::core::ReorderError::config(format!(
                "log transfer scale must be finite and positive, got {scale}"
            )));
        }
        Ok(Self { scale })
    }

    /// The configured pre-scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl Default for LogTransfer {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl TransferFunction for LogTransfer {
    #[inline]
    fn forward(&self, x: f32) -> f32 {
        (1.0 + self.scale * x.max(0.0)).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity() {
        let f = LinearTransfer;
        assert_eq!(f.forward(0.0), 0.0);
        assert_eq!(f.forward(0.25), 0.25);
        assert_eq!(f.forward(7.5), 7.5);
    }

    #[test]
    fn test_srgb_fixed_points_and_monotonicity() {
        let f = SrgbTransfer;
        assert_eq!(f.forward(0.0), 0.0);
        assert_eq!(f.forward(1.0), 1.0);
        assert!(f.forward(0.25) < f.forward(0.5));
        assert!(f.forward(0.5) < f.forward(1.0));
        // Compressive below the curve's fixed point region
        assert!(f.forward(0.5) > 0.5);
    }

    #[test]
    fn test_log_forward_values() {
        let f = LogTransfer::new(1.0).unwrap();
        assert_eq!(f.forward(0.0), 0.0);
        assert!((f.forward(1.0) - 2.0f32.ln()).abs() < 1e-6);
        // Stays finite for very large radiance values.
        assert!(f.forward(1e30).is_finite());
    }

    #[test]
    fn test_log_rejects_bad_scale() {
        assert!(LogTransfer::new(0.0).is_err());
        assert!(LogTransfer::new(-2.0).is_err());
        assert!(LogTransfer::new(f32::NAN).is_err());
    }
}
