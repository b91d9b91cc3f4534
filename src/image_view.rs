//! Borrowed views over interleaved f32 image buffers.

use crate::core::ReorderError;
use image::Rgb32FImage;

/// A read-only view over a 2D buffer of interleaved f32 pixels.
///
/// Each pixel occupies `pixel_stride` consecutive floats, of which the first
/// three carry the channel data consumed by the reorder stage (the semantics
/// of those channels — color, albedo or normal — are the caller's). The view
/// borrows the backing buffer; the caller keeps it alive and unmodified for
/// the duration of the reorder pass.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    pixel_stride: usize,
}

impl<'a> ImageView<'a> {
    /// Creates a view over `data` with the given dimensions.
    ///
    /// Pixels are stored row-major: the pixel at row `h`, column `w` starts
    /// at `(h * width + w) * pixel_stride`.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero, the stride is below 3,
    /// or `data` is too short for `width * height` pixels.
    pub fn new(
        data: &'a [f32],
        width: usize,
        height: usize,
        pixel_stride: usize,
    ) -> Result<Self, ReorderError> {
        if width == 0 || height == 0 {
            return Err(ReorderError::invalid_image(format!(
                "image dimensions must be non-zero, got {height}x{width}"
            )));
        }
        if pixel_stride < 3 {
            return Err(ReorderError::invalid_image(format!(
                "pixel stride must be at least 3 channels, got {pixel_stride}"
            )));
        }
        let required = width * height * pixel_stride;
        if data.len() < required {
            return Err(ReorderError::invalid_image(format!(
                "buffer of {} floats too short for {height}x{width} image with stride {pixel_stride} ({required} required)",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            pixel_stride,
        })
    }

    /// Creates a view borrowing the raw samples of an `image` crate RGB f32 buffer.
    pub fn from_rgb32f(img: &'a Rgb32FImage) -> Result<Self, ReorderError> {
        Self::new(
            img.as_raw(),
            img.width() as usize,
            img.height() as usize,
            3,
        )
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of floats per pixel.
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// The pixel at row `h`, column `w`: `pixel_stride` contiguous floats.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn get(&self, h: usize, w: usize) -> &'a [f32] {
        debug_assert!(h < self.height && w < self.width);
        let start = (h * self.width + w) * self.pixel_stride;
        &self.data[start..start + self.pixel_stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_view_get_with_stride() {
        // 2x2 image, 4 floats per pixel; the 4th float is ignored payload.
        let data: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let view = ImageView::new(&data, 2, 2, 4).unwrap();
        assert_eq!(view.get(0, 0)[..3], [0.0, 1.0, 2.0]);
        assert_eq!(view.get(0, 1)[..3], [4.0, 5.0, 6.0]);
        assert_eq!(view.get(1, 0)[..3], [8.0, 9.0, 10.0]);
        assert_eq!(view.get(1, 1)[..3], [12.0, 13.0, 14.0]);
    }

    #[test]
    fn test_image_view_rejects_bad_geometry() {
        let data = vec![0.0f32; 12];
        assert!(matches!(
            ImageView::new(&data, 0, 2, 3),
            Err(ReorderError::InvalidImage { .. })
        ));
        assert!(matches!(
            ImageView::new(&data, 2, 2, 2),
            Err(ReorderError::InvalidImage { .. })
        ));
        assert!(matches!(
            ImageView::new(&data, 3, 2, 3),
            Err(ReorderError::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_image_view_from_rgb32f() {
        let mut img = Rgb32FImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([0.1, 0.2, 0.3]));
        img.put_pixel(1, 0, image::Rgb([0.4, 0.5, 0.6]));
        let view = ImageView::from_rgb32f(&img).unwrap();
        assert_eq!(view.width(), 2);
        assert_eq!(view.height(), 1);
        assert_eq!(view.get(0, 1), &[0.4, 0.5, 0.6]);
    }
}
