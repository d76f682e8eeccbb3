//! Mask loading and resampling helpers

use crate::{Error, Result};
use image::{GrayImage, Luma, imageops::FilterType};
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load a mask image as single-channel 8-bit.
    pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
        let img = image::open(&path).map_err(|e| {
            Error::Template(format!("failed to read mask {:?}: {}", path.as_ref(), e))
        })?;
        Ok(img.to_luma8())
    }

    /// Nearest-neighbour resize. Hard region edges stay hard; no new grey
    /// levels are introduced along boundaries.
    pub fn resize_nearest(mask: &GrayImage, width: u32, height: u32) -> GrayImage {
        if mask.dimensions() == (width, height) {
            return mask.clone();
        }
        image::imageops::resize(mask, width, height, FilterType::Nearest)
    }

    /// Pixels strictly above `threshold` become 255, everything else 0.
    pub fn binarize(mask: &GrayImage, threshold: u8) -> GrayImage {
        GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            if mask.get_pixel(x, y)[0] > threshold {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_keeps_hard_edges() {
        let mut mask = GrayImage::new(4, 4);
        for y in 0..4 {
            for x in 0..2 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let scaled = ImageUtils::resize_nearest(&mask, 16, 16);
        assert_eq!(scaled.dimensions(), (16, 16));
        assert!(scaled.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(scaled.get_pixel(5, 3)[0], 255);
        assert_eq!(scaled.get_pixel(10, 3)[0], 0);
    }

    #[test]
    fn test_binarize_threshold_is_exclusive() {
        let mask = GrayImage::from_raw(3, 1, vec![200, 201, 10]).unwrap();
        let binary = ImageUtils::binarize(&mask, 200);
        assert_eq!(binary.as_raw(), &vec![0, 255, 0]);
    }

    #[test]
    fn test_load_mask_missing_file() {
        let err = ImageUtils::load_mask("/nonexistent/mask.png").unwrap_err();
        assert!(err.is_fatal());
    }
}
