//! Utility modules

pub mod image;
pub mod polygon;

pub use image::ImageUtils;
pub use polygon::region_pixels;
