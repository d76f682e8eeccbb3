//! HSV colour classification of monitored regions

pub mod classifier;
pub mod config;
pub mod plan;

pub use classifier::RegionClassifier;
pub use config::{ClassifierConfig, HsvRange};
pub use plan::SamplePlan;

use image::Rgb;
use serde::{Deserialize, Serialize};

/// 8-bit HSV triple. Hue is halved to fit a byte (0..=180), saturation and
/// value span 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Convert an RGB pixel.
    pub fn from_rgb(pixel: Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let diff = max - min;

        let s = if max > 0.0 { 255.0 * diff / max } else { 0.0 };

        let h = if diff == 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / diff
        } else if max == g {
            120.0 + 60.0 * (b - r) / diff
        } else {
            240.0 + 60.0 * (r - g) / diff
        };
        // Halve and round before wrapping, as OpenCV's 8-bit path does.
        let mut h = (h / 2.0).round();
        if h < 0.0 {
            h += 180.0;
        }

        Self {
            h: h.clamp(0.0, 180.0) as u8,
            s: s.round().clamp(0.0, 255.0) as u8,
            v: max as u8,
        }
    }
}
