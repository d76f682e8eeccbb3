//! Classifier configuration

use super::Hsv;
use serde::{Deserialize, Serialize};

/// Inclusive HSV box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        let values = [hsv.h, hsv.s, hsv.v];
        values
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}

/// Region classifier configuration
///
/// Two bands are always configured so a hue that wraps around zero (red) can
/// be covered by a low-hue and a high-hue band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub low_band: HsvRange,
    pub high_band: HsvRange,
    /// A region is active when the matching fraction of sampled pixels
    /// exceeds this ratio.
    pub match_ratio: f64,
    /// Upper bound on pixels sampled per region.
    pub sample_cap: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            low_band: HsvRange::new([0, 50, 50], [25, 255, 255]),
            high_band: HsvRange::new([155, 50, 50], [180, 255, 255]),
            match_ratio: 0.1,
            sample_cap: 100,
        }
    }
}

impl ClassifierConfig {
    /// True if `hsv` falls in either band.
    pub fn matches(&self, hsv: Hsv) -> bool {
        self.low_band.contains(hsv) || self.high_band.contains(hsv)
    }
}
