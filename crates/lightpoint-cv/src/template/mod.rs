//! Region template module

pub mod extractor;

pub use extractor::RegionTemplateExtractor;

use serde::{Deserialize, Serialize};

/// Mask-to-region extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Mask pixels brighter than this are monitored area.
    pub brightness_threshold: u8,
    /// Components with fewer pixels than this are dropped as noise.
    pub min_area: u32,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: 200,
            min_area: 10,
        }
    }
}
