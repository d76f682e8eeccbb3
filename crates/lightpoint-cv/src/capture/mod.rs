//! Frame capture sources

pub mod still;

#[cfg(feature = "opencv")]
pub mod opencv;

pub use still::StillImageSource;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors raised by a [crate::FrameSource].
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("device is not open")]
    NotOpen,

    #[error("could not open {0}")]
    OpenFailed(String),

    #[error("no frame returned")]
    NoFrame,

    #[error("unexpected frame layout: {0}")]
    BadFrame(String),

    #[error("image error: {source}")]
    Image {
        #[from]
        source: image::ImageError,
    },

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {source}")]
    OpenCv {
        #[from]
        source: ::opencv::Error,
    },
}

/// Fixed capture parameters applied when a device is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Driver-side frame queue depth; 1 keeps reads close to "now".
    pub buffer_size: u32,
    /// 0-100 scale, mapped to the driver range.
    pub brightness: u32,
    pub contrast: u32,
    pub saturation: u32,
    pub exposure: f64,
    pub auto_exposure: bool,
    /// Frames read and discarded after opening.
    pub warmup_reads: u32,
    /// Pause after a failed warm-up read.
    pub warmup_delay_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            buffer_size: 1,
            brightness: 50,
            contrast: 50,
            saturation: 50,
            exposure: -6.0,
            auto_exposure: false,
            warmup_reads: 5,
            warmup_delay_ms: 100,
        }
    }
}

impl CaptureSettings {
    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }
}
