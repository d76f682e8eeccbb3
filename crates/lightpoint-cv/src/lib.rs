//! Lightpoint Computer Vision Library
//!
//! Region templates from binary masks, HSV region classification and the
//! frame sources that feed them.

pub mod capture;
pub mod classify;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use capture::{CaptureError, CaptureSettings, StillImageSource};
pub use classify::{ClassifierConfig, Hsv, HsvRange, RegionClassifier, SamplePlan};
pub use template::{RegionTemplateExtractor, TemplateConfig};
pub use traits::FrameSource;

#[cfg(feature = "opencv")]
pub use capture::opencv::OpenCvCamera;

pub use lightpoint_core::{Error, Result};

/// A captured colour frame, RGB channel order.
pub type Frame = image::RgbImage;

/// Core traits for the CV system
pub mod traits {
    use crate::capture::{CaptureError, CaptureSettings};
    use crate::Frame;

    /// Something that produces frames for one camera.
    ///
    /// Implementations own their device exclusively; a source is only ever
    /// read from one thread at a time.
    pub trait FrameSource: Send {
        /// Acquire the device and apply capture settings.
        fn open(&mut self, settings: &CaptureSettings) -> Result<(), CaptureError>;

        /// Read one frame. May block for a device-dependent time.
        fn read_frame(&mut self) -> Result<Frame, CaptureError>;

        /// Release the device. Reading after release fails.
        fn release(&mut self) {}

        /// Human-readable description for logs.
        fn describe(&self) -> String;
    }
}
