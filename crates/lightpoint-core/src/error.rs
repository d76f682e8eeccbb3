//! Error taxonomy shared by every lightpoint crate

use crate::CameraId;

/// The lightpoint error type.
///
/// Only [Error::Template] is fatal, and only at startup. Everything else is
/// scoped to one camera, one scan or one message and is handled by skipping
/// that unit of work.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("region template error: {0}")]
    Template(String),

    #[error("camera {camera_id} unavailable: {reason}")]
    DeviceUnavailable { camera_id: CameraId, reason: String },

    #[error("frame capture failed on camera {camera_id}: {reason}")]
    CaptureFailure { camera_id: CameraId, reason: String },

    #[error("malformed trigger message: {0}")]
    MalformedTriggerMessage(String),

    #[error("publish failed: {0}")]
    PublishFailure(String),

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for the startup-only failure that should abort the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Template(_))
    }
}
