//! Lightpoint core data model
//!
//! Monitored regions, classification snapshots, change reports, the inbound
//! trigger message model and the shared baseline reset schedule. Nothing in
//! this crate touches pixels or capture devices.

pub mod error;
pub mod region;
pub mod report;
pub mod schedule;
pub mod snapshot;
pub mod trigger;

pub use error::{Error, Result};
pub use region::{MonitoredRegion, Point, RegionId};
pub use report::{ChangePolicy, ChangeReport};
pub use schedule::{PendingReset, ResetSchedule};
pub use snapshot::ClassificationSnapshot;
pub use trigger::{ResetDecision, SkipReason, StateMessage, TriggerConfig, TriggerEvent};

/// Identifier of one configured camera.
pub type CameraId = u32;
