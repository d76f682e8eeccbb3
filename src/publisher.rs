//! Outbound trigger seam

use lightpoint_core::{ChangeReport, Result};
use tracing::info;

/// Emits the outbound trigger. The message carries no meaningful content;
/// receivers react to its arrival.
pub trait TriggerPublisher: Send {
    /// Publish once for the reports of one tick. Must not block.
    fn publish_trigger(&mut self, reports: &[ChangeReport]) -> Result<()>;
}

/// Publisher used when no broker is configured: only logs.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl TriggerPublisher for LogPublisher {
    fn publish_trigger(&mut self, reports: &[ChangeReport]) -> Result<()> {
        for report in reports {
            info!(
                camera_id = report.camera_id,
                delta = report.delta,
                flipped = report.flipped,
                "trigger (no broker)"
            );
        }
        Ok(())
    }
}
