//! Change reports produced by comparing live classification to the baseline

use crate::CameraId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which deltas count as a change worth publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangePolicy {
    /// Publish only when active regions decreased by at least the threshold.
    #[default]
    Decrease,
    /// Publish when the active count moved in either direction by at least
    /// the threshold.
    Any,
}

impl ChangePolicy {
    /// Whether `delta` (current minus baseline) crosses `threshold`.
    pub fn crosses(&self, delta: i64, threshold: u32) -> bool {
        let threshold = i64::from(threshold.max(1));
        match self {
            ChangePolicy::Decrease => -delta >= threshold,
            ChangePolicy::Any => delta.abs() >= threshold,
        }
    }
}

/// One per-camera comparison result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub camera_id: CameraId,
    pub baseline_active_count: usize,
    pub current_active_count: usize,
    /// `current - baseline`.
    pub delta: i64,
    /// Regions whose flag differs from the baseline.
    pub flipped: usize,
    pub timestamp: DateTime<Utc>,
}

impl ChangeReport {
    pub fn new(
        camera_id: CameraId,
        baseline_active_count: usize,
        current_active_count: usize,
        flipped: usize,
    ) -> Self {
        Self {
            camera_id,
            baseline_active_count,
            current_active_count,
            delta: current_active_count as i64 - baseline_active_count as i64,
            flipped,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrease_policy() {
        let policy = ChangePolicy::Decrease;
        assert!(policy.crosses(-1, 1));
        assert!(!policy.crosses(-1, 2));
        assert!(policy.crosses(-3, 2));
        assert!(!policy.crosses(4, 1));
        assert!(!policy.crosses(0, 0));
    }

    #[test]
    fn test_any_policy() {
        let policy = ChangePolicy::Any;
        assert!(policy.crosses(2, 2));
        assert!(policy.crosses(-2, 2));
        assert!(!policy.crosses(1, 2));
    }

    #[test]
    fn test_report_delta() {
        let report = ChangeReport::new(4, 2, 1, 1);
        assert_eq!(report.delta, -1);
        assert_eq!(report.camera_id, 4);
    }
}
