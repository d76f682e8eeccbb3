//! One camera: its device, its baseline and its live classification

use lightpoint_core::{
    CameraId, ChangePolicy, ChangeReport, ClassificationSnapshot, Error, MonitoredRegion, Result,
};
use lightpoint_cv::{CaptureSettings, Frame, FrameSource, RegionClassifier, SamplePlan};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of a [CameraSession].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Device not acquired.
    Unbound,
    /// Device open, no baseline yet.
    Capturing,
    /// Device open and a baseline is set.
    Monitoring,
}

/// When a comparison against the baseline is worth reporting.
#[derive(Debug, Clone, Copy)]
pub struct ChangeRule {
    pub threshold: u32,
    pub policy: ChangePolicy,
    /// Reports are held back for this long after a baseline capture.
    pub settle_period: Duration,
}

/// Point-in-time view of a session for status logging.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub camera_id: CameraId,
    pub state: SessionState,
    pub baseline_active: Option<usize>,
    pub current_active: usize,
    pub baselines_taken: u64,
    pub capture_failures: u64,
    pub settling: bool,
}

/// Owns one capture device exclusively, plus the per-region baseline and
/// current classification for it.
pub struct CameraSession {
    camera_id: CameraId,
    source: Box<dyn FrameSource>,
    regions: Arc<[MonitoredRegion]>,
    classifier: Arc<RegionClassifier>,
    /// Sample coordinates for the last frame size seen.
    plan: SamplePlan,
    capture: CaptureSettings,
    scan_interval: Duration,

    state: SessionState,
    baseline: Option<ClassificationSnapshot>,
    current: ClassificationSnapshot,
    last_scan: Option<Instant>,
    baseline_taken_at: Option<Instant>,
    /// Current active count last reported; cleared when the comparison
    /// falls back under threshold or the baseline changes.
    reported_count: Option<usize>,
    baselines_taken: u64,
    capture_failures: u64,
}

impl CameraSession {
    pub fn new(
        camera_id: CameraId,
        source: Box<dyn FrameSource>,
        regions: Arc<[MonitoredRegion]>,
        classifier: Arc<RegionClassifier>,
        capture: CaptureSettings,
        scan_interval: Duration,
    ) -> Self {
        let plan = classifier.plan(&regions, capture.width, capture.height);
        Self {
            camera_id,
            source,
            regions,
            classifier,
            plan,
            capture,
            scan_interval,
            state: SessionState::Unbound,
            baseline: None,
            current: ClassificationSnapshot::new(),
            last_scan: None,
            baseline_taken_at: None,
            reported_count: None,
            baselines_taken: 0,
            capture_failures: 0,
        }
    }

    pub fn camera_id(&self) -> CameraId {
        self.camera_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn regions(&self) -> &[MonitoredRegion] {
        &self.regions
    }

    pub fn baseline(&self) -> Option<&ClassificationSnapshot> {
        self.baseline.as_ref()
    }

    pub fn current(&self) -> &ClassificationSnapshot {
        &self.current
    }

    pub fn baseline_established(&self) -> bool {
        self.baseline.is_some()
    }

    /// Acquire the device, apply capture settings and discard warm-up frames.
    ///
    /// Fails with [Error::DeviceUnavailable] when the device cannot be opened
    /// or no warm-up read returns a frame. Not retried here.
    pub fn open(&mut self) -> Result<()> {
        let camera_id = self.camera_id;
        self.source
            .open(&self.capture)
            .map_err(|e| Error::DeviceUnavailable {
                camera_id,
                reason: e.to_string(),
            })?;

        let reads = self.capture.warmup_reads.max(1);
        let mut obtained = 0;
        let mut last_error = None;
        for attempt in 1..=reads {
            match self.source.read_frame() {
                Ok(_) => obtained += 1,
                Err(e) => {
                    debug!(camera_id, attempt, error = %e, "warm-up read failed");
                    last_error = Some(e.to_string());
                    thread::sleep(self.capture.warmup_delay());
                }
            }
        }

        if obtained == 0 {
            self.source.release();
            return Err(Error::DeviceUnavailable {
                camera_id,
                reason: last_error.unwrap_or_else(|| "no frame after warm-up".into()),
            });
        }

        self.state = SessionState::Capturing;
        info!(camera_id, source = %self.source.describe(), obtained, "camera opened");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let camera_id = self.camera_id;
        if self.state == SessionState::Unbound {
            return Err(Error::CaptureFailure {
                camera_id,
                reason: "session is not open".into(),
            });
        }
        self.source.read_frame().map_err(|e| {
            self.capture_failures += 1;
            warn!(camera_id, failures = self.capture_failures, error = %e, "capture failed");
            Error::CaptureFailure {
                camera_id,
                reason: e.to_string(),
            }
        })
    }

    /// Classify every region, rebuilding the sample plan only when the frame
    /// size differs from the one it was built for.
    fn classify(&mut self, frame: &Frame) -> ClassificationSnapshot {
        let (width, height) = frame.dimensions();
        if !self.plan.fits(width, height) {
            debug!(camera_id = self.camera_id, width, height, "rebuilding sample plan");
            self.plan = self.classifier.plan(&self.regions, width, height);
        }
        self.classifier.classify_planned(frame, &self.plan)
    }

    /// Read one frame and make its classification the new baseline.
    ///
    /// On failure the session stays without a baseline; the next scheduled
    /// reset retries.
    pub fn capture_baseline(&mut self, now: Instant) -> Result<()> {
        let frame = self.read_frame()?;
        let snapshot = self.classify(&frame);

        info!(
            camera_id = self.camera_id,
            active = snapshot.active_count(),
            regions = snapshot.len(),
            "baseline established"
        );

        self.current = snapshot.clone();
        self.baseline = Some(snapshot);
        self.baseline_taken_at = Some(now);
        self.reported_count = None;
        self.baselines_taken += 1;
        self.state = SessionState::Monitoring;
        Ok(())
    }

    /// Drop the baseline, returning to [SessionState::Capturing].
    pub fn invalidate_baseline(&mut self) {
        if self.baseline.take().is_some() {
            debug!(camera_id = self.camera_id, "baseline invalidated");
        }
        self.baseline_taken_at = None;
        self.reported_count = None;
        if self.state == SessionState::Monitoring {
            self.state = SessionState::Capturing;
        }
    }

    /// Classify a fresh frame into `current` unless throttled.
    ///
    /// Returns `Ok(None)` when the scan interval has not elapsed since the
    /// last scan (or the session is not open), otherwise the number of regions
    /// that differ from the baseline (zero without a baseline).
    pub fn scan_once(&mut self, now: Instant) -> Result<Option<usize>> {
        if self.state == SessionState::Unbound {
            return Ok(None);
        }
        let throttled = self
            .last_scan
            .is_some_and(|last| now.saturating_duration_since(last) < self.scan_interval);
        if throttled {
            return Ok(None);
        }
        // A failed read still counts as an attempt for throttling.
        self.last_scan = Some(now);

        let frame = self.read_frame()?;
        self.current = self.classify(&frame);

        let flipped = self
            .baseline
            .as_ref()
            .map_or(0, |baseline| self.current.flipped_against(baseline));
        debug!(
            camera_id = self.camera_id,
            flipped,
            active = self.current.active_count(),
            "scan"
        );
        Ok(Some(flipped))
    }

    fn settling(&self, now: Instant, settle_period: Duration) -> bool {
        self.baseline_taken_at
            .is_some_and(|taken| now.saturating_duration_since(taken) < settle_period)
    }

    /// Compare `current` to the baseline and produce a report when `rule` is
    /// crossed. A given current count is reported once.
    pub fn evaluate(&mut self, now: Instant, rule: &ChangeRule) -> Option<ChangeReport> {
        let baseline = self.baseline.as_ref()?;
        if self.settling(now, rule.settle_period) {
            return None;
        }

        let baseline_active = baseline.active_count();
        let current_active = self.current.active_count();
        let delta = current_active as i64 - baseline_active as i64;
        if !rule.policy.crosses(delta, rule.threshold) {
            self.reported_count = None;
            return None;
        }
        if self.reported_count == Some(current_active) {
            return None;
        }

        let flipped = self.current.flipped_against(baseline);
        self.reported_count = Some(current_active);
        Some(ChangeReport::new(
            self.camera_id,
            baseline_active,
            current_active,
            flipped,
        ))
    }

    pub fn status(&self, now: Instant, settle_period: Duration) -> SessionStatus {
        SessionStatus {
            camera_id: self.camera_id,
            state: self.state,
            baseline_active: self.baseline.as_ref().map(|b| b.active_count()),
            current_active: self.current.active_count(),
            baselines_taken: self.baselines_taken,
            capture_failures: self.capture_failures,
            settling: self.settling(now, settle_period),
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if self.state != SessionState::Unbound {
            self.source.release();
            debug!(camera_id = self.camera_id, "camera released");
        }
    }
}
