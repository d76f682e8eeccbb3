//! The controller loop tying sessions, the reset schedule and the publisher
//! together

use crate::config::MonitorConfig;
use crate::publisher::TriggerPublisher;
use crate::session::{CameraSession, ChangeRule, SessionStatus};
use lightpoint_core::{ChangeReport, ResetSchedule};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Aggregate view for status logging.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub schedule_generation: u64,
    pub reset_pending: bool,
    pub triggers_published: u64,
    pub publish_failures: u64,
    pub cameras: Vec<SessionStatus>,
}

/// Owns every [CameraSession]; the only code that touches a device.
pub struct MonitorController {
    sessions: Vec<CameraSession>,
    schedule: Arc<ResetSchedule>,
    publisher: Box<dyn TriggerPublisher>,
    config: MonitorConfig,
    rule: ChangeRule,
    seen_generation: u64,
    triggers_published: u64,
    publish_failures: u64,
    last_status_log: Option<Instant>,
}

impl MonitorController {
    pub fn new(
        sessions: Vec<CameraSession>,
        schedule: Arc<ResetSchedule>,
        publisher: Box<dyn TriggerPublisher>,
        config: MonitorConfig,
    ) -> Self {
        let rule = config.change_rule();
        Self {
            sessions,
            schedule,
            publisher,
            config,
            rule,
            seen_generation: 0,
            triggers_published: 0,
            publish_failures: 0,
            last_status_log: None,
        }
    }

    pub fn sessions(&self) -> &[CameraSession] {
        &self.sessions
    }

    /// Open every session. Cameras whose device is unavailable are dropped
    /// from the active set for the rest of the run. Returns how many remain.
    pub fn open_all(&mut self) -> usize {
        self.sessions.retain_mut(|session| match session.open() {
            Ok(()) => true,
            Err(e) => {
                error!(camera_id = session.camera_id(), error = %e, "camera excluded");
                false
            }
        });
        self.sessions.len()
    }

    /// One pass of the loop at time `now`.
    ///
    /// Order: invalidate baselines if a new reset was armed, capture
    /// baselines if the pending reset is due, scan every camera, then
    /// compare and publish. Returns the reports that crossed the rule.
    pub fn tick(&mut self, now: Instant) -> Vec<ChangeReport> {
        let generation = self.schedule.generation();
        if generation != self.seen_generation {
            debug!(generation, "reset armed, invalidating baselines");
            self.seen_generation = generation;
            for session in &mut self.sessions {
                session.invalidate_baseline();
            }
        }

        if let Some(reset) = self.schedule.take_due(now) {
            // A reset armed between the two schedule reads is covered here.
            self.seen_generation = self.seen_generation.max(reset.generation);
            info!(generation = reset.generation, "capturing baselines");
            for session in &mut self.sessions {
                if let Err(e) = session.capture_baseline(now) {
                    error!(camera_id = session.camera_id(), error = %e, "baseline capture failed");
                }
            }
        }

        self.scan_all(now);

        let rule = self.rule;
        let reports: Vec<ChangeReport> = self
            .sessions
            .iter_mut()
            .filter_map(|session| session.evaluate(now, &rule))
            .collect();

        if !reports.is_empty() {
            self.publish(&reports);
        }
        reports
    }

    fn scan_all(&mut self, now: Instant) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.sessions
                .par_iter_mut()
                .for_each(|session| Self::scan_session(session, now));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for session in &mut self.sessions {
                Self::scan_session(session, now);
            }
        }
    }

    fn scan_session(session: &mut CameraSession, now: Instant) {
        // Capture failures are counted and logged by the session.
        if let Ok(Some(flipped)) = session.scan_once(now) {
            if flipped > 0 {
                debug!(camera_id = session.camera_id(), flipped, "regions flipped");
            }
        }
    }

    fn publish(&mut self, reports: &[ChangeReport]) {
        for report in reports {
            info!(
                camera_id = report.camera_id,
                baseline = report.baseline_active_count,
                current = report.current_active_count,
                delta = report.delta,
                flipped = report.flipped,
                "change detected"
            );
        }
        match self.publisher.publish_trigger(reports) {
            Ok(()) => self.triggers_published += 1,
            Err(e) => {
                self.publish_failures += 1;
                warn!(error = %e, failures = self.publish_failures, "trigger publish failed");
            }
        }
    }

    pub fn status(&self, now: Instant) -> MonitorStatus {
        MonitorStatus {
            schedule_generation: self.schedule.generation(),
            reset_pending: self.schedule.pending().is_some(),
            triggers_published: self.triggers_published,
            publish_failures: self.publish_failures,
            cameras: self
                .sessions
                .iter()
                .map(|session| session.status(now, self.rule.settle_period))
                .collect(),
        }
    }

    fn log_status(&mut self, now: Instant) {
        let interval = self.config.status_log_interval();
        let due = self
            .last_status_log
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if !due {
            return;
        }
        self.last_status_log = Some(now);
        match serde_json::to_string(&self.status(now)) {
            Ok(status) => info!(%status, "monitor status"),
            Err(e) => warn!(error = %e, "could not serialise status"),
        }
    }

    /// Tick until `running` is cleared.
    pub fn run(&mut self, running: &AtomicBool) {
        let tick_interval = self.config.tick_interval();
        info!(
            cameras = self.sessions.len(),
            tick_ms = self.config.tick_interval_ms,
            "monitor running"
        );

        while running.load(Ordering::SeqCst) {
            let started = Instant::now();
            self.tick(started);
            self.log_status(started);

            if let Some(rest) = tick_interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        info!(published = self.triggers_published, "monitor stopped");
    }
}
