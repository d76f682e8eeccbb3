//! Inbound trigger handling

use lightpoint_core::{
    PendingReset, ResetDecision, ResetSchedule, StateMessage, TriggerConfig, TriggerEvent,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns inbound state messages into delayed baseline resets.
///
/// Never touches a camera. Its only effect outside itself is arming the
/// shared [ResetSchedule].
pub struct TriggerSignalListener {
    config: TriggerConfig,
    schedule: Arc<ResetSchedule>,
    last_state: Option<Vec<i64>>,
}

impl TriggerSignalListener {
    pub fn new(config: TriggerConfig, schedule: Arc<ResetSchedule>) -> Self {
        Self {
            config,
            schedule,
            last_state: None,
        }
    }

    /// State vector of the most recent well-formed message.
    pub fn last_state(&self) -> Option<&[i64]> {
        self.last_state.as_deref()
    }

    /// Decode and handle a raw payload. Malformed payloads are logged and
    /// dropped without affecting the previous state.
    pub fn handle_payload(&mut self, payload: &[u8], now: Instant) -> Option<PendingReset> {
        match StateMessage::parse(payload) {
            Ok(message) => self.handle_message(message, now),
            Err(e) => {
                warn!(error = %e, bytes = payload.len(), "dropping trigger message");
                None
            }
        }
    }

    /// Evaluate one message and arm the schedule if it qualifies.
    pub fn handle_message(&mut self, message: StateMessage, now: Instant) -> Option<PendingReset> {
        let event = TriggerEvent::new(message, self.last_state.as_deref(), self.config.sentinel_value);
        let decision = self.config.decide(&event);
        let sentinels = event.sentinel_count;
        self.last_state = Some(event.state_vector);

        match decision {
            ResetDecision::Schedule => {
                let (pending, replaced) = self.schedule.arm(now + self.config.reset_delay());
                info!(
                    sentinels,
                    delay_ms = self.config.reset_delay_ms,
                    generation = pending.generation,
                    replaced,
                    "baseline reset scheduled"
                );
                Some(pending)
            }
            ResetDecision::Skip(reason) => {
                debug!(sentinels, %reason, "trigger skipped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn listener() -> (TriggerSignalListener, Arc<ResetSchedule>) {
        let schedule = Arc::new(ResetSchedule::new());
        let listener = TriggerSignalListener::new(TriggerConfig::default(), schedule.clone());
        (listener, schedule)
    }

    #[test]
    fn test_schedules_after_delay() {
        let (mut listener, schedule) = listener();
        let now = Instant::now();
        let pending = listener.handle_payload(br#"{"state": [0, 1, 0]}"#, now);
        assert_eq!(pending.map(|p| p.due_at), Some(now + Duration::from_millis(300)));
        assert_eq!(schedule.pending(), pending);
        assert_eq!(listener.last_state(), Some(&[0, 1, 0][..]));
    }

    #[test]
    fn test_duplicate_is_not_an_update() {
        let (mut listener, schedule) = listener();
        let now = Instant::now();
        assert!(listener.handle_payload(br#"{"state": [1, 1]}"#, now).is_some());
        assert!(listener.handle_payload(br#"{"state": [1, 1]}"#, now).is_none());
        assert_eq!(schedule.generation(), 1);
    }

    #[test]
    fn test_malformed_keeps_previous_state() {
        let (mut listener, _) = listener();
        let now = Instant::now();
        listener.handle_payload(br#"{"state": [1]}"#, now);
        assert!(listener.handle_payload(b"{state", now).is_none());
        assert_eq!(listener.last_state(), Some(&[1][..]));
    }

    #[test]
    fn test_excluded_count_never_schedules() {
        let (mut listener, schedule) = listener();
        let all_on = StateMessage { state: vec![1; 144] };
        assert!(listener.handle_message(all_on, Instant::now()).is_none());
        assert!(schedule.pending().is_none());
        // Still recorded as the previous state.
        assert_eq!(listener.last_state().map(|s| s.len()), Some(144));
    }
}
