//! Inbound trigger messages and the baseline reset policy

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Wire form of an inbound state message: `{"state": [int, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    pub state: Vec<i64>,
}

impl StateMessage {
    /// Decode a UTF-8 JSON payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| Error::MalformedTriggerMessage(e.to_string()))
    }
}

/// A decoded message together with what it means relative to the previous
/// one on the same channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub received_at: DateTime<Utc>,
    pub state_vector: Vec<i64>,
    /// True iff `state_vector` differs from the previously received one. The
    /// first message ever seen is always an update.
    pub is_content_update: bool,
    /// Occurrences of the configured sentinel value in `state_vector`.
    pub sentinel_count: usize,
}

impl TriggerEvent {
    pub fn new(message: StateMessage, previous: Option<&[i64]>, sentinel_value: i64) -> Self {
        let is_content_update = previous.is_none_or(|prev| prev != message.state.as_slice());
        let sentinel_count = message.state.iter().filter(|&&v| v == sentinel_value).count();
        Self {
            received_at: Utc::now(),
            state_vector: message.state,
            is_content_update,
            sentinel_count,
        }
    }
}

/// Reset policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Value counted in the state vector.
    pub sentinel_value: i64,
    /// Sentinel count treated as noise (e.g. an all-on calibration frame).
    pub exclusion_count: Option<usize>,
    /// Skip messages that repeat the previous state vector.
    pub require_content_update: bool,
    /// Settle time between the trigger and the baseline capture.
    pub reset_delay_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            sentinel_value: 1,
            exclusion_count: Some(144),
            require_content_update: true,
            reset_delay_ms: 300,
        }
    }
}

/// Why a trigger event did not schedule a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ExcludedCount,
    NoSentinels,
    NotAnUpdate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::ExcludedCount => "sentinel count matches exclusion value",
            SkipReason::NoSentinels => "no sentinel values",
            SkipReason::NotAnUpdate => "state unchanged since previous message",
        };
        f.write_str(text)
    }
}

/// Outcome of evaluating a [TriggerEvent] against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    Schedule,
    Skip(SkipReason),
}

impl TriggerConfig {
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    /// Evaluate the reset rules in order; the first matching rule wins.
    pub fn decide(&self, event: &TriggerEvent) -> ResetDecision {
        if self.exclusion_count == Some(event.sentinel_count) {
            return ResetDecision::Skip(SkipReason::ExcludedCount);
        }
        if event.sentinel_count == 0 {
            return ResetDecision::Skip(SkipReason::NoSentinels);
        }
        if self.require_content_update && !event.is_content_update {
            return ResetDecision::Skip(SkipReason::NotAnUpdate);
        }
        ResetDecision::Schedule
    }
}
