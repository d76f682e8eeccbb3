//! JSON configuration for the monitor binary

use anyhow::{Context, Result, bail};
use lightpoint_core::{CameraId, ChangePolicy, TriggerConfig};
use lightpoint_cv::{CaptureSettings, ClassifierConfig, TemplateConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::ChangeRule;

/// Everything the binary needs, loaded from one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub capture: CaptureSettings,
    pub template: TemplateConfig,
    pub classifier: ClassifierConfig,
    pub trigger: TriggerConfig,
    pub monitor: MonitorConfig,
    pub cameras: Vec<CameraConfig>,
}

impl AppConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cameras.is_empty() {
            bail!("no cameras configured");
        }
        let mut seen = HashSet::new();
        for camera in &self.cameras {
            if !seen.insert(camera.camera_id) {
                bail!("camera id {} configured twice", camera.camera_id);
            }
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            bail!("capture resolution must be non-zero");
        }
        if !(0.0..1.0).contains(&self.classifier.match_ratio) {
            bail!("classifier match_ratio must be in [0, 1)");
        }
        Ok(())
    }
}

/// MQTT broker connection and topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Without a broker, triggers are only logged and no resets arrive.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub subscribe_topic: String,
    pub publish_topic: String,
    pub keep_alive_secs: u64,
    pub reconnect_delay_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 1883,
            client_id: "lightpoint".to_string(),
            subscribe_topic: "changeState".to_string(),
            publish_topic: "receiver".to_string(),
            keep_alive_secs: 5,
            reconnect_delay_ms: 1000,
        }
    }
}

impl BrokerConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Controller loop timing and the change rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub tick_interval_ms: u64,
    /// Default per-camera scan interval.
    pub scan_interval_ms: u64,
    pub decrease_threshold: u32,
    pub change_policy: ChangePolicy,
    pub settle_period_ms: u64,
    pub status_log_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            scan_interval_ms: 300,
            decrease_threshold: 1,
            change_policy: ChangePolicy::Decrease,
            settle_period_ms: 2000,
            status_log_interval_secs: 10,
        }
    }
}

impl MonitorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn settle_period(&self) -> Duration {
        Duration::from_millis(self.settle_period_ms)
    }

    pub fn status_log_interval(&self) -> Duration {
        Duration::from_secs(self.status_log_interval_secs)
    }

    pub fn change_rule(&self) -> ChangeRule {
        ChangeRule {
            threshold: self.decrease_threshold,
            policy: self.change_policy,
            settle_period: self.settle_period(),
        }
    }
}

/// Where a camera's frames come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// Local capture device index.
    Device(i32),
    /// Still images, cycled.
    Images(Vec<PathBuf>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub camera_id: CameraId,
    pub source: SourceConfig,
    pub mask_path: PathBuf,
    /// Overrides [MonitorConfig::scan_interval_ms].
    #[serde(default)]
    pub scan_interval_ms: Option<u64>,
}

impl CameraConfig {
    pub fn scan_interval(&self, monitor: &MonitorConfig) -> Duration {
        Duration::from_millis(self.scan_interval_ms.unwrap_or(monitor.scan_interval_ms))
    }
}
