//! Lightpoint
//!
//! Baseline-triggered region change monitoring across several cameras. A
//! state message on the inbound topic schedules a fresh baseline; afterwards
//! every camera is scanned and a drop in lit regions fires the outbound
//! trigger.

pub mod config;
pub mod controller;
pub mod listener;
pub mod mqtt;
pub mod publisher;
pub mod session;

pub use config::{AppConfig, BrokerConfig, CameraConfig, MonitorConfig, SourceConfig};
pub use controller::{MonitorController, MonitorStatus};
pub use listener::TriggerSignalListener;
pub use mqtt::{MqttBridge, MqttPublisher};
pub use publisher::{LogPublisher, TriggerPublisher};
pub use session::{CameraSession, ChangeRule, SessionState, SessionStatus};
