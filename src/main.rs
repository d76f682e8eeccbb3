use anyhow::{Context, Result};
use clap::Parser;
use lightpoint::{
    AppConfig, CameraConfig, CameraSession, LogPublisher, MonitorController, MqttBridge,
    SourceConfig, TriggerPublisher, TriggerSignalListener,
};
use lightpoint_core::{MonitoredRegion, ResetSchedule};
use lightpoint_cv::{FrameSource, RegionClassifier, RegionTemplateExtractor, StillImageSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Multi-camera region change monitor")]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Load configuration and masks, print region counts and exit.
    #[arg(long)]
    check: bool,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };
    let console_layer = fmt::layer().with_ansi(!cfg!(windows)).with_target(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(filter)
        .try_init()
        .context("installing log subscriber")?;
    Ok(())
}

fn frame_source(source: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    match source {
        SourceConfig::Images(paths) => Ok(Box::new(StillImageSource::from_paths(paths.clone()))),
        #[cfg(feature = "opencv")]
        SourceConfig::Device(index) => Ok(Box::new(lightpoint_cv::OpenCvCamera::new(*index))),
        #[cfg(not(feature = "opencv"))]
        SourceConfig::Device(index) => {
            anyhow::bail!("device {index} requested but built without the `opencv` feature")
        }
    }
}

fn load_regions(
    extractor: &RegionTemplateExtractor,
    camera: &CameraConfig,
    config: &AppConfig,
) -> Result<Arc<[MonitoredRegion]>> {
    let regions = extractor
        .extract_from_file(&camera.mask_path, config.capture.width, config.capture.height)
        .with_context(|| {
            format!(
                "camera {}: extracting regions from {}",
                camera.camera_id,
                camera.mask_path.display()
            )
        })?;
    Ok(regions.into())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = AppConfig::from_json_file(&cli.config)?;
    let extractor = RegionTemplateExtractor::new(config.template.clone());

    // Template errors are fatal; nothing is opened before every mask loads.
    let mut templates = Vec::with_capacity(config.cameras.len());
    for camera in &config.cameras {
        let regions = load_regions(&extractor, camera, &config)?;
        info!(camera_id = camera.camera_id, regions = regions.len(), "template loaded");
        templates.push((camera, regions));
    }

    if cli.check {
        for (camera, regions) in &templates {
            println!("camera {}: {} regions", camera.camera_id, regions.len());
        }
        return Ok(());
    }

    let classifier = Arc::new(RegionClassifier::new(config.classifier.clone()));
    let mut sessions = Vec::with_capacity(templates.len());
    for (camera, regions) in templates {
        let source = match frame_source(&camera.source) {
            Ok(source) => source,
            Err(e) => {
                error!(camera_id = camera.camera_id, error = %e, "camera excluded");
                continue;
            }
        };
        sessions.push(CameraSession::new(
            camera.camera_id,
            source,
            regions,
            classifier.clone(),
            config.capture.clone(),
            camera.scan_interval(&config.monitor),
        ));
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            info!("got Ctrl-C, shutting down");
            running.store(false, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;
    }

    let schedule = Arc::new(ResetSchedule::new());
    let listener = TriggerSignalListener::new(config.trigger.clone(), schedule.clone());
    let (bridge, publisher): (Option<MqttBridge>, Box<dyn TriggerPublisher>) = if config.broker.enabled {
        let (bridge, publisher) = MqttBridge::start(&config.broker, listener, running.clone())?;
        (Some(bridge), Box::new(publisher))
    } else {
        info!("broker disabled, triggers are only logged");
        (None, Box::new(LogPublisher))
    };

    let mut controller = MonitorController::new(sessions, schedule, publisher, config.monitor.clone());
    // Unavailable cameras are left out; an empty active set keeps running.
    if controller.open_all() == 0 {
        warn!(configured = config.cameras.len(), "no camera could be opened, monitoring nothing");
    }

    controller.run(&running);

    // Sessions release their devices on drop.
    drop(controller);
    if let Some(bridge) = bridge {
        bridge.shutdown();
    }
    Ok(())
}
