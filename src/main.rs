//! Adimate CLI
//!
//! Runs the automation agent against one device until interrupted.

use adimate::{
    agent::{Agent, AgentStateMachine},
    capture::FrameCapture,
    config::FileConfig,
    detection::{load_template, AdDetector},
    device::{AdbDevice, DeviceActuator},
    metrics::MetricsRegistry,
    scheduler::CycleScheduler,
    transport::TransportChannel,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Dismisses in-app ad overlays on an Android device over ADB.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device serial, overriding the configuration file.
    #[arg(short, long, env = "ADIMATE_SERIAL")]
    serial: Option<String>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    info!("Adimate v{}", adimate::VERSION);

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if cli.serial.is_some() {
        config.device.serial = cli.serial;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    let serial = config.device.serial.clone().unwrap_or_default();

    let template = match load_template(&config.detection.template_path) {
        Ok(template) => template,
        Err(e) => {
            eprintln!("Failed to load template: {}", e);
            std::process::exit(1);
        }
    };

    let metrics = match MetricsRegistry::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize components
    let channel = TransportChannel::new(config.transport.clone(), serial.as_str());
    let device = Arc::new(AdbDevice::new(channel.clone()));
    let agent = Agent::new(
        Box::new(FrameCapture::new(channel, &config.capture)),
        AdDetector::new(template, &config.detection),
        AgentStateMachine::new(&config.agent),
        device.clone(),
    )
    .with_metrics(Arc::clone(&metrics));

    info!(
        serial = %serial,
        package = %config.agent.target_package,
        "Launching target app"
    );
    if let Err(e) = device.app_start(&config.agent.target_package, &config.agent.main_activity) {
        warn!("Initial launch failed, the first cycle will retry: {}", e);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed)) {
            warn!("Failed to install interrupt handler: {}", e);
        }
    }

    let runtime = match config.scheduler.build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    #[cfg(feature = "metrics")]
    {
        if config.metrics.enabled {
            match adimate::metrics::MetricsServer::new(&config.metrics, Arc::clone(&metrics)) {
                Ok(server) => {
                    runtime.spawn(async move {
                        if let Err(e) = server.run().await {
                            warn!("Metrics server stopped: {}", e);
                        }
                    });
                }
                Err(e) => warn!("Metrics server disabled: {}", e),
            }
        }
    }
    #[cfg(not(feature = "metrics"))]
    {
        if config.metrics.enabled {
            warn!("Metrics endpoint requested but the `metrics` feature is not compiled in");
        }
    }

    let scheduler = CycleScheduler::new(&config.scheduler).with_metrics(metrics);
    let stats = runtime.block_on(scheduler.run(Arc::new(agent), shutdown));

    info!(
        "Done. {} cycles submitted, {} failed, {} ticks skipped",
        stats.submitted, stats.failed, stats.skipped
    );
}
