//! # effecthubd: effecthub daemon
//!
//! Composition root that wires the effect delivery core to its drivers.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise `tracing` with the configured filter
//! - Construct the device directory, dispatch gateway, effect router and
//!   timeline scheduler
//! - Register simulated devices and bind them to the simulated driver
//! - Optionally load and play a timeline file
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod playback;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use effecthub_adapter_simulated::SimulatedDriver;
use effecthub_app::directory::DeviceDirectory;
use effecthub_app::gateway::DispatchGateway;
use effecthub_app::ports::PlaybackObserver;
use effecthub_app::router::EffectRouter;
use effecthub_app::scheduler::TimelineScheduler;

use config::Config;
use playback::{LoggingObserver, read_timeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Directory
    let directory = Arc::new(DeviceDirectory::new(config.directory.event_capacity));
    directory.set_isolation(config.directory.isolation);
    spawn_directory_logger(&directory);

    // Drivers
    let driver = Arc::new(SimulatedDriver::new());
    let gateway = Arc::new(DispatchGateway::new());
    for device in config.simulated_devices() {
        let record = device.to_record()?;
        driver.attach(record.id.clone());
        gateway.bind(record.id.clone(), Arc::clone(&driver));
        directory.register(record, &device.protocol);
    }
    tracing::info!(
        devices = directory.stats(None).count,
        isolation = directory.is_isolation_enabled(),
        "device directory ready"
    );

    // Core
    let router = EffectRouter::new(directory, gateway, config.translation.clone());
    let scheduler = TimelineScheduler::new(router, config.tick());

    let Some(path) = config.playback.timeline.as_deref() else {
        tracing::info!("no timeline configured, waiting for Ctrl-C");
        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
        return Ok(());
    };

    let observer = Arc::new(LoggingObserver::default());
    scheduler.add_observer(Arc::clone(&observer) as Arc<dyn PlaybackObserver>);
    scheduler.load(read_timeline(path)?, config.playback.protocol.as_deref())?;
    scheduler.start()?;
    tracing::info!(timeline = path, "playing timeline");

    tokio::select! {
        () = observer.finished() => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("interrupted, stopping playback");
            scheduler.stop()?;
        }
    }

    tracing::info!("shutting down");
    Ok(())
}

/// Log directory mutations until the directory is dropped.
fn spawn_directory_logger(directory: &DeviceDirectory) {
    let mut events = directory.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(
                    device_id = %event.record.id,
                    kind = ?event.kind,
                    "directory event"
                ),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "directory event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
