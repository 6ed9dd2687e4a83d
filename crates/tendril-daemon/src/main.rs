//! Tendril Daemon - Main entry point
//!
//! Reads temperature devices on the w1 bus and pushes measurements to an
//! MQTT broker, with Home Assistant auto-discovery.

mod config;
mod mqtt;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tendril_core::parse_record;
use tendril_poll::Poller;
use tendril_w1::{SysfsBus, W1Bus};
use tokio::sync::watch;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "tendril")]
#[command(about = "Bridge w1 temperature sensors to an MQTT broker")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tendril.toml")]
    config: PathBuf,

    /// Base directory of the w1 sysfs bus
    #[arg(long, default_value = tendril_w1::sysfs::DEFAULT_BASE_DIR)]
    bus_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print configured devices at startup
    #[arg(long)]
    print_devices: bool,

    /// Run a single bus scan and exit
    #[arg(long)]
    scan_once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Tendril v{}", env!("CARGO_PKG_VERSION"));

    let bus = SysfsBus::new(&args.bus_dir);

    if args.scan_once {
        // Single scan mode, no broker connection
        let devices = bus.enumerate();
        println!("Found {} devices:", devices.len());
        for device in devices {
            match bus.read_raw(&device) {
                Ok(lines) => match parse_record(&lines) {
                    Ok(Some(celsius)) => println!("  - {}  {:.3} C", device.id, celsius),
                    Ok(None) => println!("  - {}  (no valid measurement)", device.id),
                    Err(e) => println!("  - {}  ({})", device.id, e),
                },
                Err(e) => println!("  - {}  (read failed: {})", device.id, e),
            }
        }
        return Ok(());
    }

    // Load configuration
    let config = config::load_config(&args.config)?;
    info!(
        broker = %config.mqtt.broker,
        devices = config.devices.len(),
        period_secs = config.period,
        "Configuration loaded"
    );

    if args.print_devices {
        println!("Configured devices:");
        for (id, spec) in &config.devices {
            println!(
                "  - {}  name={}  state_topic={}",
                id,
                spec.name.as_deref().unwrap_or("-"),
                spec.state_topic.as_deref().unwrap_or("-"),
            );
        }
    }

    // Connect to the broker; failure here is fatal
    let (client, _drive_task) = mqtt::MqttClient::connect(&config.mqtt).await?;

    // Signal-driven shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let mut poller = Poller::new(
        config.to_poll_settings(),
        config.devices.clone(),
        bus,
        client.clone(),
    );
    poller.run(shutdown_rx).await;

    // Tidy up the broker connection
    client.disconnect().await;

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_signal() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
