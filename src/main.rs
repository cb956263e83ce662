use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use sx1278_rx::radio::hal::SpidevOpener;
use sx1278_rx::{init_logger, CancelToken, CsvLog, Listener, ReceiverConfig, Sx1278Driver};
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "sx1278-rx")]
#[command(version, about = "LoRa receiver for SX1278 modules on Linux spidev")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// spidev device node
    #[arg(short, long)]
    device: Option<String>,

    /// Carrier frequency in Hz
    #[arg(long)]
    frequency: Option<u64>,

    /// Spreading factor (6-12)
    #[arg(long)]
    sf: Option<u8>,

    /// Bandwidth in Hz
    #[arg(long)]
    bandwidth: Option<u32>,

    /// Coding rate denominator (5-8)
    #[arg(long)]
    coding_rate: Option<u8>,

    /// Enable the payload CRC check
    #[arg(long)]
    crc: bool,

    /// CSV log path, tried before the configured ones
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Console output only
    #[arg(long)]
    no_log: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Receive packets until interrupted (default)
    Listen,
    /// Only search the SPI configuration and print it
    Detect,
}

fn build_config(cli: &Cli) -> Result<ReceiverConfig> {
    let mut config = match &cli.config {
        Some(path) => ReceiverConfig::load_from_file(path)
            .with_context(|| format!("Cannot load configuration {}", path.display()))?,
        None => ReceiverConfig::default(),
    };

    if let Some(device) = &cli.device {
        config.device = device.clone();
    }
    if let Some(frequency) = cli.frequency {
        config.radio.frequency_hz = frequency;
    }
    if let Some(sf) = cli.sf {
        config.radio.spreading_factor = sf;
    }
    if let Some(bandwidth) = cli.bandwidth {
        config.radio.bandwidth_hz = bandwidth;
    }
    if let Some(coding_rate) = cli.coding_rate {
        config.radio.coding_rate = coding_rate;
    }
    if cli.crc {
        config.radio.crc_enabled = true;
    }
    if let Some(path) = &cli.log_file {
        config.log_paths.insert(0, path.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn shutdown_signal() -> std::io::Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    info!("LoRa receiver (SX1278) on {}", config.device);

    let mut opener = SpidevOpener::new(&config.device)
        .with_context(|| format!("Cannot use {}", config.device))?;

    if let Some(Commands::Detect) = cli.command {
        let driver = Sx1278Driver::open(&mut opener, &config.probe_plan(), config.timing)
            .context("Could not detect the LoRa chip")?;
        println!("SPI mode:     {}", u8::from(driver.bus_config().mode));
        println!("SPI speed:    {} Hz", driver.bus_config().speed_hz);
        println!("Chip version: 0x{:02X}", driver.chip_version());
        return Ok(());
    }

    let cancel = CancelToken::new();
    let listener = Listener::start(&mut opener, &config, cancel.clone())
        .context("Could not start the LoRa receiver")?;

    let log = if cli.no_log {
        None
    } else {
        CsvLog::open_first(&config.log_paths)
    };
    let mut listener = listener.with_log(log);

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                info!("Exiting...");
                signal_cancel.cancel();
            }
            Err(e) => error!("Cannot listen for shutdown signals: {}", e),
        }
    });

    let stats = tokio::task::spawn_blocking(move || listener.run())
        .await
        .context("Receive loop aborted")?;

    info!("{} receive cycles", stats.cycles);
    Ok(())
}
