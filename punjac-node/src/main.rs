//! PUNJAC Node - CLI charge point
//!
//! Runs one OCPP 1.6 charge point against a central system.
//!
//! # Usage
//!
//! ```bash
//! # Connect with defaults (SteVe on localhost)
//! punjac-node --station EK3-001
//!
//! # Specific central system and tag cadence
//! punjac-node --station EK3-001 \
//!     --csms-url ws://localhost:8180/steve/websocket/CentralSystemService \
//!     --tag FED4269 --tag-interval 5
//! ```
//!
//! The node simulates the parts a real station would provide in hardware:
//! the card reader (a fixed tag presented on a fixed cadence) and the energy
//! meter (advances while a transaction is open). Each presented tag toggles
//! the charging session once the central system authorizes it.

use std::time::Duration;

use clap::Parser;
use punjac_cp::{ChargePoint, ChargePointConfig, FixedDelayTagSource, WsChannel};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Simulated charge rate for the meter task (Wh per second)
const CHARGE_RATE_WH_PER_SEC: i32 = 11;

/// PUNJAC OCPP 1.6 charge point node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OCPP station ID
    #[arg(short, long, default_value = "EK3-001")]
    station: String,

    /// Central system WebSocket URL
    #[arg(long, default_value = "ws://localhost:8180/steve/websocket/CentralSystemService")]
    csms_url: String,

    /// Vendor name
    #[arg(long, default_value = "Elektrokombinacija")]
    vendor: String,

    /// Model name
    #[arg(long, default_value = "EK3-CP")]
    model: String,

    /// Charge box serial number
    #[arg(long)]
    box_serial: Option<String>,

    /// Charge point serial number
    #[arg(long)]
    point_serial: Option<String>,

    /// Firmware version reported at boot
    #[arg(long, default_value = "0.1.0")]
    firmware: String,

    /// Heartbeat interval in seconds (until the central system assigns one)
    #[arg(long, default_value = "10")]
    heartbeat_interval: u64,

    /// Identity tag presented by the simulated card reader
    #[arg(long, default_value = "FED4269")]
    tag: String,

    /// Seconds between simulated tag presentations
    #[arg(long, default_value = "5")]
    tag_interval: u64,

    /// Only the tag that started a transaction may stop it
    #[arg(long)]
    matching_tag: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Print banner
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              PUNJAC Node - OCPP 1.6 Charge Point             ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Station:   {:<49} ║", args.station);
    println!("║  CSMS URL:  {:<49} ║", truncate(&args.csms_url, 49));
    println!("║  Tag:       {:<49} ║", args.tag);
    println!("║  Heartbeat: {:<49} ║", format!("{}s", args.heartbeat_interval));
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    // Build configuration
    let mut config = ChargePointConfig::new(&args.station, &args.csms_url)
        .with_vendor(&args.vendor, &args.model)
        .with_firmware(&args.firmware)
        .with_heartbeat_interval(Duration::from_secs(args.heartbeat_interval));

    if let (Some(box_serial), Some(point_serial)) = (&args.box_serial, &args.point_serial) {
        config = config.with_serials(box_serial, point_serial);
    }

    if args.matching_tag {
        config = config.with_matching_tag_required();
    }

    info!("Connecting to central system: {}", config.csms_url);

    let channel =
        WsChannel::connect(&config.csms_url, &config.station_id, config.request_timeout).await?;
    let charge_point = ChargePoint::new(config, channel);

    // Simulated energy meter: advances while a transaction is open
    let session = charge_point.session();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            let mut session = session.write().await;
            if session.charging() {
                session.add_energy(CHARGE_RATE_WH_PER_SEC);
            }
        }
    });

    // Simulated card reader driving the session state machine
    let tags = FixedDelayTagSource::new(&args.tag, Duration::from_secs(args.tag_interval));

    charge_point.run(tags).await?;

    Ok(())
}

/// Truncate string with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
