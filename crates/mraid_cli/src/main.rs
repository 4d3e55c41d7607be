//! MRAID CLI
//!
//! Replay controller scripts against the headless host, build recurrence
//! rules, and generate ad request URLs.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mraid_adurl::{AdUrlGenerator, ConnectivityType, DeviceSignals, Location, Telephony};
use mraid_core::{RecordingSink, RecurrenceRequest};
use mraid_display::{
    ControlLoop, ControllerConfig, HeadlessHost, PictureDownloader, SharedHost,
};
use mraid_platform::{DeviceOrientation, NullMediaIndex};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod script;

use script::{Script, Step};

#[derive(Parser)]
#[command(name = "mraid")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MRAID display controller tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script against a headless host and print the ad events
    Replay {
        /// JSON replay script
        script: PathBuf,

        /// Controller configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build a calendar recurrence rule
    Rrule {
        /// daily, weekly or monthly
        #[arg(short, long)]
        frequency: Option<String>,

        /// Repeat every N periods
        #[arg(short, long)]
        interval: Option<String>,

        /// Comma separated week days (0 = Sunday)
        #[arg(long)]
        days_in_week: Option<String>,

        /// Comma separated month days (-31..=31, no 0)
        #[arg(long)]
        days_in_month: Option<String>,
    },

    /// Generate an ad request URL
    AdUrl {
        /// Ad server host
        #[arg(long, default_value = "ads.mopub.com")]
        host: String,

        /// Ad unit id
        #[arg(long)]
        ad_unit_id: Option<String>,

        /// Publisher keywords
        #[arg(short, long)]
        keywords: Option<String>,

        /// Location as LAT,LON
        #[arg(long, value_parser = parse_lat_lon, allow_hyphen_values = true)]
        location: Option<(f64, f64)>,

        /// Location accuracy in meters
        #[arg(long, default_value = "0")]
        accuracy: f32,

        #[arg(long)]
        udid: Option<String>,

        #[arg(long, value_enum, default_value = "undefined")]
        orientation: OrientationArg,

        #[arg(long, default_value = "1.0")]
        density: f32,

        /// Active connection
        #[arg(long, value_enum, default_value = "none")]
        network: NetworkArg,

        /// MCC+MNC of the registered network
        #[arg(long)]
        operator: Option<String>,

        /// Network country code
        #[arg(long)]
        iso: Option<String>,

        /// Carrier name
        #[arg(long)]
        carrier: Option<String>,

        #[arg(long)]
        app_version: Option<String>,

        /// UTC offset as +hhmm (local offset by default)
        #[arg(long, allow_hyphen_values = true)]
        timezone: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
    Square,
    Undefined,
}

impl From<OrientationArg> for DeviceOrientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::Portrait => DeviceOrientation::Portrait,
            OrientationArg::Landscape => DeviceOrientation::Landscape,
            OrientationArg::Square => DeviceOrientation::Square,
            OrientationArg::Undefined => DeviceOrientation::Undefined,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum NetworkArg {
    None,
    Wifi,
    Ethernet,
    Mobile,
}

impl NetworkArg {
    fn connectivity(self) -> Option<ConnectivityType> {
        match self {
            NetworkArg::None => None,
            NetworkArg::Wifi => Some(ConnectivityType::Wifi),
            NetworkArg::Ethernet => Some(ConnectivityType::Ethernet),
            NetworkArg::Mobile => Some(ConnectivityType::Mobile),
        }
    }
}

fn parse_lat_lon(value: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{value}'"))?;
    let lat = lat.trim().parse().map_err(|_| format!("invalid latitude '{lat}'"))?;
    let lon = lon.trim().parse().map_err(|_| format!("invalid longitude '{lon}'"))?;
    Ok((lat, lon))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Replay { script, config } => cmd_replay(&script, config.as_deref()),

        Commands::Rrule {
            frequency,
            interval,
            days_in_week,
            days_in_month,
        } => cmd_rrule(RecurrenceRequest {
            frequency,
            interval,
            days_in_week,
            days_in_month,
        }),

        Commands::AdUrl {
            host,
            ad_unit_id,
            keywords,
            location,
            accuracy,
            udid,
            orientation,
            density,
            network,
            operator,
            iso,
            carrier,
            app_version,
            timezone,
        } => {
            let mut generator = AdUrlGenerator::new();
            if let Some(id) = ad_unit_id {
                generator = generator.with_ad_unit_id(id);
            }
            if let Some(keywords) = keywords {
                generator = generator.with_keywords(keywords);
            }
            if let Some((latitude, longitude)) = location {
                generator = generator.with_location(Location {
                    latitude,
                    longitude,
                    accuracy,
                });
            }
            let signals = DeviceSignals {
                udid,
                timezone,
                orientation: orientation.into(),
                density,
                telephony: Telephony {
                    network_operator: operator,
                    network_country_iso: iso,
                    network_operator_name: carrier,
                    ..Default::default()
                },
                connectivity: network.connectivity(),
                network_state_permission: true,
                app_version,
                ..Default::default()
            };
            cmd_ad_url(&generator, &host, &signals)
        }
    }
}

fn cmd_replay(script_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let script = Script::load(script_path)?;
    let config = match config_path {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };

    info!(
        "Replaying {} ({} steps)",
        script_path.display(),
        script.steps.len()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let local = tokio::task::LocalSet::new();
    let (log, host) = local.block_on(&runtime, replay(script, config))?;

    for event in log.events() {
        println!("{}", event.to_json());
    }

    let host = host.borrow();
    for notice in host.notices() {
        debug!(%notice, "Host notice");
    }
    for event in host.calendar_events() {
        debug!(title = %event.title, "Calendar event");
    }
    for video in host.videos() {
        debug!(%video, "Video played");
    }

    Ok(())
}

async fn replay(
    script: Script,
    config: ControllerConfig,
) -> Result<(RecordingSink, Rc<RefCell<HeadlessHost>>)> {
    let host = Rc::new(RefCell::new(HeadlessHost::new()));
    let surface = host
        .borrow_mut()
        .attach_ad_surface(script.surface.width, script.surface.height);
    let log = RecordingSink::new();
    let pictures = PictureDownloader::from_config(&config, Arc::new(NullMediaIndex))?;

    let shared: SharedHost = host.clone();
    let destroys = script.ends_with_destroy();
    let (control, handle) =
        ControlLoop::new(config, shared, surface, Box::new(log.clone()), pictures);
    let task = tokio::task::spawn_local(control.run());

    for step in script.steps {
        let delivered = match step {
            Step::ContentReady => handle.content_ready(),
            Step::Command { name, params } => handle.raw_command(name, params),
            Step::ConfigurationChanged => handle.configuration_changed(),
            Step::AcceptPicture { uri } => handle.accept_picture(uri),
            Step::NativeClose => handle.native_close_tapped(),
            Step::Destroy => handle.destroy(),
            Step::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                true
            }
        };
        if !delivered {
            warn!("Controller already stopped; skipping remaining steps");
            break;
        }
    }

    if !destroys {
        handle.destroy();
    }

    let controller = task.await.context("Control loop failed")?;
    info!(state = %controller.view_state(), "Replay finished");

    Ok((log, host))
}

fn cmd_rrule(request: RecurrenceRequest) -> Result<()> {
    let rule = request.to_rule()?;
    println!("{rule}");
    Ok(())
}

fn cmd_ad_url(generator: &AdUrlGenerator, host: &str, signals: &DeviceSignals) -> Result<()> {
    let url = generator.generate_url(host, signals)?;
    println!("{url}");
    Ok(())
}
