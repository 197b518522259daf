//! Simulated modem command-line front end
//!
//! Brings up the simulated platform adapters from a JSON configuration tree
//! and prints what a modem services layer would see.

mod report;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use pa_simu::{ConfigStore, PlatformSimulator};
use pa_types::{PinType, PukType, SimAdapter};
use report::StatusReport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[clap(name = "modem-simu", version, about = "Simulated modem platform adapters")]
struct Args {
    /// JSON configuration tree to load
    #[clap(long)]
    config: Option<PathBuf>,

    /// PIN code to enter after start-up
    #[clap(long)]
    pin: Option<String>,

    /// PUK code to unblock the SIM with
    #[clap(long, requires = "new_pin")]
    puk: Option<String>,

    /// PIN to set when unblocking with --puk
    #[clap(long)]
    new_pin: Option<String>,

    /// Print the report as JSON
    #[clap(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modem_simu=info,pa_simu=info,pa_types=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigStore::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => ConfigStore::new(),
    };

    let mut platform =
        PlatformSimulator::init(config).context("Failed to initialize platform simulator")?;
    tracing::info!("Simulated modem started");

    if let Some(puk) = &args.puk {
        let Some(new_pin) = &args.new_pin else {
            bail!("--puk needs --new-pin");
        };
        match platform.sim_mut().enter_puk(PukType::Puk, puk, new_pin) {
            Ok(()) => tracing::info!("SIM unblocked"),
            Err(e) => tracing::warn!("PUK entry failed: {}", e),
        }
    }

    if let Some(pin) = &args.pin {
        match platform.sim_mut().enter_pin(PinType::Pin, pin) {
            Ok(()) => tracing::info!("PIN accepted"),
            Err(e) => tracing::warn!("PIN entry failed: {}", e),
        }
    }

    let report = StatusReport::collect(&platform);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}
