//! Tunnel controller scenario simulator CLI.
//!
//! Runs a plan and a scenario through the deterministic simulation and
//! prints the final per-tunnel state.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tunnelctl_simulator::{Simulator, SimulatorConfig};

#[derive(Parser)]
#[command(name = "tunnelctl-sim")]
#[command(about = "Deterministic tunnel failover simulator")]
#[command(version)]
struct Cli {
    /// Plan file (tunnels and candidate paths)
    #[arg(short, long)]
    config: PathBuf,

    /// Scenario file (timed steps and monitors)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Simulated end time (e.g., "30s", "5m"); defaults to shortly after the last step
    #[arg(short, long)]
    until: Option<humantime::Duration>,

    /// Seed for setup latency jitter; overrides the scenario's seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = SimulatorConfig::new(&cli.config, &cli.scenario);
    if let Some(until) = cli.until {
        config = config.with_until(until.into());
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let simulator = Simulator::from_config(&config).with_context(|| {
        format!(
            "loading {} and {}",
            cli.config.display(),
            cli.scenario.display()
        )
    })?;

    let report = simulator.run();
    println!("{report}");
    Ok(())
}
