//! # ScanStock Station Entry Point
//!
//! Single-threaded: one operator, one terminal, one request at a time.

use clap::Parser;
use tokio::io::{stdin, stdout, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scanstock_station::commands::Station;
use scanstock_station::console::Console;
use scanstock_station::{run, Cli};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with prompts on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,scanstock=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.station_config()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let station = Station::from_config(&config)?;
        let mut console = Console::new(BufReader::new(stdin()), stdout());

        info!(command = ?cli.command, gateway = %config.gateway.url, "Station starting");
        if let Err(e) = run(&cli.command, &station, &mut console).await {
            error!(error = %e, "Command failed");
            return Err(anyhow::Error::from(e));
        }
        Ok::<(), anyhow::Error>(())
    })
}
