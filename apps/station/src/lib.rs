//! # ScanStock Station
//!
//! Terminal front end an operator uses at a scanning point.
//!
//! ## Startup Sequence
//! 1. Parse the command line
//! 2. Load `station.toml`, then environment overrides, then flags
//! 3. Validate the result
//! 4. Connect to the gateway and run the chosen command
//!
//! ## Layout
//! - [`commands`] - One function per subcommand
//! - [`console`] - Prompts and the manual-entry barcode feed
//! - [`error`] - Operator-facing error type
//! - [`render`] - Plain-text output

pub mod commands;
pub mod console;
pub mod error;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scanstock_client::{StationConfig, DEFAULT_RECENT_LIMIT};
use scanstock_core::TransactionKind;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::debug;

use commands::{lookup, report, stock, Station};
use console::Console;
use error::StationResult;

// =============================================================================
// Command Line
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "scanstock-station",
    version,
    about = "Barcode-driven stock movements from the terminal"
)]
pub struct Cli {
    /// Config file (default: platform config dir, station.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Gateway URL, overrides the config file and environment
    #[arg(long, global = true)]
    pub gateway: Option<String>,

    /// Operator name stamped on transactions
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look items up without recording anything
    Check,

    /// Receive stock (unknown barcodes become new items)
    StockIn,

    /// Withdraw stock
    StockOut,

    /// Record damaged stock
    Defect,

    /// List every item
    Items,

    /// Show recent transactions, newest first
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },

    /// Show the last committed transaction
    Last,

    /// Item totals, today's stock-in count and the best-stocked items
    Summary,
}

impl Cli {
    /// Loads the config and layers the flags on top.
    pub fn station_config(&self) -> StationResult<StationConfig> {
        let mut config = StationConfig::load(self.config.clone())?;

        if let Some(url) = &self.gateway {
            config.gateway.url = url.clone();
        }
        if let Some(user) = &self.user {
            config.operator.user = user.clone();
        }

        config.validate()?;
        debug!(gateway = %config.gateway.url, user = config.user(), "Station configured");
        Ok(config)
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs one command to completion.
pub async fn run<R, W>(
    command: &Command,
    station: &Station,
    console: &mut Console<R, W>,
) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Check => lookup::check(station, console).await,
        Command::StockIn => stock::run(station, TransactionKind::In, console)
            .await
            .map(|_| ()),
        Command::StockOut => stock::run(station, TransactionKind::Out, console)
            .await
            .map(|_| ()),
        Command::Defect => stock::run(station, TransactionKind::Defect, console)
            .await
            .map(|_| ()),
        Command::Items => report::items(station, console).await,
        Command::Recent { limit } => report::recent(station, *limit, console).await,
        Command::Last => report::last(station, console).await,
        Command::Summary => {
            report::summary(station, chrono::Utc::now().date_naive(), console).await
        }
    }
}
