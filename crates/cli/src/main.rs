// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! spindle: thin CLI client for `spindled` (spec.md §6.4, §6.5,
//! SPEC_FULL.md §11).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use output::OutputFormat;

mod exit {
    pub const SUCCESS: i32 = 0;
    pub const GENERIC_FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

#[derive(Parser)]
#[command(name = "spindle", version, about = "Control spindled, the disc-ripping pipeline daemon")]
struct Cli {
    /// Path to the daemon config file (defaults to $SPINDLE_CONFIG, then
    /// /etc/spindle/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start spindled in the background
    Start,
    /// Stop a running spindled
    Stop,
    /// Show queue/worker/dependency status
    Status,
    /// Move failed items back to pending
    Retry {
        /// Item ids to retry
        ids: Vec<u64>,
    },
    /// Stop specific items (in-flight ones are cancelled cooperatively)
    StopItem {
        /// Item ids to stop
        ids: Vec<u64>,
    },
    /// Drop completed items from the queue
    ClearCompleted,
    /// Drop failed items from the queue
    ClearFailed,
    /// Reclaim items stuck in an in-flight status with no heartbeat
    ResetStuck,
    /// Manually enqueue work
    #[command(subcommand)]
    Add(AddCommand),
    /// Print a diagnostic report over the queue store (reads the store
    /// directly, works even when spindled isn't running)
    Audit,
}

#[derive(Subcommand)]
enum AddCommand {
    /// Trigger an immediate disc-detection cycle for the disc in the drive
    Disc,
    /// Enqueue a file already present on disk
    File { path: PathBuf },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = commands::config_path(cli.config);

    let layout = match commands::layout_for(&config_path) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(exit::CONFIG_ERROR);
        }
    };

    let result = match cli.command {
        Commands::Start => commands::daemon::start(&config_path, &layout, cli.output).await,
        Commands::Stop => commands::daemon::stop(&layout, cli.output).await,
        Commands::Status => commands::status::run(&layout, cli.output).await,
        Commands::Retry { ids } => commands::queue::retry(&layout, ids, cli.output).await,
        Commands::StopItem { ids } => commands::queue::stop_item(&layout, ids, cli.output).await,
        Commands::ClearCompleted => commands::queue::clear_completed(&layout, cli.output).await,
        Commands::ClearFailed => commands::queue::clear_failed(&layout, cli.output).await,
        Commands::ResetStuck => commands::queue::reset_stuck(&layout, cli.output).await,
        Commands::Add(AddCommand::Disc) => commands::add::disc(&layout, cli.output).await,
        Commands::Add(AddCommand::File { path }) => commands::add::file(&layout, path, cli.output).await,
        Commands::Audit => commands::audit::run(&layout, cli.output).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(exit::GENERIC_FAILURE);
    }

    std::process::exit(exit::SUCCESS);
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
