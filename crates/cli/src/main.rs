// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `bm` - board manager CLI

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use commands::{board, defaults, start};

#[derive(Parser)]
#[command(name = "bm", version, about = "Moderation daemon for federated imageboards")]
struct Cli {
    /// Configuration directory (default: ~/.config/bm)
    #[arg(long, global = true, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the supervisor until signalled
    Start,
    /// Manage supervised boards
    Board(board::BoardArgs),
    /// Manage global worker defaults
    Defaults(defaults::DefaultsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli).await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };

    match cli.command {
        Command::Start => start::start(config_dir).await,
        Command::Board(args) => board::board(args, &config_dir).await,
        Command::Defaults(args) => defaults::defaults(args, &config_dir).await,
    }
}

fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("bm"))
        .ok_or_else(|| anyhow!("could not determine a config directory; pass --config-dir"))
}
