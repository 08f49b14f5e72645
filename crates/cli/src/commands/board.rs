// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bm board` - manage supervised boards

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use bm_config::{
    delete_board_config, load_config, save_board_config, update_board_config, BoardConfig,
};

use super::{parse_resets, TunableFlags};

#[derive(Args)]
pub struct BoardArgs {
    #[command(subcommand)]
    pub command: BoardCommand,
}

#[derive(Subcommand)]
pub enum BoardCommand {
    /// Declare a board for supervision
    Add {
        /// Board address (public-key hash or human-readable name)
        address: String,

        #[command(flatten)]
        tunables: TunableFlags,
    },
    /// Remove a board from supervision
    Remove {
        /// Board address
        address: String,
    },
    /// Edit a board's tunables
    Edit {
        /// Board address
        address: String,

        #[command(flatten)]
        tunables: TunableFlags,

        /// Comma-separated fields to reset (e.g. perPage,bumpLimit)
        #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
        reset: Vec<String>,
    },
    /// List supervised boards
    List,
}

pub async fn board(args: BoardArgs, config_dir: &Path) -> Result<()> {
    match args.command {
        BoardCommand::Add { address, tunables } => add(config_dir, address, &tunables),
        BoardCommand::Remove { address } => remove(config_dir, &address),
        BoardCommand::Edit {
            address,
            tunables,
            reset,
        } => edit(config_dir, &address, &tunables, &reset),
        BoardCommand::List => list(config_dir),
    }
}

fn add(config_dir: &Path, address: String, tunables: &TunableFlags) -> Result<()> {
    if address.is_empty() {
        bail!("address must not be empty");
    }
    let config = load_config(config_dir).context("loading config")?;
    if config.board(&address).is_some() {
        bail!("board \"{address}\" already exists");
    }

    let board = update_board_config(&BoardConfig::new(&address), &tunables.patch()?, &[])?;
    save_board_config(config_dir, &board)?;
    println!("Added board {address}");
    Ok(())
}

fn remove(config_dir: &Path, address: &str) -> Result<()> {
    delete_board_config(config_dir, address)?;
    println!("Removed board {address}");
    Ok(())
}

fn edit(config_dir: &Path, address: &str, tunables: &TunableFlags, reset: &[String]) -> Result<()> {
    let config = load_config(config_dir).context("loading config")?;
    let Some(board) = config.board(address) else {
        bail!("board \"{address}\" not found");
    };

    let updated = update_board_config(board, &tunables.patch()?, &parse_resets(reset)?)?;
    save_board_config(config_dir, &updated)?;
    println!("Updated board {address}");
    Ok(())
}

fn list(config_dir: &Path) -> Result<()> {
    let config = load_config(config_dir).context("loading config")?;
    if config.boards.is_empty() {
        println!("No boards configured");
        return Ok(());
    }

    let rows: Vec<[String; 5]> = config
        .boards
        .iter()
        .map(|board| {
            [
                board.address.clone(),
                column(board.per_page),
                column(board.pages),
                column(board.bump_limit),
                column(board.archive_purge_seconds),
            ]
        })
        .collect();

    let headers = ["ADDRESS", "PER-PAGE", "PAGES", "BUMP-LIMIT", "PURGE-SECS"];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    print_row(&headers.map(String::from), &widths);
    for row in &rows {
        print_row(row, &widths);
    }
    Ok(())
}

fn column(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_row(cells: &[String; 5], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", line.trim_end());
}
