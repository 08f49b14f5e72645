// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bm defaults` - manage the global worker defaults

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use bm_config::{load_config, save_global_config, update_defaults};

use super::{parse_resets, TunableFlags};

#[derive(Args)]
pub struct DefaultsArgs {
    #[command(subcommand)]
    pub command: DefaultsCommand,
}

#[derive(Subcommand)]
pub enum DefaultsCommand {
    /// Set or reset default tunables shared by all boards
    Set {
        #[command(flatten)]
        tunables: TunableFlags,

        /// Comma-separated fields to reset (e.g. perPage,bumpLimit)
        #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
        reset: Vec<String>,
    },
}

pub async fn defaults(args: DefaultsArgs, config_dir: &Path) -> Result<()> {
    match args.command {
        DefaultsCommand::Set { tunables, reset } => set(config_dir, &tunables, &reset),
    }
}

fn set(config_dir: &Path, tunables: &TunableFlags, reset: &[String]) -> Result<()> {
    let config = load_config(config_dir).context("loading config")?;
    let updated = update_defaults(&config.global, &tunables.patch()?, &parse_resets(reset)?)?;
    save_global_config(config_dir, &updated)?;
    println!("Updated defaults");
    Ok(())
}
