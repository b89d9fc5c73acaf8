// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

mod app;
mod config;
mod logic;
mod models;
mod mvu;
mod ui;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "mealform")]
#[command(about = "Compose meals from an ingredient catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./mealform.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ingredient catalog JSON file
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory for saved meals
    #[arg(long)]
    meals_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config =
        AppConfig::load(cli.config.as_deref())?.with_overrides(cli.catalog, cli.meals_dir);
    app::run(config)
}
