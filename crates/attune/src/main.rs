// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attune - multimodal therapeutic session engine.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use attune_config::AttuneConfig;

/// Attune - multimodal therapeutic session engine.
#[derive(Parser, Debug)]
#[command(name = "attune", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the effective configuration as TOML.
    Config,
    /// Run a burnout check-in and a conversation turn against simulated providers.
    Simulate(simulate::SimulateArgs),
}

fn load_config(path: Option<&PathBuf>) -> AttuneConfig {
    let loaded = match path {
        Some(path) => attune_config::load_and_validate_path(path),
        None => attune_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            attune_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("attune={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.agent.log_level);
    attune_core::recording::register_metrics();

    match cli.command {
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("attune: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Simulate(args)) => {
            if let Err(e) = simulate::run(config, args).await {
                eprintln!("attune: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("attune: use --help for available commands");
        }
    }
}
