//! CQS Command-Line Interface
//!
//! Solves circulant linear systems `C·x = b` described in YAML problem
//! files, sweeping the truncation threshold and recording every solve.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{backends, cond, solve, version};
use cqs_cli::config::Overrides;

/// CQS - circulant linear systems by classical combination of quantum states
#[derive(Parser)]
#[command(name = "cqs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep truncation thresholds for a problem file
    Solve {
        /// Problem file (YAML)
        #[arg(short, long)]
        problem: String,

        /// Largest truncation threshold (overrides the file)
        #[arg(short, long)]
        threshold: Option<u32>,

        /// Overlap access: exact, sampled, sparse or a backend name
        #[arg(short, long, env = "CQS_ACCESS")]
        access: Option<String>,

        /// Shots per estimate
        #[arg(short, long)]
        shots: Option<u32>,

        /// RNG seed for sampled mode and the simulator
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for provenance records
        #[arg(short, long, env = "CQS_RECORD_DIR")]
        output: Option<PathBuf>,

        /// Do not write provenance records
        #[arg(long)]
        no_record: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Report κ(C) and the smallest sufficient threshold for heat-transfer models
    Cond {
        /// Heat-transfer parameters ξ
        #[arg(long, value_delimiter = ',', required = true)]
        xi: Vec<f64>,

        /// Register width of b = |0…0⟩
        #[arg(short, long, default_value = "5")]
        qubits: u32,

        /// Loss the threshold must reach
        #[arg(long, default_value = "1e-6")]
        tolerance: f64,

        /// Largest threshold tried
        #[arg(long, default_value = "16")]
        max_threshold: u32,

        /// Overlap access: exact, sampled, sparse or a backend name
        #[arg(short, long, default_value = "exact")]
        access: String,

        /// Shots per estimate
        #[arg(short, long, default_value = "1000")]
        shots: u32,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List overlap access modes and backends
    Backends,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Solve {
            problem,
            threshold,
            access,
            shots,
            seed,
            output,
            no_record,
            format,
        } => {
            let overrides = Overrides {
                threshold,
                access,
                shots,
                seed,
                output_dir: output,
                no_record,
            };
            solve::execute(&problem, overrides, &format).await
        }

        Commands::Cond {
            xi,
            qubits,
            tolerance,
            max_threshold,
            access,
            shots,
            seed,
            format,
        } => {
            cond::execute(
                &xi,
                qubits,
                tolerance,
                max_threshold,
                &access,
                shots,
                seed,
                &format,
            )
            .await
        }

        Commands::Backends => backends::execute().await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
