//! fftfpga CLI - Image checks, emulator images and round-trip runs.
//!
//! # Commands
//!
//! - `fftfpga check <N>` - Report whether N³ is supported and where its images are expected
//! - `fftfpga images --out <dir>` - Write emulator images for every supported size
//! - `fftfpga run --size <N>` - Forward plus backward round trip on random data
//!
//! # Examples
//!
//! ```bash
//! # Install emulator images, then run against them
//! fftfpga images --out /tmp/fft/bin/release
//! fftfpga run --size 32 --iterations 10 --image-root /tmp/fft/bin/release
//!
//! # Check where a board build would look for its 64³ image
//! fftfpga check 64 --precision both
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::{check, images, run};

/// fftfpga CLI - 3-D FFT offload tooling
#[derive(Parser)]
#[command(name = "fftfpga")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether a size is supported and where its images are expected
    Check {
        /// Cubic edge length
        size: usize,

        /// Directory images are resolved against (default: executable directory)
        #[arg(short, long)]
        image_root: Option<String>,

        /// Precision to check (single, double, both)
        #[arg(short, long, default_value = "both")]
        precision: String,
    },

    /// Write emulator configuration images for every supported size
    Images {
        /// Image root the files are laid out under
        #[arg(short, long)]
        out: String,

        /// Precision to write (single, double, both)
        #[arg(short, long, default_value = "both")]
        precision: String,
    },

    /// Run forward plus backward transforms and check the round trip
    Run {
        /// Cubic edge length
        #[arg(short, long, default_value = "32")]
        size: usize,

        /// Number of round trips
        #[arg(short = 'n', long, default_value = "1")]
        iterations: u32,

        /// Backend (emu, opencl)
        #[arg(short, long, default_value = "emu")]
        backend: String,

        /// Directory images are resolved against
        #[arg(short, long)]
        image_root: Option<String>,

        /// Seed for the random input
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Check {
            size,
            image_root,
            precision,
        } => check::execute(size, image_root.as_deref(), &precision),

        Commands::Images { out, precision } => images::execute(&out, &precision).map(|_| true),

        Commands::Run {
            size,
            iterations,
            backend,
            image_root,
            seed,
        } => run::execute(size, iterations, &backend, image_root.as_deref(), seed).map(|_| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        // `check` found something missing; already reported.
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
