//! `fftfpga images` command - Write emulator configuration images.

use std::path::Path;

use colored::Colorize;

use fftfpga::emu::install_images;
use fftfpga::SUPPORTED_SIZES;

use crate::error::CliResult;

use super::parse_precisions;

/// Execute the `images` command.
///
/// `out` is the directory images are resolved against, i.e. what would be
/// passed as `--image-root`; the files land two levels above it.
pub fn execute(out: &str, precision: &str) -> CliResult<usize> {
    let base = Path::new(out);
    let precisions = parse_precisions(precision)?;

    println!("{} Installing emulator images", "→".bright_cyan());
    println!("  {} Image root: {}", "•".dimmed(), out.bright_yellow());

    let mut written = 0;
    for precision in precisions {
        for path in install_images(base, precision, &SUPPORTED_SIZES)? {
            println!("  {} {}", "✓".green(), path.display());
            written += 1;
        }
    }

    println!("\n{} {} images written", "Done:".green().bold(), written);
    Ok(written)
}
