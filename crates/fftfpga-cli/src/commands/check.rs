//! `fftfpga check` command - Report whether a size is supported and where
//! its configuration images are expected.

use colored::Colorize;

use fftfpga::{ImageLocator, ProblemShape, TemplateLocator, SUPPORTED_SIZES};

use crate::error::CliResult;

use super::{image_base, parse_precisions};

/// Execute the `check` command. Returns whether every requested image was
/// found.
pub fn execute(size: usize, image_root: Option<&str>, precision: &str) -> CliResult<bool> {
    let shape = ProblemShape::cubic(size);
    let precisions = parse_precisions(precision)?;

    println!("{} Checking {}", "→".bright_cyan(), shape.to_string().bright_white());

    if !shape.is_supported() {
        let sizes: Vec<String> = SUPPORTED_SIZES.iter().map(|n| format!("{}³", n)).collect();
        println!(
            "  {} not supported (images exist for {})",
            "✗".red(),
            sizes.join(", ")
        );
        return Ok(false);
    }
    println!("  {} supported", "✓".green());

    let locator = TemplateLocator::new(image_base(image_root));
    let mut all_found = true;
    for precision in precisions {
        let candidate = locator.candidate(shape, precision)?;
        match locator.locate(shape, precision) {
            Ok(path) => println!(
                "  {} {:<6} {}",
                "✓".green(),
                precision.as_str(),
                path.display().to_string().bright_yellow()
            ),
            Err(e) => {
                tracing::debug!(error = %e, "Image lookup failed");
                all_found = false;
                println!(
                    "  {} {:<6} {} {}",
                    "✗".red(),
                    precision.as_str(),
                    candidate.display().to_string().dimmed(),
                    "(missing)".red()
                );
            }
        }
    }

    Ok(all_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fftfpga::emu::install_images;
    use fftfpga::Precision;
    use tempfile::TempDir;

    #[test]
    fn test_unsupported_size() {
        assert!(!execute(8, None, "single").unwrap());
    }

    #[test]
    fn test_finds_installed_image() {
        let root = TempDir::new().unwrap();
        let base = root.path().join("bin").join("release");
        install_images(&base, Precision::Single, &[32]).unwrap();
        let base = base.to_str().unwrap();

        assert!(execute(32, Some(base), "single").unwrap());
        assert!(!execute(32, Some(base), "both").unwrap());
        assert!(!execute(16, Some(base), "single").unwrap());
    }
}
