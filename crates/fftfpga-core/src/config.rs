//! Engine configuration.

use std::path::PathBuf;

/// Platform name fragment identifying the accelerator vendor runtime.
pub const DEFAULT_VENDOR: &str = "Intel(R) FPGA";

/// Environment variable overriding the image base directory.
pub const IMAGE_DIR_ENV: &str = "FFTFPGA_IMAGE_DIR";

/// Environment variable overriding the vendor identifier.
pub const VENDOR_ENV: &str = "FFTFPGA_VENDOR";

/// Directory the image path templates are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageBase {
    /// Directory containing the running executable, looked up on every
    /// resolution.
    #[default]
    ExecutableDir,
    /// Fixed directory.
    Directory(PathBuf),
}

/// Configuration for the FFT engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Substring matched against platform names during discovery.
    pub vendor: String,
    /// Index into the platform's device list.
    pub device_index: usize,
    /// Base directory for configuration images.
    pub image_base: ImageBase,
    /// Whether channels record per-operation timing.
    pub profiling: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vendor: DEFAULT_VENDOR.to_string(),
            device_index: 0,
            image_base: ImageBase::ExecutableDir,
            profiling: true,
        }
    }
}

impl EngineConfig {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Defaults with environment overrides applied.
    ///
    /// `FFTFPGA_IMAGE_DIR` replaces the executable directory as image base,
    /// `FFTFPGA_VENDOR` replaces the vendor identifier.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Empty values are ignored.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty(IMAGE_DIR_ENV) {
            self.image_base = ImageBase::Directory(PathBuf::from(dir));
        }
        if let Some(vendor) = non_empty(VENDOR_ENV) {
            self.vendor = vendor;
        }
        self
    }
}

/// Builder for EngineConfig.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Creates a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the vendor identifier.
    #[must_use]
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.config.vendor = vendor.into();
        self
    }

    /// Sets the device index.
    #[must_use]
    pub fn with_device_index(mut self, index: usize) -> Self {
        self.config.device_index = index;
        self
    }

    /// Resolves images against a fixed directory.
    #[must_use]
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_base = ImageBase::Directory(dir.into());
        self
    }

    /// Resolves images against the executable's directory.
    #[must_use]
    pub fn with_executable_dir(mut self) -> Self {
        self.config.image_base = ImageBase::ExecutableDir;
        self
    }

    /// Enables or disables channel profiling.
    #[must_use]
    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.config.profiling = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.vendor, "Intel(R) FPGA");
        assert_eq!(config.device_index, 0);
        assert_eq!(config.image_base, ImageBase::ExecutableDir);
        assert!(config.profiling);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .with_vendor("Emulated FPGA")
            .with_device_index(1)
            .with_image_dir("/opt/bitstreams")
            .with_profiling(false)
            .build();

        assert_eq!(config.vendor, "Emulated FPGA");
        assert_eq!(config.device_index, 1);
        assert_eq!(
            config.image_base,
            ImageBase::Directory(PathBuf::from("/opt/bitstreams"))
        );
        assert!(!config.profiling);

        let config = EngineConfigBuilder::new()
            .with_image_dir("/tmp")
            .with_executable_dir()
            .build();
        assert_eq!(config.image_base, ImageBase::ExecutableDir);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::default().with_overrides(|key| match key {
            IMAGE_DIR_ENV => Some("/srv/fpga/bin".to_string()),
            VENDOR_ENV => Some("Xilinx".to_string()),
            _ => None,
        });
        assert_eq!(
            config.image_base,
            ImageBase::Directory(PathBuf::from("/srv/fpga/bin"))
        );
        assert_eq!(config.vendor, "Xilinx");
    }

    #[test]
    fn test_empty_overrides_ignored() {
        let config = EngineConfig::default().with_overrides(|_| Some("  ".to_string()));
        assert_eq!(config, EngineConfig::default());
    }
}
