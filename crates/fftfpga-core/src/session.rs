//! Accelerator session: platform, device and execution context.

use crate::config::EngineConfig;
use crate::driver::Driver;
use crate::error::{FftFpgaError, Result};

/// Live connection to one accelerator device.
///
/// The context is declared first so it is dropped before the device and
/// platform handles it was created from.
pub struct Session<D: Driver> {
    context: D::Context,
    device: D::Device,
    #[allow(dead_code)]
    platform: D::Platform,
    platform_name: String,
    device_name: String,
    device_index: usize,
}

impl<D: Driver> Session<D> {
    /// Discover the vendor platform, pick the configured device and create a
    /// context on it.
    ///
    /// The first platform whose name contains `config.vendor` wins. Platforms
    /// whose name cannot be queried are skipped.
    pub fn open(driver: &D, config: &EngineConfig) -> Result<Self> {
        let platforms = driver
            .platforms()
            .map_err(|e| FftFpgaError::Initialization(format!("platform query: {}", e)))?;

        tracing::debug!(
            backend = driver.name(),
            count = platforms.len(),
            vendor = %config.vendor,
            "Enumerated platforms"
        );

        let mut selected = None;
        for platform in platforms {
            match driver.platform_name(&platform) {
                Ok(name) if name.contains(&config.vendor) => {
                    selected = Some((platform, name));
                    break;
                }
                Ok(name) => tracing::trace!(platform = %name, "Skipping platform"),
                Err(e) => tracing::warn!(error = %e, "Cannot query platform name"),
            }
        }

        let (platform, platform_name) = selected.ok_or_else(|| {
            FftFpgaError::Initialization(format!(
                "no platform matching vendor '{}'",
                config.vendor
            ))
        })?;

        let devices = driver.devices(&platform).map_err(|e| {
            FftFpgaError::Initialization(format!("device query on '{}': {}", platform_name, e))
        })?;
        let available = devices.len();
        let device = devices
            .into_iter()
            .nth(config.device_index)
            .ok_or_else(|| {
                FftFpgaError::Initialization(format!(
                    "platform '{}' has {} device(s), index {} requested",
                    platform_name, available, config.device_index
                ))
            })?;

        let device_name = driver
            .device_name(&device)
            .unwrap_or_else(|_| format!("device {}", config.device_index));

        let context = driver
            .create_context(&device)
            .map_err(|e| FftFpgaError::Initialization(format!("context creation: {}", e)))?;

        tracing::info!(
            platform = %platform_name,
            device = %device_name,
            "Accelerator session opened"
        );

        Ok(Self {
            context,
            device,
            platform,
            platform_name,
            device_name,
            device_index: config.device_index,
        })
    }

    /// Execution context.
    pub fn context(&self) -> &D::Context {
        &self.context
    }

    /// Selected device.
    pub fn device(&self) -> &D::Device {
        &self.device
    }

    /// Name of the selected platform.
    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }

    /// Name of the selected device.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Index of the selected device within its platform.
    pub fn device_index(&self) -> usize {
        self.device_index
    }
}

impl<D: Driver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("platform", &self.platform_name)
            .field("device", &self.device_name)
            .field("device_index", &self.device_index)
            .finish()
    }
}
