//! Emulator configuration and fault injection.

use std::time::Duration;

/// Platform name reported by the emulator.
pub const EMULATOR_PLATFORM: &str = "Intel(R) FPGA Emulation Platform for OpenCL(TM)";

/// Device name reported by the emulator.
pub const EMULATOR_DEVICE: &str = "Intel(R) FPGA Emulation Device";

/// Failures to inject into driver primitives.
///
/// Kernel-scoped faults name the kernel (`"fetch"`, `"fft3da"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Report only an unrelated platform.
    pub missing_platform: bool,
    /// Fail context creation.
    pub fail_context: bool,
    /// Fail program build.
    pub fail_build: bool,
    /// Fail every buffer allocation.
    pub fail_allocation: bool,
    /// Fail queue creation.
    pub fail_queue_creation: bool,
    /// Fail enqueueing this kernel.
    pub fail_enqueue: Option<String>,
    /// Fail draining the queue this kernel last ran on.
    pub fail_finish: Option<String>,
    /// Fail host-to-device copies.
    pub fail_write: bool,
    /// Fail device-to-host copies.
    pub fail_read: bool,
}

impl FaultPlan {
    /// No faults.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any fault is armed.
    pub fn is_armed(&self) -> bool {
        *self != Self::default()
    }
}

/// Emulated device configuration.
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Name of the single emulated platform.
    pub platform_name: String,
    /// Number of devices on the platform.
    pub device_count: usize,
    /// How long a stage waits on an empty pipe before giving up.
    pub stage_timeout: Duration,
    /// Initial fault plan.
    pub faults: FaultPlan,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            platform_name: EMULATOR_PLATFORM.to_string(),
            device_count: 1,
            stage_timeout: Duration::from_secs(30),
            faults: FaultPlan::none(),
        }
    }
}

impl EmulatorConfig {
    /// Set the platform name.
    #[must_use]
    pub fn with_platform_name(mut self, name: impl Into<String>) -> Self {
        self.platform_name = name.into();
        self
    }

    /// Set the device count.
    #[must_use]
    pub fn with_device_count(mut self, count: usize) -> Self {
        self.device_count = count;
        self
    }

    /// Set the pipe stall timeout.
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Set the initial fault plan.
    #[must_use]
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_vendor() {
        let config = EmulatorConfig::default();
        assert!(config.platform_name.contains(fftfpga_core::config::DEFAULT_VENDOR));
        assert_eq!(config.device_count, 1);
        assert!(!config.faults.is_armed());
    }

    #[test]
    fn test_fault_plan_armed() {
        let plan = FaultPlan {
            fail_finish: Some("fft3db".into()),
            ..FaultPlan::none()
        };
        assert!(plan.is_armed());
    }
}
