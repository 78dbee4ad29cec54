//! Teardown of device resources.

use crate::driver::Driver;
use crate::loader::LoadedConfiguration;
use crate::session::Session;

/// Releases configurations and sessions, tolerating absent state.
pub struct LifecycleManager;

impl LifecycleManager {
    /// Release kernel units, program and device buffers, if any are loaded.
    ///
    /// Returns whether anything was released.
    pub fn release_configuration<D: Driver>(slot: &mut Option<LoadedConfiguration<D>>) -> bool {
        match slot.take() {
            Some(config) => {
                tracing::debug!(shape = %config.shape(), "Tearing down configuration");
                config.release();
                true
            }
            None => false,
        }
    }

    /// Release the execution context, if a session is live.
    ///
    /// Returns whether anything was released.
    pub fn release_session<D: Driver>(slot: &mut Option<Session<D>>) -> bool {
        match slot.take() {
            Some(session) => {
                tracing::info!(
                    platform = session.platform_name(),
                    device = session.device_name(),
                    "Closing accelerator session"
                );
                drop(session);
                true
            }
            None => false,
        }
    }
}
