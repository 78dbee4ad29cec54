//! Per-transform execution channels.
//!
//! One in-order queue per pipeline stage plus a dedicated transfer queue.
//! Stages run concurrently because each sits on its own queue; the set is
//! created before a transform and closed right after it.

use crate::driver::Driver;
use crate::error::{FftFpgaError, Result};
use crate::pipeline::{ChannelId, CHANNEL_COUNT};
use crate::session::Session;

/// The six channels used by one transform.
pub struct QueueSet<D: Driver> {
    queues: [Option<D::Queue>; CHANNEL_COUNT],
}

impl<D: Driver> QueueSet<D> {
    /// Create all six queues on the session's device.
    ///
    /// If any creation fails, the queues already created are released.
    pub fn open(driver: &D, session: &Session<D>, profiling: bool) -> Result<Self> {
        let mut set = Self {
            queues: std::array::from_fn(|_| None),
        };

        for id in ChannelId::ALL {
            let queue = driver
                .create_queue(session.context(), session.device(), profiling)
                .map_err(|e| FftFpgaError::ChannelSetup {
                    channel: id,
                    reason: e.to_string(),
                })?;
            set.queues[id.index()] = Some(queue);
        }

        tracing::debug!(channels = CHANNEL_COUNT, profiling, "Opened channel set");
        Ok(set)
    }

    /// Queue for a channel.
    pub fn queue(&self, id: ChannelId) -> Result<&D::Queue> {
        self.queues[id.index()]
            .as_ref()
            .ok_or_else(|| FftFpgaError::ChannelSetup {
                channel: id,
                reason: "channel closed".to_string(),
            })
    }

    /// Number of open channels.
    pub fn open_count(&self) -> usize {
        self.queues.iter().filter(|q| q.is_some()).count()
    }

    /// Release every open queue. Safe to call more than once.
    pub fn close(&mut self) {
        let released = self.queues.iter_mut().filter_map(Option::take).count();
        if released > 0 {
            tracing::trace!(released, "Closed channel set");
        }
    }
}

impl<D: Driver> std::fmt::Debug for QueueSet<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSet")
            .field("open", &self.open_count())
            .finish()
    }
}

impl<D: Driver> Drop for QueueSet<D> {
    fn drop(&mut self) {
        self.close();
    }
}
