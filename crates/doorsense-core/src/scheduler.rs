//! Coalescing of broadcast requests.
//!
//! Producers (edge handlers, the battery sampler) call
//! [`BroadcastScheduler::request_broadcast`] after writing their field. The
//! request is a single flag, not a queue: any number of requests made before
//! the deferred worker runs collapse into one broadcast, and that broadcast
//! sends the payload as it is when the worker runs.
//!
//! ```text
//! Idle --request--> Pending --worker takes it--> Idle
//! ```
//!
//! The flag is cleared when the worker takes the request, before it reads
//! the payload, so a request made while a broadcast is running always causes
//! exactly one more broadcast.

use core::future::poll_fn;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use core::task::Poll;

use embassy_sync::waitqueue::AtomicWaker;
use log::{debug, error, info};

use crate::advertisement;
use crate::error::BroadcastError;
use crate::payload::PayloadEncoder;
use crate::platform::Radio;

/// Counters for observing the scheduler from logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    /// Calls to `request_broadcast`, including coalesced ones.
    pub requested: u32,
    /// Broadcasts handed to the radio.
    pub executed: u32,
    /// Broadcasts the radio (or framing) rejected.
    pub failed: u32,
}

pub struct BroadcastScheduler {
    pending: AtomicBool,
    waker: AtomicWaker,
    requested: AtomicU32,
    executed: AtomicU32,
    failed: AtomicU32,
}

impl BroadcastScheduler {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            waker: AtomicWaker::new(),
            requested: AtomicU32::new(0),
            executed: AtomicU32::new(0),
            failed: AtomicU32::new(0),
        }
    }

    /// Ask for the current payload to be broadcast.
    ///
    /// Never blocks; safe to call from interrupt context. Does nothing beyond
    /// counting if a request is already pending.
    pub fn request_broadcast(&self) {
        self.requested.fetch_add(1, Ordering::Relaxed);
        // Release pairs with the acquire in `take_pending`, so field writes
        // made before this call are visible to the broadcast.
        self.pending.store(true, Ordering::Release);
        self.waker.wake();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Take the pending request, if any.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Wait until a request is pending, then take it.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            self.waker.register(cx.waker());
            if self.take_pending() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Send the current payload to the radio as a full data replacement.
    ///
    /// Failures are logged and counted, never retried here.
    pub async fn broadcast<R: Radio>(
        &self,
        encoder: &PayloadEncoder,
        radio: &mut R,
        name: &str,
    ) -> Result<(), BroadcastError> {
        info!("Updating BLE advertising data");

        let payload = encoder.snapshot();
        debug!("Service data: {:?}", payload);
        encoder.take_dirty();

        let adv_data = advertisement::build(name, payload.as_bytes()).map_err(|e| {
            error!("Failed to frame advertising data: {}", e);
            self.failed.fetch_add(1, Ordering::Relaxed);
            BroadcastError::from(e)
        })?;

        self.executed.fetch_add(1, Ordering::Relaxed);
        radio.replace_advertising_data(&adv_data).await.map_err(|e| {
            error!("Failed to update advertising data: {:?}", e);
            self.failed.fetch_add(1, Ordering::Relaxed);
            BroadcastError::Radio
        })
    }

    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            requested: self.requested.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for BroadcastScheduler {
    fn default() -> Self {
        Self::new()
    }
}
