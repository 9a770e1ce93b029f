//! Synchronization primitives for GPU/CPU coordination
//!
//! RAII wrappers for binary semaphores and fences, plus [`SyncPair`], the two
//! signals that order one frame:
//!
//! ```text
//! acquire ──signals──▶ acquire_signal ──waited by──▶ submit
//! submit  ──signals──▶ release_signal ──waited by──▶ present
//! ```
//!
//! A binary semaphore must be waited on exactly once per signal before it is
//! signalled again. With one frame in flight and an idle wait at the end of
//! every frame this holds trivially. Pipelined pacing gives each in-flight slot
//! its own acquire signal and throttles slot reuse with a [`Fence`]. The
//! release signal stays held by presentation until its image comes back from
//! acquire, so pipelined frames signal one [`Semaphore`] per chain image.

use std::sync::Arc;

use crate::device::PresentationDevice;
use crate::error::PresentResult;

/// GPU-GPU synchronization primitive with automatic resource management
pub struct Semaphore<D: PresentationDevice> {
    device: Arc<D>,
    semaphore: D::Semaphore,
}

impl<D: PresentationDevice> Semaphore<D> {
    /// Create a new unsignalled semaphore
    pub fn new(device: Arc<D>) -> PresentResult<Self> {
        let semaphore = device.create_semaphore()?;
        Ok(Self { device, semaphore })
    }

    /// Get the semaphore handle
    pub fn handle(&self) -> D::Semaphore {
        self.semaphore
    }
}

impl<D: PresentationDevice> Drop for Semaphore<D> {
    fn drop(&mut self) {
        self.device.destroy_semaphore(self.semaphore);
    }
}

/// Fence wrapper with RAII cleanup
pub struct Fence<D: PresentationDevice> {
    device: Arc<D>,
    fence: D::Fence,
}

impl<D: PresentationDevice> Fence<D> {
    /// Create a new fence
    pub fn new(device: Arc<D>, signaled: bool) -> PresentResult<Self> {
        let fence = device.create_fence(signaled)?;
        Ok(Self { device, fence })
    }

    /// Wait for fence
    pub fn wait(&self, timeout: u64) -> PresentResult<()> {
        self.device.wait_for_fence(self.fence, timeout)
    }

    /// Reset fence
    pub fn reset(&self) -> PresentResult<()> {
        self.device.reset_fence(self.fence)
    }

    /// Get the fence handle
    pub fn handle(&self) -> D::Fence {
        self.fence
    }
}

impl<D: PresentationDevice> Drop for Fence<D> {
    fn drop(&mut self) {
        self.device.destroy_fence(self.fence);
    }
}

/// The acquire/release signal pair ordering one frame
pub struct SyncPair<D: PresentationDevice> {
    acquire_signal: Semaphore<D>,
    release_signal: Semaphore<D>,
}

impl<D: PresentationDevice> SyncPair<D> {
    /// Create both signals
    pub fn new(device: &Arc<D>) -> PresentResult<Self> {
        let acquire_signal = Semaphore::new(Arc::clone(device))?;
        let release_signal = Semaphore::new(Arc::clone(device))?;

        Ok(Self {
            acquire_signal,
            release_signal,
        })
    }

    /// Signalled by image acquisition, waited on by the queue submission
    pub fn acquire_signal(&self) -> D::Semaphore {
        self.acquire_signal.handle()
    }

    /// Signalled by the queue submission, waited on by presentation
    pub fn release_signal(&self) -> D::Semaphore {
        self.release_signal.handle()
    }
}
