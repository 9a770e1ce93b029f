//! Resize reconciliation
//!
//! Keeps exactly one live [`SwapBufferChain`] generation consistent with the
//! surface. Replacing a generation always follows the same sequence:
//!
//! 1. build the new generation, handing the old chain handle to the platform
//! 2. idle the device so no submitted work still references the old one
//! 3. drop the old generation (targets, views, chain)

use std::sync::Arc;

use crate::device::{Extent2D, PresentationDevice};
use crate::error::{PresentError, PresentResult};
use crate::swapchain::{ChainDesc, SwapBufferChain};

/// What [`SwapchainManager::reconcile`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The live generation already matches; nothing was touched
    Unchanged,
    /// A new generation replaced the old one
    Recreated,
}

/// Extent a chain should have for a window whose framebuffer is `window_extent`
pub fn resolve_extent<D: PresentationDevice>(device: &D, window_extent: Extent2D) -> PresentResult<Extent2D> {
    if window_extent.is_zero_area() {
        return Ok(window_extent);
    }

    let caps = device.surface_capabilities()?;
    Ok(caps
        .current_extent
        .unwrap_or_else(|| window_extent.clamp(caps.min_image_extent, caps.max_image_extent)))
}

/// Owns the live swap buffer chain generation
pub struct SwapchainManager<D: PresentationDevice> {
    live: SwapBufferChain<D>,
    device: Arc<D>,
    desc: ChainDesc<D>,
    next_generation: u64,
}

impl<D: PresentationDevice> SwapchainManager<D> {
    /// Create the startup generation at `extent`
    pub fn new(device: Arc<D>, desc: ChainDesc<D>, extent: Extent2D) -> PresentResult<Self> {
        log::debug!("Creating SwapchainManager at {}...", extent);
        let live = SwapBufferChain::create(&device, &desc, extent, None, 0)?;

        log::info!(
            "Swap buffer chain ready: {} images at {}",
            live.image_count(),
            live.extent()
        );
        Ok(Self {
            live,
            device,
            desc,
            next_generation: 1,
        })
    }

    /// The live generation
    pub fn live(&self) -> &SwapBufferChain<D> {
        &self.live
    }

    /// Extent the next generation should have for a window of `window_extent`
    ///
    /// A surface that reports its own current extent wins; otherwise the
    /// window's framebuffer size is clamped into the surface limits. A zero
    /// area window stays zero so callers can detect minimization.
    pub fn resolve_extent(&self, window_extent: Extent2D) -> PresentResult<Extent2D> {
        resolve_extent(self.device.as_ref(), window_extent)
    }

    /// Bring the live generation in line with `extent`
    ///
    /// Equal extents leave the generation untouched, handle included.
    pub fn reconcile(&mut self, extent: Extent2D) -> PresentResult<ReconcileOutcome> {
        if extent.is_zero_area() {
            return Err(PresentError::invalid(format!(
                "cannot reconcile the swap buffer chain to extent {extent}"
            )));
        }
        if extent == self.live.extent() {
            return Ok(ReconcileOutcome::Unchanged);
        }

        log::info!("Surface resized {} -> {}", self.live.extent(), extent);
        self.recreate(extent)?;
        Ok(ReconcileOutcome::Recreated)
    }

    /// Replace the live generation unconditionally
    ///
    /// Used when the platform reports the chain out of date even though the
    /// extent may not have changed.
    pub fn recreate(&mut self, extent: Extent2D) -> PresentResult<()> {
        let generation = self.next_generation;
        let next = SwapBufferChain::create(
            &self.device,
            &self.desc,
            extent,
            Some(self.live.handle()),
            generation,
        )?;
        self.next_generation += 1;

        // The old generation may still be referenced by in-flight work.
        if let Err(e) = self.device.wait_idle() {
            drop(next);
            return Err(e);
        }

        let old = std::mem::replace(&mut self.live, next);
        old.destroy();

        log::debug!(
            "Swap buffer chain generation {} live: {} images at {}",
            generation,
            self.live.image_count(),
            extent
        );
        Ok(())
    }
}
