//! Swap buffer chain generations
//!
//! A [`SwapBufferChain`] is one generation of presentable images together with
//! the image views and render targets built over them. Generations are never
//! patched in place: a resize builds a new one (see
//! [`crate::swapchain_manager`]) and drops the old one once the device is idle.
//!
//! Teardown order is targets, then views, then the chain handle. The struct's
//! field order encodes it, so the order also holds when creation fails half
//! way through and the partially built pieces unwind.

use std::sync::Arc;

use crate::device::{Extent2D, PresentMode, PresentationDevice, SurfaceCapabilities, SwapchainCreateInfo};
use crate::error::{PresentError, PresentResult};
use crate::framebuffer::RenderTarget;

/// Fewest images a chain may have (double buffering)
pub const MIN_IMAGE_COUNT: u32 = 2;

/// Image view wrapper with RAII cleanup
pub struct ImageView<D: PresentationDevice> {
    device: Arc<D>,
    view: D::ImageView,
    image: D::Image,
}

impl<D: PresentationDevice> ImageView<D> {
    /// Create a colour view over a presentable image
    pub fn new(device: Arc<D>, image: D::Image, format: D::Format) -> PresentResult<Self> {
        let view = device.create_image_view(image, format)?;
        Ok(Self { device, view, image })
    }

    /// Get the image view handle
    pub fn handle(&self) -> D::ImageView {
        self.view
    }

    /// The presentable image behind this view
    pub fn image(&self) -> D::Image {
        self.image
    }
}

impl<D: PresentationDevice> Drop for ImageView<D> {
    fn drop(&mut self) {
        self.device.destroy_image_view(self.view);
    }
}

/// Owns the platform chain handle; destroying it releases the images
struct ChainHandle<D: PresentationDevice> {
    device: Arc<D>,
    swapchain: D::Swapchain,
}

impl<D: PresentationDevice> Drop for ChainHandle<D> {
    fn drop(&mut self) {
        self.device.destroy_swapchain(self.swapchain);
    }
}

/// Everything about a chain that stays fixed across resizes
pub struct ChainDesc<D: PresentationDevice> {
    /// Queue family that renders and presents
    pub queue_family: u32,
    /// Surface format of the images
    pub format: D::Format,
    /// Render-pass layout every render target is built against
    pub render_pass: D::RenderPass,
    /// Presentation mode
    pub present_mode: PresentMode,
    /// Requested minimum number of images
    pub min_image_count: u32,
}

impl<D: PresentationDevice> Clone for ChainDesc<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: PresentationDevice> Copy for ChainDesc<D> {}

/// Number of images to ask the platform for
pub fn choose_image_count(requested: u32, caps: &SurfaceCapabilities) -> u32 {
    let count = requested.max(caps.min_image_count).max(MIN_IMAGE_COUNT);
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

/// One live generation of the swap buffer chain
pub struct SwapBufferChain<D: PresentationDevice> {
    // Field order is drop order: targets, views, then the chain handle.
    targets: Vec<RenderTarget<D>>,
    views: Vec<ImageView<D>>,
    chain: ChainHandle<D>,
    images: Vec<D::Image>,
    extent: Extent2D,
    generation: u64,
}

impl<D: PresentationDevice> SwapBufferChain<D> {
    /// Create a chain generation at `extent`
    ///
    /// `previous` is a hint letting the platform recycle resources of the chain
    /// being replaced; that chain is not destroyed here.
    pub fn create(
        device: &Arc<D>,
        desc: &ChainDesc<D>,
        extent: Extent2D,
        previous: Option<D::Swapchain>,
        generation: u64,
    ) -> PresentResult<Self> {
        if extent.is_zero_area() {
            return Err(PresentError::invalid(format!(
                "cannot create a swap buffer chain with extent {extent}"
            )));
        }

        let caps = device.surface_capabilities().map_err(unavailable)?;
        let image_count = choose_image_count(desc.min_image_count, &caps);

        let info = SwapchainCreateInfo {
            queue_family: desc.queue_family,
            format: desc.format,
            extent,
            image_count,
            present_mode: desc.present_mode,
            previous,
        };
        let chain = ChainHandle {
            device: Arc::clone(device),
            swapchain: device.create_swapchain(&info)?,
        };

        let images = device.swapchain_images(chain.swapchain)?;
        if images.len() < MIN_IMAGE_COUNT as usize {
            return Err(PresentError::PresentationUnavailable(format!(
                "platform returned {} presentable images, need at least {MIN_IMAGE_COUNT}",
                images.len()
            )));
        }

        let views = images
            .iter()
            .map(|&image| ImageView::new(Arc::clone(device), image, desc.format))
            .collect::<PresentResult<Vec<_>>>()?;

        let targets = views
            .iter()
            .map(|view| RenderTarget::new(Arc::clone(device), desc.render_pass, view.handle(), extent))
            .collect::<PresentResult<Vec<_>>>()?;

        log::debug!(
            "Swap buffer chain generation {} created: {} images at {}",
            generation,
            images.len(),
            extent
        );

        Ok(Self {
            targets,
            views,
            chain,
            images,
            extent,
            generation,
        })
    }

    /// Release targets, views and the chain handle, in that order
    ///
    /// The device must be idle: no submitted work may still reference the
    /// generation.
    pub fn destroy(self) {
        log::debug!("Destroying swap buffer chain generation {}", self.generation);
        drop(self);
    }

    /// Platform chain handle
    pub fn handle(&self) -> D::Swapchain {
        self.chain.swapchain
    }

    /// Extent of every image in this generation
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Number of presentable images
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Presentable images
    pub fn images(&self) -> &[D::Image] {
        &self.images
    }

    /// Image views, one per image
    pub fn views(&self) -> &[ImageView<D>] {
        &self.views
    }

    /// Render targets, one per image
    pub fn targets(&self) -> &[RenderTarget<D>] {
        &self.targets
    }

    /// Render target for an acquired image index
    pub fn target(&self, image_index: u32) -> PresentResult<&RenderTarget<D>> {
        self.targets.get(image_index as usize).ok_or_else(|| {
            PresentError::invalid(format!(
                "image index {image_index} out of range (count: {})",
                self.targets.len()
            ))
        })
    }

    /// Monotonic generation number, 0 for the startup chain
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn unavailable(error: PresentError) -> PresentError {
    match error {
        PresentError::PresentationUnavailable(_) => error,
        other => PresentError::PresentationUnavailable(format!("surface capabilities: {other}")),
    }
}
