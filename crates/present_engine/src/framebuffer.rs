//! Render target management
//!
//! A render target binds one swap chain image view to the render-pass layout
//! at a fixed extent. It becomes invalid as soon as the surface extent moves
//! away from that size, which is what triggers chain recreation.

use std::sync::Arc;

use crate::device::{Extent2D, PresentationDevice};
use crate::error::PresentResult;

/// Framebuffer wrapper with RAII cleanup
pub struct RenderTarget<D: PresentationDevice> {
    device: Arc<D>,
    framebuffer: D::Framebuffer,
    view: D::ImageView,
    extent: Extent2D,
}

impl<D: PresentationDevice> RenderTarget<D> {
    /// Create a new render target over `view`
    pub fn new(
        device: Arc<D>,
        render_pass: D::RenderPass,
        view: D::ImageView,
        extent: Extent2D,
    ) -> PresentResult<Self> {
        let framebuffer = device.create_framebuffer(render_pass, view, extent)?;

        Ok(Self {
            device,
            framebuffer,
            view,
            extent,
        })
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> D::Framebuffer {
        self.framebuffer
    }

    /// The image view this target renders into
    pub fn view(&self) -> D::ImageView {
        self.view
    }

    /// Fixed extent the target was created with
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Whether the target still matches a surface of the given extent
    pub fn matches(&self, extent: Extent2D) -> bool {
        self.extent == extent
    }
}

impl<D: PresentationDevice> Drop for RenderTarget<D> {
    fn drop(&mut self) {
        self.device.destroy_framebuffer(self.framebuffer);
    }
}
