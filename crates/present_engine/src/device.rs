//! Device layer consumed by the presentation engine
//!
//! [`PresentationDevice`] is the seam between the engine and the graphics API.
//! The engine never creates the logical device itself; it receives an
//! implementation that already owns a device, one queue and the surface
//! capability queries of the physical device. The Vulkan implementation lives in
//! [`crate::vulkan`]; tests drive the engine through a recording mock.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::PresentResult;

/// Width and height of a surface or image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent2D {
    /// Create an extent
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (minimized window)
    pub const fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clamp each dimension into `[min, max]`
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self {
            width: self.width.clamp(min.width, max.width.max(min.width)),
            height: self.height.clamp(min.height, max.height.max(min.height)),
        }
    }
}

impl std::fmt::Display for Extent2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Surface limits reported by the physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    /// Extent the surface currently has; `None` when the window decides
    pub current_extent: Option<Extent2D>,
    /// Smallest supported image extent
    pub min_image_extent: Extent2D,
    /// Largest supported image extent
    pub max_image_extent: Extent2D,
    /// Minimum number of images the platform requires
    pub min_image_count: u32,
    /// Maximum number of images, 0 means unbounded
    pub max_image_count: u32,
}

/// Presentation mode of the swap buffer chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentMode {
    /// Vsync queue, always supported
    #[default]
    Fifo,
    /// Vsync queue that tears when late
    FifoRelaxed,
    /// Replace the pending image, no tearing
    Mailbox,
    /// No vsync
    Immediate,
}

/// Clear colour as linear RGBA
pub type ClearColor = [f32; 4];

/// Parameters for one chain creation
pub struct SwapchainCreateInfo<D: PresentationDevice + ?Sized> {
    /// Queue family that renders into and presents the images
    pub queue_family: u32,
    /// Image format and colour space
    pub format: D::Format,
    /// Image extent
    pub extent: Extent2D,
    /// Requested number of images
    pub image_count: u32,
    /// Presentation mode
    pub present_mode: PresentMode,
    /// Chain being replaced, handed to the platform so it can reuse resources
    pub previous: Option<D::Swapchain>,
}

/// Result of a successful image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    /// Index into the chain's image array
    pub index: u32,
    /// The chain still works but no longer matches the surface exactly
    pub suboptimal: bool,
}

/// Result of a successful presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// The image was presented and the chain matches the surface
    Optimal,
    /// The image was presented but the chain should be recreated
    Suboptimal,
}

/// One queue submission of the frame's command buffer
pub struct SubmitInfo<D: PresentationDevice + ?Sized> {
    /// Recorded primary command buffer
    pub command_buffer: D::CommandBuffer,
    /// Waited on at the colour attachment output stage
    pub wait: D::Semaphore,
    /// Signalled when the commands finish
    pub signal: D::Semaphore,
    /// Optional fence signalled when the commands finish
    pub fence: Option<D::Fence>,
}

/// Logical device, queue and surface queries the engine renders with
///
/// Handles are plain copyable values; ownership is expressed by the RAII
/// wrappers in [`crate::swapchain`], [`crate::framebuffer`], [`crate::sync`] and
/// [`crate::commands`], which call the matching `destroy_*` method on drop.
pub trait PresentationDevice {
    /// Surface format (pixel format and colour space)
    type Format: Copy + Debug;
    /// Swap buffer chain handle
    type Swapchain: Copy + Debug + PartialEq;
    /// Presentable image handle, owned by its chain
    type Image: Copy + Debug + PartialEq;
    /// Image view handle
    type ImageView: Copy + Debug + PartialEq;
    /// Framebuffer handle
    type Framebuffer: Copy + Debug + PartialEq;
    /// Render pass handle
    type RenderPass: Copy + Debug;
    /// Binary semaphore handle
    type Semaphore: Copy + Debug + PartialEq;
    /// Fence handle
    type Fence: Copy + Debug + PartialEq;
    /// Command pool handle
    type CommandPool: Copy + Debug;
    /// Primary command buffer handle
    type CommandBuffer: Copy + Debug;

    /// Query the surface limits
    fn surface_capabilities(&self) -> PresentResult<SurfaceCapabilities>;
    /// Pick the presentable surface format
    fn surface_format(&self) -> PresentResult<Self::Format>;

    /// Create a swap buffer chain
    fn create_swapchain(&self, info: &SwapchainCreateInfo<Self>) -> PresentResult<Self::Swapchain>;
    /// Images owned by a chain
    fn swapchain_images(&self, swapchain: Self::Swapchain) -> PresentResult<Vec<Self::Image>>;
    /// Destroy a chain and, implicitly, its images
    fn destroy_swapchain(&self, swapchain: Self::Swapchain);

    /// Create a 2D colour view over a presentable image
    fn create_image_view(&self, image: Self::Image, format: Self::Format) -> PresentResult<Self::ImageView>;
    /// Destroy an image view
    fn destroy_image_view(&self, view: Self::ImageView);

    /// Bind a single colour view to a render pass at a fixed extent
    fn create_framebuffer(
        &self,
        render_pass: Self::RenderPass,
        view: Self::ImageView,
        extent: Extent2D,
    ) -> PresentResult<Self::Framebuffer>;
    /// Destroy a framebuffer
    fn destroy_framebuffer(&self, framebuffer: Self::Framebuffer);

    /// Create an unsignalled binary semaphore
    fn create_semaphore(&self) -> PresentResult<Self::Semaphore>;
    /// Destroy a semaphore
    fn destroy_semaphore(&self, semaphore: Self::Semaphore);

    /// Create a fence
    fn create_fence(&self, signaled: bool) -> PresentResult<Self::Fence>;
    /// Block until the fence is signalled or the timeout (ns) expires
    fn wait_for_fence(&self, fence: Self::Fence, timeout: u64) -> PresentResult<()>;
    /// Return the fence to the unsignalled state
    fn reset_fence(&self, fence: Self::Fence) -> PresentResult<()>;
    /// Destroy a fence
    fn destroy_fence(&self, fence: Self::Fence);

    /// Create a transient command pool for the queue family
    fn create_command_pool(&self, queue_family: u32) -> PresentResult<Self::CommandPool>;
    /// Allocate one primary command buffer from the pool
    fn allocate_command_buffer(&self, pool: Self::CommandPool) -> PresentResult<Self::CommandBuffer>;
    /// Reset the pool, returning every command buffer to the initial state
    fn reset_command_pool(&self, pool: Self::CommandPool) -> PresentResult<()>;
    /// Destroy the pool and free its command buffers
    fn destroy_command_pool(&self, pool: Self::CommandPool);

    /// Begin one-time-submit recording
    fn begin_command_buffer(&self, command_buffer: Self::CommandBuffer) -> PresentResult<()>;
    /// Finish recording
    fn end_command_buffer(&self, command_buffer: Self::CommandBuffer) -> PresentResult<()>;
    /// Begin the render pass on a framebuffer, clearing the colour attachment
    fn cmd_begin_render_pass(
        &self,
        command_buffer: Self::CommandBuffer,
        render_pass: Self::RenderPass,
        framebuffer: Self::Framebuffer,
        extent: Extent2D,
        clear_color: ClearColor,
    );
    /// End the current render pass
    fn cmd_end_render_pass(&self, command_buffer: Self::CommandBuffer);
    /// Full-extent viewport
    fn cmd_set_viewport(&self, command_buffer: Self::CommandBuffer, extent: Extent2D);
    /// Full-extent scissor
    fn cmd_set_scissor(&self, command_buffer: Self::CommandBuffer, extent: Extent2D);

    /// Acquire the next presentable image, signalling `signal` once it is available
    fn acquire_next_image(
        &self,
        swapchain: Self::Swapchain,
        timeout: u64,
        signal: Self::Semaphore,
    ) -> PresentResult<AcquiredImage>;
    /// Submit recorded commands to the queue
    fn queue_submit(&self, info: &SubmitInfo<Self>) -> PresentResult<()>;
    /// Present an acquired image after `wait` is signalled
    fn queue_present(
        &self,
        swapchain: Self::Swapchain,
        image_index: u32,
        wait: Self::Semaphore,
    ) -> PresentResult<PresentStatus>;

    /// Block until all queued GPU work has completed
    fn wait_idle(&self) -> PresentResult<()>;
}
