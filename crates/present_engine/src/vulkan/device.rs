//! [`PresentationDevice`] over ash
//!
//! `VulkanDevice` borrows the logical device, queue and surface owned by
//! [`super::VulkanContext`]; it never destroys them. The context must outlive
//! every engine object built through this device.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device};

use super::vk_error;
use crate::device::{
    AcquiredImage, ClearColor, Extent2D, PresentMode, PresentStatus, PresentationDevice, SubmitInfo,
    SurfaceCapabilities, SwapchainCreateInfo,
};
use crate::error::{PresentError, PresentResult};

/// Logical device, queue and surface the engine renders with
#[derive(Clone)]
pub struct VulkanDevice {
    device: Device,
    physical_device: vk::PhysicalDevice,
    queue: vk::Queue,
    surface: vk::SurfaceKHR,
    surface_loader: Surface,
    swapchain_loader: SwapchainLoader,
}

impl VulkanDevice {
    /// Bundle already-created handles
    pub fn new(
        device: Device,
        physical_device: vk::PhysicalDevice,
        queue: vk::Queue,
        surface: vk::SurfaceKHR,
        surface_loader: Surface,
        swapchain_loader: SwapchainLoader,
    ) -> Self {
        Self {
            device,
            physical_device,
            queue,
            surface,
            surface_loader,
            swapchain_loader,
        }
    }

    /// Presentation mode to use for `requested`, falling back to FIFO
    fn supported_present_mode(&self, requested: PresentMode) -> PresentResult<vk::PresentModeKHR> {
        let wanted = vk_present_mode(requested);
        let present_modes = unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(self.physical_device, self.surface)
                .map_err(vk_error("vkGetPhysicalDeviceSurfacePresentModesKHR"))?
        };

        if present_modes.contains(&wanted) {
            Ok(wanted)
        } else {
            log::warn!("Present mode {:?} not supported, using FIFO", requested);
            Ok(vk::PresentModeKHR::FIFO)
        }
    }

    fn raw_capabilities(&self) -> PresentResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| match e {
                    vk::Result::ERROR_SURFACE_LOST_KHR => PresentError::SurfaceLost,
                    other => PresentError::PresentationUnavailable(format!("surface capabilities: {other:?}")),
                })
        }
    }
}

fn vk_present_mode(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
    }
}

const fn vk_extent(extent: Extent2D) -> vk::Extent2D {
    vk::Extent2D {
        width: extent.width,
        height: extent.height,
    }
}

const fn full_rect(extent: Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent: vk_extent(extent),
    }
}

impl PresentationDevice for VulkanDevice {
    type Format = vk::SurfaceFormatKHR;
    type Swapchain = vk::SwapchainKHR;
    type Image = vk::Image;
    type ImageView = vk::ImageView;
    type Framebuffer = vk::Framebuffer;
    type RenderPass = vk::RenderPass;
    type Semaphore = vk::Semaphore;
    type Fence = vk::Fence;
    type CommandPool = vk::CommandPool;
    type CommandBuffer = vk::CommandBuffer;

    fn surface_capabilities(&self) -> PresentResult<SurfaceCapabilities> {
        let caps = self.raw_capabilities()?;

        // u32::MAX means the window decides the extent
        let current_extent = (caps.current_extent.width != u32::MAX)
            .then(|| Extent2D::new(caps.current_extent.width, caps.current_extent.height));

        Ok(SurfaceCapabilities {
            current_extent,
            min_image_extent: Extent2D::new(caps.min_image_extent.width, caps.min_image_extent.height),
            max_image_extent: Extent2D::new(caps.max_image_extent.width, caps.max_image_extent.height),
            min_image_count: caps.min_image_count,
            max_image_count: caps.max_image_count,
        })
    }

    fn surface_format(&self) -> PresentResult<vk::SurfaceFormatKHR> {
        let surface_formats = unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(self.physical_device, self.surface)
                .map_err(|e| PresentError::PresentationUnavailable(format!("surface formats: {e:?}")))?
        };

        surface_formats
            .iter()
            .find(|sf| sf.format == vk::Format::B8G8R8A8_SRGB && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
            .or_else(|| surface_formats.first())
            .copied()
            .ok_or_else(|| PresentError::PresentationUnavailable("surface reports no formats".to_string()))
    }

    fn create_swapchain(&self, info: &SwapchainCreateInfo<Self>) -> PresentResult<vk::SwapchainKHR> {
        let caps = self.raw_capabilities()?;
        let present_mode = self.supported_present_mode(info.present_mode)?;
        let queue_families = [info.queue_family];

        let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(self.surface)
            .min_image_count(info.image_count)
            .image_format(info.format.format)
            .image_color_space(info.format.color_space)
            .image_extent(vk_extent(info.extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_families)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(info.previous.unwrap_or_else(vk::SwapchainKHR::null));

        unsafe {
            self.swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(vk_error("vkCreateSwapchainKHR"))
        }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> PresentResult<Vec<vk::Image>> {
        unsafe {
            self.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(vk_error("vkGetSwapchainImagesKHR"))
        }
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe {
            self.swapchain_loader.destroy_swapchain(swapchain, None);
        }
    }

    fn create_image_view(&self, image: vk::Image, format: vk::SurfaceFormatKHR) -> PresentResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format.format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.device
                .create_image_view(&create_info, None)
                .map_err(vk_error("vkCreateImageView"))
        }
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe {
            self.device.destroy_image_view(view, None);
        }
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: Extent2D,
    ) -> PresentResult<vk::Framebuffer> {
        let attachments = [view];
        let framebuffer_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        unsafe {
            self.device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(vk_error("vkCreateFramebuffer"))
        }
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe {
            self.device.destroy_framebuffer(framebuffer, None);
        }
    }

    fn create_semaphore(&self) -> PresentResult<vk::Semaphore> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        unsafe {
            self.device
                .create_semaphore(&create_info, None)
                .map_err(vk_error("vkCreateSemaphore"))
        }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe {
            self.device.destroy_semaphore(semaphore, None);
        }
    }

    fn create_fence(&self, signaled: bool) -> PresentResult<vk::Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);

        unsafe {
            self.device
                .create_fence(&create_info, None)
                .map_err(vk_error("vkCreateFence"))
        }
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> PresentResult<()> {
        unsafe {
            self.device
                .wait_for_fences(&[fence], true, timeout)
                .map_err(vk_error("vkWaitForFences"))
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> PresentResult<()> {
        unsafe { self.device.reset_fences(&[fence]).map_err(vk_error("vkResetFences")) }
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe {
            self.device.destroy_fence(fence, None);
        }
    }

    fn create_command_pool(&self, queue_family: u32) -> PresentResult<vk::CommandPool> {
        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::TRANSIENT)
            .queue_family_index(queue_family);

        unsafe {
            self.device
                .create_command_pool(&pool_create_info, None)
                .map_err(vk_error("vkCreateCommandPool"))
        }
    }

    fn allocate_command_buffer(&self, pool: vk::CommandPool) -> PresentResult<vk::CommandBuffer> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe {
            self.device
                .allocate_command_buffers(&alloc_info)
                .map_err(vk_error("vkAllocateCommandBuffers"))?
        };
        command_buffers
            .first()
            .copied()
            .ok_or_else(|| PresentError::allocation("command buffer"))
    }

    fn reset_command_pool(&self, pool: vk::CommandPool) -> PresentResult<()> {
        unsafe {
            self.device
                .reset_command_pool(pool, vk::CommandPoolResetFlags::empty())
                .map_err(vk_error("vkResetCommandPool"))
        }
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        unsafe {
            self.device.destroy_command_pool(pool, None);
        }
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> PresentResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(vk_error("vkBeginCommandBuffer"))
        }
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> PresentResult<()> {
        unsafe {
            self.device
                .end_command_buffer(command_buffer)
                .map_err(vk_error("vkEndCommandBuffer"))
        }
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: Extent2D,
        clear_color: ClearColor,
    ) {
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: clear_color },
        }];
        let render_pass_begin = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(full_rect(extent))
            .clear_values(&clear_values);

        unsafe {
            self.device
                .cmd_begin_render_pass(command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);
        }
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_end_render_pass(command_buffer);
        }
    }

    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, extent: Extent2D) {
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        unsafe {
            self.device.cmd_set_viewport(command_buffer, 0, &[viewport]);
        }
    }

    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, extent: Extent2D) {
        unsafe {
            self.device.cmd_set_scissor(command_buffer, 0, &[full_rect(extent)]);
        }
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        signal: vk::Semaphore,
    ) -> PresentResult<AcquiredImage> {
        let (index, suboptimal) = unsafe {
            self.swapchain_loader
                .acquire_next_image(swapchain, timeout, signal, vk::Fence::null())
                .map_err(vk_error("vkAcquireNextImageKHR"))?
        };
        Ok(AcquiredImage { index, suboptimal })
    }

    fn queue_submit(&self, info: &SubmitInfo<Self>) -> PresentResult<()> {
        let wait_semaphores = [info.wait];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [info.command_buffer];
        let signal_semaphores = [info.signal];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.device
                .queue_submit(self.queue, &[submit_info], info.fence.unwrap_or_else(vk::Fence::null))
                .map_err(vk_error("vkQueueSubmit"))
        }
    }

    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> PresentResult<PresentStatus> {
        let wait_semaphores = [wait];
        let swapchains = [swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let suboptimal = unsafe {
            self.swapchain_loader
                .queue_present(self.queue, &present_info)
                .map_err(vk_error("vkQueuePresentKHR"))?
        };
        Ok(if suboptimal {
            PresentStatus::Suboptimal
        } else {
            PresentStatus::Optimal
        })
    }

    fn wait_idle(&self) -> PresentResult<()> {
        unsafe { self.device.device_wait_idle().map_err(vk_error("vkDeviceWaitIdle")) }
    }
}
