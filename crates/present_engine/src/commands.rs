//! Command buffer management
//!
//! The command recording surface is one transient pool with a single primary
//! command buffer. Every frame resets the whole pool and records from scratch,
//! which is only legal once the previous submission from that pool has
//! retired; the frame driver guarantees that through its pacing policy.

use std::sync::Arc;

use crate::device::{ClearColor, Extent2D, PresentationDevice};
use crate::error::{PresentError, PresentResult};
use crate::framebuffer::RenderTarget;

/// Transient command pool plus its one command buffer, with RAII cleanup
pub struct CommandSurface<D: PresentationDevice> {
    device: Arc<D>,
    pool: D::CommandPool,
    command_buffer: D::CommandBuffer,
}

impl<D: PresentationDevice> CommandSurface<D> {
    /// Create the pool for `queue_family` and allocate its command buffer
    pub fn new(device: Arc<D>, queue_family: u32) -> PresentResult<Self> {
        let pool = device.create_command_pool(queue_family)?;
        let command_buffer = match device.allocate_command_buffer(pool) {
            Ok(command_buffer) => command_buffer,
            Err(e) => {
                device.destroy_command_pool(pool);
                return Err(e);
            }
        };

        Ok(Self {
            device,
            pool,
            command_buffer,
        })
    }

    /// Reset the pool, discarding everything previously recorded
    pub fn reset(&mut self) -> PresentResult<()> {
        self.device.reset_command_pool(self.pool)
    }

    /// Reset the pool and begin a fresh one-time-submit recording
    pub fn begin(&mut self) -> PresentResult<CommandRecorder<'_, D>> {
        self.reset()?;
        self.device.begin_command_buffer(self.command_buffer)?;

        Ok(CommandRecorder {
            device: &self.device,
            command_buffer: self.command_buffer,
            recording: true,
        })
    }

    /// Get the command buffer handle
    pub fn handle(&self) -> D::CommandBuffer {
        self.command_buffer
    }
}

impl<D: PresentationDevice> Drop for CommandSurface<D> {
    fn drop(&mut self) {
        // Destroying the pool frees its command buffer.
        self.device.destroy_command_pool(self.pool);
    }
}

/// Command buffer in the recording state
pub struct CommandRecorder<'a, D: PresentationDevice> {
    device: &'a D,
    command_buffer: D::CommandBuffer,
    recording: bool,
}

impl<'a, D: PresentationDevice> CommandRecorder<'a, D> {
    /// Begin the render pass on `target`, clearing it to `clear_color`
    pub fn begin_render_pass(
        &mut self,
        render_pass: D::RenderPass,
        target: &RenderTarget<D>,
        clear_color: ClearColor,
    ) -> PresentResult<ActiveRenderPass<'_, D>> {
        if !self.recording {
            return Err(PresentError::invalid("Command buffer not recording"));
        }

        let extent = target.extent();
        self.device
            .cmd_begin_render_pass(self.command_buffer, render_pass, target.handle(), extent, clear_color);

        Ok(ActiveRenderPass {
            device: self.device,
            command_buffer: self.command_buffer,
            extent,
        })
    }

    /// End command recording
    pub fn end(mut self) -> PresentResult<D::CommandBuffer> {
        if !self.recording {
            return Err(PresentError::invalid("Command buffer not recording"));
        }

        self.device.end_command_buffer(self.command_buffer)?;
        self.recording = false;
        Ok(self.command_buffer)
    }

    /// Get the command buffer handle
    pub fn handle(&self) -> D::CommandBuffer {
        self.command_buffer
    }
}

/// Render pass being recorded; ends the pass when dropped
pub struct ActiveRenderPass<'p, D: PresentationDevice> {
    device: &'p D,
    command_buffer: D::CommandBuffer,
    extent: Extent2D,
}

impl<'p, D: PresentationDevice> ActiveRenderPass<'p, D> {
    /// Viewport covering the whole render target
    pub fn set_viewport(&mut self) {
        self.device.cmd_set_viewport(self.command_buffer, self.extent);
    }

    /// Scissor covering the whole render target
    pub fn set_scissor(&mut self) {
        self.device.cmd_set_scissor(self.command_buffer, self.extent);
    }

    /// Extent of the render target
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Command buffer for recording draws through the device directly
    pub fn command_buffer(&self) -> D::CommandBuffer {
        self.command_buffer
    }

    /// Device the pass records on
    pub fn device(&self) -> &D {
        self.device
    }
}

impl<D: PresentationDevice> Drop for ActiveRenderPass<'_, D> {
    fn drop(&mut self) {
        self.device.cmd_end_render_pass(self.command_buffer);
    }
}
