//! Vulkan backend
//!
//! [`VulkanContext`] bootstraps the instance, surface and logical device;
//! [`VulkanDevice`] is the [`crate::PresentationDevice`] the engine renders
//! through. All `vk::Result` codes are translated into [`PresentError`] here.

use ash::vk;

use crate::error::PresentError;

pub mod context;
pub mod device;
pub mod render_pass;

pub use context::VulkanContext;
pub use device::VulkanDevice;
pub use render_pass::RenderPass;

/// Translate a Vulkan result code from `operation` into the engine's error taxonomy
pub fn map_vk_result(operation: &'static str, result: vk::Result) -> PresentError {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            PresentError::allocation(operation)
        }
        vk::Result::ERROR_SURFACE_LOST_KHR => PresentError::SurfaceLost,
        vk::Result::ERROR_OUT_OF_DATE_KHR => PresentError::OutOfDateFrame,
        vk::Result::ERROR_DEVICE_LOST => PresentError::DeviceLost,
        other => PresentError::Backend {
            operation,
            code: format!("{other:?}"),
        },
    }
}

/// `map_err` adapter for [`map_vk_result`]
pub(crate) fn vk_error(operation: &'static str) -> impl Fn(vk::Result) -> PresentError {
    move |result| map_vk_result(operation, result)
}
