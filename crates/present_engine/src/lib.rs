//! # Present Engine
//!
//! Keeps a window's swapchain alive and correctly sized while driving one
//! frame at a time through acquire, record, submit and present.
//!
//! ## Features
//!
//! - **Chain generations**: images, views and render targets are created and
//!   destroyed as one unit, never mixed across sizes
//! - **Resize reconciliation**: minimized windows suspend rendering; a new
//!   extent rebuilds the chain before the next frame
//! - **Frame pacing**: fully blocking or pipelined with per-slot fences
//! - **Backend seam**: everything above [`vulkan`] runs against the
//!   [`PresentationDevice`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use present_engine::vulkan::{RenderPass, VulkanContext};
//! use present_engine::{
//!     ChainDesc, ClearOnly, EngineConfig, FrameDriver, FrameDriverDesc, PresentationDevice, Window,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
//!     let context = VulkanContext::new(&window, &config.instance)?;
//!     let device = Arc::new(context.presentation_device());
//!     let format = device.surface_format()?;
//!     let render_pass = RenderPass::new_color_pass(context.raw_device(), format.format)?;
//!
//!     let desc = FrameDriverDesc {
//!         chain: ChainDesc {
//!             queue_family: context.queue_family(),
//!             format,
//!             render_pass: render_pass.handle(),
//!             present_mode: config.present.present_mode,
//!             min_image_count: config.present.min_image_count,
//!         },
//!         clear_color: config.present.clear_color,
//!         pacing: config.present.pacing,
//!     };
//!     let mut driver = FrameDriver::new(device, desc, &mut window, ClearOnly)?;
//!
//!     window.show();
//!     driver.run(&mut window)?;
//!     driver.shutdown()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod frame_driver;
pub mod framebuffer;
pub mod swapchain;
pub mod swapchain_manager;
pub mod sync;
pub mod vulkan;
pub mod window;

#[cfg(test)]
pub(crate) mod mock;

pub use commands::{ActiveRenderPass, CommandRecorder, CommandSurface};
pub use config::{Config, ConfigError, EngineConfig};
pub use device::{ClearColor, Extent2D, PresentMode, PresentationDevice};
pub use error::{PresentError, PresentResult};
pub use frame_driver::{
    ClearOnly, FrameDriver, FrameDriverDesc, FrameOutcome, FramePacing, FrameRecorder, FrameReport, FrameState,
};
pub use swapchain::{ChainDesc, SwapBufferChain};
pub use swapchain_manager::{ReconcileOutcome, SwapchainManager};
pub use window::{Window, WindowError, WindowSurface};
