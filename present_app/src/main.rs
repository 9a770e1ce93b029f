//! Clear-screen demo
//!
//! Opens a window and presents a solid clear colour every frame until the
//! window is closed. Resize and minimize it to exercise chain recreation.
//!
//! Usage: `present_app [config.toml|config.ron]`

use std::sync::Arc;

use present_engine::vulkan::{RenderPass, VulkanContext};
use present_engine::{
    ChainDesc, ClearOnly, Config, EngineConfig, FrameDriver, FrameDriverDesc, PresentationDevice, Window,
};

fn load_config() -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            Ok(EngineConfig::load_from_file(&path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!("Starting present_app ({:?} pacing)", config.present.pacing);

    let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
    let context = VulkanContext::new(&window, &config.instance)?;
    let device = Arc::new(context.presentation_device());

    let format = device.surface_format()?;
    let render_pass = RenderPass::new_color_pass(context.raw_device(), format.format)?;

    let desc = FrameDriverDesc {
        chain: ChainDesc {
            queue_family: context.queue_family(),
            format,
            render_pass: render_pass.handle(),
            present_mode: config.present.present_mode,
            min_image_count: config.present.min_image_count,
        },
        clear_color: config.present.clear_color,
        pacing: config.present.pacing,
    };
    let mut driver = FrameDriver::new(device, desc, &mut window, ClearOnly)?;

    window.show();
    let frames = driver.run(&mut window)?;
    driver.shutdown()?;

    log::info!("Presented {} frames", frames);
    Ok(())
}
