//! Window management using GLFW
//!
//! Provides cross-platform window creation and event handling for Vulkan, and
//! the [`WindowSurface`] view of a window the frame driver works against.

use thiserror::Error;

use crate::device::Extent2D;

/// What the frame driver needs from the window it presents into
pub trait WindowSurface {
    /// Process pending window events without blocking
    fn poll_events(&mut self);

    /// Block until at least one window event arrives
    fn wait_events(&mut self);

    /// Current framebuffer size in pixels; zero while minimized
    fn current_extent(&self) -> Extent2D;

    /// Whether the user asked to close the window
    fn should_close(&self) -> bool;
}

/// Why the window or its Vulkan surface could not be set up
#[derive(Error, Debug)]
pub enum WindowError {
    /// `glfwInit` failed, usually because no display is available
    #[error("GLFW could not initialize: {0}")]
    Init(glfw::InitError),

    /// GLFW refused to open a window of this size
    #[error("GLFW could not open a {width}x{height} window")]
    CreationFailed {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// No Vulkan loader or no surface extension for this platform
    #[error("GLFW reports no Vulkan presentation support")]
    VulkanUnsupported,

    /// `glfwCreateWindowSurface` returned an error code
    #[error("surface creation failed: {0}")]
    SurfaceCreation(ash::vk::Result),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Create a hidden, resizable window with no client API
    ///
    /// Call [`Window::show`] once the presentation engine is ready.
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(WindowError::Init)?;

        // Configure for Vulkan (no OpenGL context)
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));
        glfw.window_hint(glfw::WindowHint::Visible(false));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed { width, height })?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::debug!("Window '{}' created at {}x{}", title, width, height);
        Ok(Self { glfw, window, events })
    }

    /// Make the window visible
    pub fn show(&mut self) {
        self.window.show();
    }

    /// Request or cancel closing
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or(WindowError::VulkanUnsupported)
    }

    /// Create Vulkan surface using GLFW's built-in functionality
    pub fn create_vulkan_surface(&self, instance: ash::vk::Instance) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::SurfaceCreation(result))
        }
    }

    fn handle_events(&mut self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _) => {
                    self.window.set_should_close(true);
                }
                glfw::WindowEvent::FramebufferSize(width, height) => {
                    log::trace!("Framebuffer resized to {}x{}", width, height);
                }
                _ => {}
            }
        }
    }
}

impl WindowSurface for Window {
    fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.handle_events();
    }

    fn wait_events(&mut self) {
        self.glfw.wait_events();
        self.handle_events();
    }

    fn current_extent(&self) -> Extent2D {
        let (width, height) = self.window.get_framebuffer_size();
        Extent2D::new(width.max(0).unsigned_abs(), height.max(0).unsigned_abs())
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }
}
