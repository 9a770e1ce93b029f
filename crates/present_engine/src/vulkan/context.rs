//! Vulkan context management
//!
//! Bootstraps everything the presentation engine takes as given: the instance
//! (with optional validation), the window surface, a physical device with one
//! queue family that can both render and present, and the logical device.

use std::ffi::{c_char, CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};

use super::device::VulkanDevice;
use super::vk_error;
use crate::config::InstanceConfig;
use crate::error::{PresentError, PresentResult};
use crate::window::Window;

fn c_string(value: &str) -> PresentResult<CString> {
    CString::new(value).map_err(|_| PresentError::invalid(format!("name contains a NUL byte: {value:?}")))
}

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create the instance with the window system's extensions plus the configured ones
    pub fn new(window: &Window, config: &InstanceConfig) -> PresentResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| PresentError::PresentationUnavailable(format!("Failed to load Vulkan: {e}")))?;

        let app_name = c_string(&config.app_name)?;
        let engine_name = c_string("present_engine")?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let window_extensions = window
            .required_instance_extensions()
            .map_err(|e| PresentError::PresentationUnavailable(e.to_string()))?;
        let extension_names = window_extensions
            .iter()
            .chain(&config.required_extensions)
            .map(|name| c_string(name))
            .collect::<PresentResult<Vec<_>>>()?;
        let mut extensions: Vec<*const c_char> = extension_names.iter().map(|name| name.as_ptr()).collect();
        if config.enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if config.enable_validation {
            config
                .validation_layers
                .iter()
                .map(|name| c_string(name))
                .collect::<PresentResult<Vec<_>>>()?
        } else {
            Vec::new()
        };
        let layers: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(vk_error("vkCreateInstance"))?
        };

        let debug = if config.enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::info!(
            "Vulkan instance created ({} extensions, validation {})",
            extensions.len(),
            if config.enable_validation { "on" } else { "off" }
        );
        Ok(Self { entry, instance, debug })
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> PresentResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(vk_error("vkCreateDebugUtilsMessengerEXT"))
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = &self.debug {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Selected physical device
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device name as reported by the driver
    pub name: String,
    /// Queue family used for both rendering and presentation
    pub queue_family: u32,
}

impl PhysicalDeviceInfo {
    /// Pick the first device with a graphics queue family that can present to `surface`
    pub fn select_suitable_device(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> PresentResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(vk_error("vkEnumeratePhysicalDevices"))?
        };

        for device in devices {
            let properties = unsafe { instance.get_physical_device_properties(device) };
            let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
                .to_string_lossy()
                .into_owned();

            if !Self::supports_swapchain(instance, device)? {
                log::debug!("Skipping GPU {}: no swapchain support", name);
                continue;
            }
            match Self::presenting_graphics_family(instance, device, surface, surface_loader)? {
                Some(queue_family) => {
                    log::info!("Selected GPU: {} (queue family {})", name, queue_family);
                    return Ok(Self {
                        device,
                        name,
                        queue_family,
                    });
                }
                None => log::debug!("Skipping GPU {}: cannot present to the surface", name),
            }
        }

        Err(PresentError::PresentationUnavailable("No suitable GPU found".to_string()))
    }

    fn presenting_graphics_family(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> PresentResult<Option<u32>> {
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        for (index, family) in (0u32..).zip(queue_families.iter()) {
            if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                continue;
            }
            let present_support = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, index, surface)
                    .map_err(vk_error("vkGetPhysicalDeviceSurfaceSupportKHR"))?
            };
            if present_support {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    fn supports_swapchain(instance: &Instance, device: vk::PhysicalDevice) -> PresentResult<bool> {
        let extensions = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(vk_error("vkEnumerateDeviceExtensionProperties"))?
        };

        Ok(extensions.iter().any(|available| {
            let extension_name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            extension_name == SwapchainLoader::name()
        }))
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Queue used for rendering and presentation
    pub queue: vk::Queue,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create the device with one queue and the swapchain extension
    pub fn new(instance: &Instance, physical_device: &PhysicalDeviceInfo) -> PresentResult<Self> {
        let priorities = [1.0];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical_device.queue_family)
            .queue_priorities(&priorities)
            .build()];
        let required_extensions = [SwapchainLoader::name().as_ptr()];

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions);

        let device = unsafe {
            instance
                .create_device(physical_device.device, &create_info, None)
                .map_err(vk_error("vkCreateDevice"))?
        };
        let queue = unsafe { device.get_device_queue(physical_device.queue_family, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        Ok(Self {
            device,
            queue,
            swapchain_loader,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Owns the instance, surface and logical device
///
/// Everything created through [`VulkanContext::presentation_device`] must be
/// dropped before the context.
pub struct VulkanContext {
    surface: vk::SurfaceKHR,
    surface_loader: Surface,
    physical_device: PhysicalDeviceInfo,
    // Dropped before the instance.
    device: LogicalDevice,
    instance: VulkanInstance,
}

impl VulkanContext {
    /// Create a new Vulkan context for the window
    pub fn new(window: &Window, config: &InstanceConfig) -> PresentResult<Self> {
        let instance = VulkanInstance::new(window, config)?;

        let surface_loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_vulkan_surface(instance.instance.handle())
            .map_err(|e| PresentError::PresentationUnavailable(format!("Surface creation: {e}")))?;

        let physical_device =
            match PhysicalDeviceInfo::select_suitable_device(&instance.instance, surface, &surface_loader) {
                Ok(physical_device) => physical_device,
                Err(e) => {
                    unsafe { surface_loader.destroy_surface(surface, None) };
                    return Err(e);
                }
            };

        let device = match LogicalDevice::new(&instance.instance, &physical_device) {
            Ok(device) => device,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        Ok(Self {
            surface,
            surface_loader,
            physical_device,
            device,
            instance,
        })
    }

    /// Device layer handed to the presentation engine
    pub fn presentation_device(&self) -> VulkanDevice {
        VulkanDevice::new(
            self.device.device.clone(),
            self.physical_device.device,
            self.device.queue,
            self.surface,
            self.surface_loader.clone(),
            self.device.swapchain_loader.clone(),
        )
    }

    /// Get the raw Device handle
    pub fn raw_device(&self) -> Device {
        self.device.device.clone()
    }

    /// Queue family used for rendering and presentation
    pub fn queue_family(&self) -> u32 {
        self.physical_device.queue_family
    }

    /// Selected physical device
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Get a reference to the Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device.device_wait_idle();
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
