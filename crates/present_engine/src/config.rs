//! Configuration system
//!
//! Startup parameters for the window, the Vulkan instance and presentation.
//! Files are TOML or RON, picked by extension; every field has a default so a
//! partial file is enough.

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

use crate::device::{ClearColor, PresentMode};
use crate::frame_driver::FramePacing;

/// On-disk encodings, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Ron,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat { path: path.to_path_buf() }),
        }
    }
}

/// Loading and saving for a serde configuration tree
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read and decode `path`; missing fields take their defaults
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = FileFormat::of(path)?;
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match format {
            FileFormat::Toml => toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            FileFormat::Ron => ron::from_str(&contents).map_err(|source| ConfigError::Ron {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Encode and write to `path`, replacing any existing file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match FileFormat::of(path)? {
            FileFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Encode(e.to_string()))?,
            FileFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Encode(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Why a configuration file could not be loaded or saved
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// The extension is neither `.toml` nor `.ron`
    #[error("{} is not a .toml or .ron file", .path.display())]
    UnsupportedFormat {
        /// Offending path
        path: PathBuf,
    },

    /// Malformed TOML
    #[error("invalid TOML in {}: {source}", .path.display())]
    Toml {
        /// File being decoded
        path: PathBuf,
        /// Decoder error with location
        #[source]
        source: toml::de::Error,
    },

    /// Malformed RON
    #[error("invalid RON in {}: {source}", .path.display())]
    Ron {
        /// File being decoded
        path: PathBuf,
        /// Decoder error with location
        #[source]
        source: ron::error::SpannedError,
    },

    /// The configuration could not be encoded
    #[error("cannot encode configuration: {0}")]
    Encode(String),
}

/// Window creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Renderer".to_string(),
            width: 1600,
            height: 900,
        }
    }
}

/// Vulkan instance parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable the validation layers and the debug messenger
    pub enable_validation: bool,
    /// Layers enabled when validation is on
    pub validation_layers: Vec<String>,
    /// Instance extensions on top of the ones the window system needs
    pub required_extensions: Vec<String>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            app_name: "Vulkan Renderer".to_string(),
            enable_validation: cfg!(debug_assertions),
            validation_layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            required_extensions: Vec::new(),
        }
    }
}

/// Presentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentConfig {
    /// Clear colour, linear RGBA
    pub clear_color: ClearColor,
    /// Presentation mode
    pub present_mode: PresentMode,
    /// Requested minimum number of chain images
    pub min_image_count: u32,
    /// Frame pacing policy
    pub pacing: FramePacing,
}

impl Default for PresentConfig {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 0.0, 1.0, 1.0],
            present_mode: PresentMode::Fifo,
            min_image_count: 2,
            pacing: FramePacing::Blocking,
        }
    }
}

/// Complete startup configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window parameters
    pub window: WindowConfig,
    /// Instance parameters
    pub instance: InstanceConfig,
    /// Presentation parameters
    pub present: PresentConfig,
}

impl Config for EngineConfig {}
