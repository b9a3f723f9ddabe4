//! Store configuration.
//!
//! Configuration is layered with the `config` crate:
//! - Bundled defaults (include_str! from vitrine.toml)
//! - User overrides (~/.config/vitrine/vitrine.toml, then ./vitrine.toml)
//! - `VITRINE_*` environment variables

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use vitrine_error::{ConfigError, VitrineError, VitrineResult};

/// What to do when canonical content identical to a stored image is uploaded.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Refuse the upload with `DuplicateContent`
    #[default]
    #[display("reject")]
    Reject,
    /// Admit the upload under a new sequence
    #[display("allow")]
    Allow,
}

/// Configuration for one image store.
///
/// # Example
///
/// ```
/// use vitrine_core::{DuplicatePolicy, StoreConfig};
///
/// let config = StoreConfig::default()
///     .with_storage_root("/tmp/vitrine")
///     .with_max_images(2)
///     .with_duplicate_policy(DuplicatePolicy::Allow);
/// assert!(config.validate().is_ok());
/// assert_eq!(*config.target_width(), 3840);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct StoreConfig {
    /// Directory owned exclusively by the store
    #[setters(into)]
    #[serde(default = "default_storage_root")]
    storage_root: PathBuf,

    /// Capacity ceiling (1-100)
    #[serde(default = "default_max_images")]
    max_images: u32,

    /// Required image width in pixels
    #[serde(default = "default_target_width")]
    target_width: u32,

    /// Required image height in pixels
    #[serde(default = "default_target_height")]
    target_height: u32,

    /// JPEG quality factor (1-100)
    #[serde(default = "default_jpeg_quality")]
    jpeg_quality: u8,

    /// Duplicate content handling, fixed for the store's lifetime
    #[serde(default)]
    duplicate_policy: DuplicatePolicy,

    /// Upload size ceiling, checked before decoding
    #[serde(default = "default_max_payload_bytes")]
    max_payload_bytes: u64,

    /// Keep the original PDF next to pdf-derived images
    #[serde(default = "default_keep_source_pdf")]
    keep_source_pdf: bool,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("images")
}

fn default_max_images() -> u32 {
    25
}

fn default_target_width() -> u32 {
    3840
}

fn default_target_height() -> u32 {
    2160
}

fn default_jpeg_quality() -> u8 {
    95
}

fn default_max_payload_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_keep_source_pdf() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            max_images: default_max_images(),
            target_width: default_target_width(),
            target_height: default_target_height(),
            jpeg_quality: default_jpeg_quality(),
            duplicate_policy: DuplicatePolicy::default(),
            max_payload_bytes: default_max_payload_bytes(),
            keep_source_pdf: default_keep_source_pdf(),
        }
    }
}

impl StoreConfig {
    /// Largest capacity ceiling a store accepts.
    pub const MAX_CAPACITY: u32 = 100;

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending field.
    pub fn validate(&self) -> VitrineResult<()> {
        if self.max_images == 0 || self.max_images > Self::MAX_CAPACITY {
            return Err(ConfigError::invalid(
                "max_images",
                format!(
                    "must be between 1 and {}, got {}",
                    Self::MAX_CAPACITY,
                    self.max_images
                ),
            )
            .into());
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::invalid(
                "jpeg_quality",
                format!("must be between 1 and 100, got {}", self.jpeg_quality),
            )
            .into());
        }
        if self.target_width == 0 || self.target_height == 0 {
            return Err(ConfigError::invalid(
                "target_resolution",
                format!(
                    "must be non-zero, got {}x{}",
                    self.target_width, self.target_height
                ),
            )
            .into());
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::invalid("max_payload_bytes", "must be non-zero").into());
        }
        if self.storage_root.as_os_str().is_empty() {
            return Err(ConfigError::invalid("storage_root", "must not be empty").into());
        }
        Ok(())
    }

    /// Load configuration from a specific file path.
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> VitrineResult<Self> {
        debug!("Loading store configuration from file");

        let config: StoreConfig = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                VitrineError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VitrineError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: env > ./vitrine.toml > home dir > bundled default.
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> VitrineResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../vitrine.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/vitrine/vitrine.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("vitrine").required(false))
            .add_source(Environment::with_prefix("VITRINE").try_parsing(true));

        let config: StoreConfig = builder
            .build()
            .map_err(|e| {
                VitrineError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VitrineError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }
}
