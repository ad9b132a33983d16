//! Configuration types for the image editing pipelines
//!
//! Every external service gets its own [`ServiceConfig`] (credential, endpoint and
//! request timeout) which is injected into the pipeline that talks to it. Values can
//! come from built-in defaults, an optional TOML settings file, and finally the
//! command line or environment.

use crate::error::{ImageEditError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL of the OpenAI images API
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default endpoint of the Picsart background removal tool
pub const DEFAULT_PICSART_REMOVEBG_URL: &str = "https://api.picsart.io/tools/1.0/removebg";

/// Default image model used for edit requests
pub const DEFAULT_EDIT_MODEL: &str = "gpt-image-1";

/// Default output directory for recolored images
pub const DEFAULT_RECOLOR_OUTPUT_DIR: &str = "Task2_result";

/// Default request timeout (5 minutes; image edits are slow)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Upper bound accepted for request timeouts
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Connection settings for one external service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Access key sent with every request
    pub api_key: Option<String>,
    /// Base URL (OpenAI) or full endpoint URL (Picsart)
    pub base_url: String,
    /// Timeout applied to every request made with this configuration
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Defaults for the OpenAI images API
    #[must_use]
    pub fn openai() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Defaults for the Picsart background removal API
    #[must_use]
    pub fn picsart() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_PICSART_REMOVEBG_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the access key
    #[must_use]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a non-blank access key is configured
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Validate endpoint and timeout
    ///
    /// # Errors
    /// - Empty base URL
    /// - Zero or excessive timeout
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ImageEditError::invalid_config("base URL must not be empty"));
        }

        let secs = self.timeout.as_secs();
        if self.timeout.is_zero() || secs > MAX_TIMEOUT_SECS {
            return Err(ImageEditError::config_value_error(
                "timeout",
                format!("{}s", self.timeout.as_secs_f64()),
                "1-3600 seconds",
            ));
        }

        Ok(())
    }
}

/// What to do when one result of a batch edit cannot be decoded or written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and keep processing the remaining results
    #[default]
    Isolate,
    /// Stop at the first failing result
    Abort,
}

/// Configuration for the color-transform pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTransformConfig {
    /// OpenAI connection settings
    pub service: ServiceConfig,
    /// Image model used for the edit request
    pub model: String,
    /// Directory receiving `<stem>_modified.png` outputs
    pub output_dir: PathBuf,
    /// Per-result failure handling
    pub failure_policy: FailurePolicy,
}

impl Default for ColorTransformConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::openai(),
            model: DEFAULT_EDIT_MODEL.to_string(),
            output_dir: PathBuf::from(DEFAULT_RECOLOR_OUTPUT_DIR),
            failure_policy: FailurePolicy::Isolate,
        }
    }
}

impl ColorTransformConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ColorTransformConfigBuilder {
        ColorTransformConfigBuilder::default()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - Invalid service settings
    /// - Empty model name or output directory
    pub fn validate(&self) -> Result<()> {
        self.service.validate()?;

        if self.model.trim().is_empty() {
            return Err(ImageEditError::invalid_config("model name must not be empty"));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ImageEditError::invalid_config(
                "output directory must not be empty",
            ));
        }

        Ok(())
    }
}

/// Builder for `ColorTransformConfig`
#[derive(Debug, Default)]
pub struct ColorTransformConfigBuilder {
    config: ColorTransformConfig,
}

impl ColorTransformConfigBuilder {
    /// Set OpenAI connection settings
    #[must_use]
    pub fn service(mut self, service: ServiceConfig) -> Self {
        self.config.service = service;
        self
    }

    /// Set the image model
    #[must_use]
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set per-result failure handling
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Any error reported by [`ColorTransformConfig::validate`]
    pub fn build(self) -> Result<ColorTransformConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration for the background-removal pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundRemovalConfig {
    /// Picsart connection settings
    pub service: ServiceConfig,
    /// Requested output format (`format` form field)
    pub output_format: String,
    /// Requested output type (`output_type` form field)
    pub output_type: String,
    /// Read size used while streaming the processed image to disk
    pub chunk_size: usize,
}

impl Default for BackgroundRemovalConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::picsart(),
            output_format: "PNG".to_string(),
            output_type: "cutout".to_string(),
            chunk_size: 8192,
        }
    }
}

impl BackgroundRemovalConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> BackgroundRemovalConfigBuilder {
        BackgroundRemovalConfigBuilder::default()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - Invalid service settings
    /// - Zero chunk size or empty format fields
    pub fn validate(&self) -> Result<()> {
        self.service.validate()?;

        if self.chunk_size == 0 {
            return Err(ImageEditError::config_value_error(
                "chunk size",
                self.chunk_size,
                "1 or more bytes",
            ));
        }

        if self.output_format.is_empty() || self.output_type.is_empty() {
            return Err(ImageEditError::invalid_config(
                "output format and output type must not be empty",
            ));
        }

        Ok(())
    }
}

/// Builder for `BackgroundRemovalConfig`
#[derive(Debug, Default)]
pub struct BackgroundRemovalConfigBuilder {
    config: BackgroundRemovalConfig,
}

impl BackgroundRemovalConfigBuilder {
    /// Set Picsart connection settings
    #[must_use]
    pub fn service(mut self, service: ServiceConfig) -> Self {
        self.config.service = service;
        self
    }

    /// Set the requested output format
    #[must_use]
    pub fn output_format<S: Into<String>>(mut self, format: S) -> Self {
        self.config.output_format = format.into();
        self
    }

    /// Set the requested output type
    #[must_use]
    pub fn output_type<S: Into<String>>(mut self, output_type: S) -> Self {
        self.config.output_type = output_type.into();
        self
    }

    /// Set the streaming chunk size
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Any error reported by [`BackgroundRemovalConfig::validate`]
    pub fn build(self) -> Result<BackgroundRemovalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Optional overrides for one service, as read from the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Only meaningful for the `[openai]` section
    pub model: Option<String>,
}

impl ServiceSettings {
    /// Layer these settings over `base`
    #[must_use]
    pub fn apply(&self, mut base: ServiceConfig) -> ServiceConfig {
        if let Some(key) = &self.api_key {
            base.api_key = Some(key.clone());
        }
        if let Some(url) = &self.base_url {
            base.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            base.timeout = Duration::from_secs(secs);
        }
        base
    }
}

/// Contents of the `config.toml` settings file
///
/// ```toml
/// [openai]
/// api_key = "sk-..."
/// model = "gpt-image-1"
///
/// [picsart]
/// api_key = "..."
/// timeout_secs = 60
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub openai: ServiceSettings,
    pub picsart: ServiceSettings,
}

impl Settings {
    /// Parse settings from TOML text
    ///
    /// # Errors
    /// - Malformed TOML or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| ImageEditError::invalid_config(format!("Invalid settings file: {}", e)))
    }

    /// Read settings from a file
    ///
    /// # Errors
    /// - The file cannot be read
    /// - The file is not valid settings TOML
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ImageEditError::file_io_error("read settings file", path, &e))?;
        Self::from_toml_str(&text)
    }

    /// Default settings location: `<config_dir>/imgedit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("imgedit").join("config.toml"))
    }

    /// Load an explicit settings file, or the default one if it exists
    ///
    /// A missing default file yields empty settings; a missing explicit file is an error.
    ///
    /// # Errors
    /// - The explicit file cannot be read or parsed
    /// - The default file exists but cannot be read or parsed
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading settings file");
                Self::load(&path)
            },
            _ => Ok(Self::default()),
        }
    }
}
