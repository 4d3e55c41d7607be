//! Controller configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use mraid_core::{ExpansionStyle, NativeCloseButtonStyle, PlacementType};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Per-controller settings
///
/// Loadable from TOML; every field is optional there:
///
/// ```toml
/// expansion_style = "enabled"
/// close_button_style = "ad_controlled"
/// placement_type = "inline"
/// viewability_interval_ms = 3000
/// picture_directory = "/sdcard/Pictures"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Whether `expand` does anything
    pub expansion_style: ExpansionStyle,
    /// Native close button policy
    pub close_button_style: NativeCloseButtonStyle,
    pub placement_type: PlacementType,
    /// Period of the viewability check
    pub viewability_interval_ms: u64,
    /// Native close button edge, in density-independent pixels
    pub close_button_size_dp: u32,
    /// Where saved pictures go
    pub picture_directory: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            expansion_style: ExpansionStyle::Enabled,
            close_button_style: NativeCloseButtonStyle::AdControlled,
            placement_type: PlacementType::Inline,
            viewability_interval_ms: 3000,
            close_button_size_dp: 50,
            picture_directory: PathBuf::from("Pictures"),
            http_timeout_secs: 30,
        }
    }
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expansion style
    pub fn expansion_style(mut self, style: ExpansionStyle) -> Self {
        self.expansion_style = style;
        self
    }

    /// Set the native close button policy
    pub fn close_button_style(mut self, style: NativeCloseButtonStyle) -> Self {
        self.close_button_style = style;
        self
    }

    /// Set the placement type
    pub fn placement_type(mut self, placement: PlacementType) -> Self {
        self.placement_type = placement;
        self
    }

    /// Set the viewability check period
    pub fn viewability_interval(mut self, interval: Duration) -> Self {
        self.viewability_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the picture directory
    pub fn picture_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.picture_directory = directory.into();
        self
    }

    /// Set the HTTP timeout
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout_secs = timeout.as_secs();
        self
    }

    /// Viewability period, never zero
    pub fn viewability_period(&self) -> Duration {
        Duration::from_millis(self.viewability_interval_ms.max(1))
    }

    pub fn http_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Settings for two-part expansion content
    ///
    /// Secondary content is always inline, cannot expand, and leaves the
    /// close button to the ad.
    pub fn secondary(&self) -> Self {
        Self {
            expansion_style: ExpansionStyle::Disabled,
            close_button_style: NativeCloseButtonStyle::AdControlled,
            placement_type: PlacementType::Inline,
            ..self.clone()
        }
    }

    /// Parse from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.viewability_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "viewability_interval_ms must be positive".to_string(),
            ));
        }
        if self.close_button_size_dp == 0 {
            return Err(ConfigError::Invalid(
                "close_button_size_dp must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
