//! Configuration module.
//!
//! Two independent inputs are configured here:
//!
//! - [`PickerOptions`]: the option map a caller hands in with every request.
//!   Only `storageOptions.path` changes what this crate does; the remaining
//!   keys are parsed so the map round-trips through the bridge unchanged.
//! - [`HostConfig`]: settings for [`LocalHost`](crate::host::LocalHost) and the
//!   CLI, loaded from a `media-cache.toml` file.
//!
//! ## Picker options
//!
//! ```json
//! {
//!   "title": "Pick Photos",
//!   "storageOptions": { "skipBackup": true, "path": "selected" }
//! }
//! ```
//!
//! Option maps come from another runtime and are never trusted: a key with the
//! wrong type is dropped on its own, and a map that is not an object at all
//! yields the defaults. Neither case is an error.
//!
//! ## Host config file
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! cache_dir = ".media-cache"              # Base directory for cache files
//! mount_root = "mount"                    # One subdirectory per provider authority
//! public_storage_root = "/storage/emulated/0"
//! # store_index = "stores.json"           # Structured store rows (JSON)
//!
//! [encoding]
//! quality = 100                           # JPEG quality (1-100)
//! append_trailing_bytes = false           # Copy unread source bytes after the JPEG
//! ```
//!
//! Config files are sparse and are merged on top of the stock defaults.
//! Unknown keys are rejected to catch typos early.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

// =============================================================================
// Picker options
// =============================================================================

/// Caller-supplied option map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PickerOptions {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cancel_button_title: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub take_photo_button_title: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub choose_from_library_button_title: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub storage_options: Option<StorageOptions>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub permission_denied: Option<PermissionDeniedOptions>,
}

/// Where cache files go, relative to the host cache directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageOptions {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub skip_backup: Option<bool>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Dialog text shown when the user denies a permission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionDeniedOptions {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub re_try_title: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub ok_title: Option<String>,
}

/// Deserialize a field, turning a value of the wrong shape into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl PickerOptions {
    /// Parse a caller option map. Never fails.
    pub fn from_value(value: &serde_json::Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        match serde_json::from_value(value.clone()) {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(error = %e, "option map is not an object, using defaults");
                Self::default()
            }
        }
    }

    /// Parse a JSON document holding an option map. Never fails.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                tracing::warn!(error = %e, "option map is not valid JSON, using defaults");
                Self::default()
            }
        }
    }

    /// Non-empty `storageOptions.path`, if any.
    pub fn storage_sub_path(&self) -> Option<&str> {
        self.storage_options
            .as_ref()
            .and_then(|s| s.path.as_deref())
            .filter(|p| !p.trim().is_empty())
    }
}

// =============================================================================
// Host config
// =============================================================================

/// Settings for a filesystem-backed host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Base directory for cache files.
    pub cache_dir: PathBuf,
    /// Directory holding one subdirectory per provider authority.
    pub mount_root: PathBuf,
    /// Root of the primary shared storage volume.
    pub public_storage_root: PathBuf,
    /// JSON file with structured store rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_index: Option<PathBuf>,
    /// JPEG output settings.
    pub encoding: EncodingConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".media-cache"),
            mount_root: PathBuf::from("mount"),
            public_storage_root: PathBuf::from("/storage/emulated/0"),
            store_index: None,
            encoding: EncodingConfig::default(),
        }
    }
}

/// JPEG output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// JPEG quality (1-100).
    pub quality: u32,
    /// Append source bytes the decoder left unread after the encoded JPEG.
    pub append_trailing_bytes: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            quality: 100,
            append_trailing_bytes: false,
        }
    }
}

impl HostConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.quality) {
            return Err(ConfigError::Validation(
                "encoding.quality must be 1-100".into(),
            ));
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "cache_dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(HostConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a host config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load a host config file, merged on top of stock defaults and validated.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: HostConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock host config.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# media-cache host configuration
# ==============================
#
# Every key is optional. Values below are the defaults.

# Base directory for cache files. Requests with storageOptions.path write
# into a subdirectory of this.
cache_dir = ".media-cache"

# Content locators are served from <mount_root>/<authority>/<path>.
mount_root = "mount"

# Root of the primary shared storage volume. External storage documents
# on the "primary" volume resolve beneath it.
public_storage_root = "/storage/emulated/0"

# JSON file mapping store URIs to row arrays, e.g.
#   { "content://media/external/images/media": [{ "_id": "1", "_data": "/a.jpg" }] }
# store_index = "stores.json"

[encoding]
# JPEG quality for cache files (1-100).
quality = 100

# Copy any source bytes the decoder did not consume after the encoded JPEG.
# Only useful for byte-for-byte compatibility with older cache files.
append_trailing_bytes = false
"##
}
