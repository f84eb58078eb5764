//! Cache file allocation.
//!
//! Every materialized image gets a fresh file under the host cache directory:
//!
//! ```text
//! <cache_dir>/<storageOptions.path>/<uuid-v4>.jpg    sub-path given and usable
//! <cache_dir>/<uuid-v4>.jpg                          otherwise
//! ```
//!
//! # Design
//!
//! ## Naming
//!
//! Names are random v4 UUIDs. Two calls never share a name, so concurrent
//! callers need no locking and nothing is ever overwritten. There is no
//! collision check: the identifier space is the guarantee.
//!
//! ## Fallback
//!
//! [`allocate`] never fails. A missing or blank sub-path, or a sub-path whose
//! directory cannot be created (read-only parent or a file in the way),
//! silently drops back to the flat layout. The directory is only created when
//! it does not already exist.
//!
//! ## Containment
//!
//! The sub-path is always nested under the cache directory. Root prefixes,
//! `.` and `..` segments are dropped, so `/data/sel` becomes
//! `<cache_dir>/data/sel` and `../sel` becomes `<cache_dir>/sel`.
//!
//! ## Lifetime
//!
//! Cache files belong to the cache directory. Nothing here deletes them; the
//! platform's cache trimming is the only eviction.

use crate::config::PickerOptions;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// MIME type of every cache file. The pipeline always re-encodes to JPEG.
pub const MIME_TYPE: &str = "image/jpeg";

/// Extension of every cache file.
pub const EXTENSION: &str = "jpg";

/// A materialized cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFile {
    pub path: PathBuf,
    pub len: u64,
}

impl CacheFile {
    /// Describe an existing file on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let len = std::fs::metadata(&path)?.len();
        Ok(Self { path, len })
    }

    /// Base name, e.g. `1b4e28ba-2fa1-11d2-883f-0016d3cca427.jpg`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }
}

/// Generate a fresh cache file name.
pub fn random_file_name() -> String {
    format!("{}.{EXTENSION}", Uuid::new_v4())
}

/// Pick a destination path for a new cache file.
pub fn allocate(cache_dir: &Path, options: &PickerOptions) -> PathBuf {
    let file_name = random_file_name();

    let Some(sub_path) = options.storage_sub_path() else {
        return cache_dir.join(file_name);
    };

    // Plain segments only; the sub-directory stays under the cache dir
    let relative: PathBuf = Path::new(sub_path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    if relative.as_os_str().is_empty() {
        return cache_dir.join(file_name);
    }

    let dir = cache_dir.join(relative);
    if dir.is_dir() {
        return dir.join(file_name);
    }
    match std::fs::create_dir_all(&dir) {
        Ok(()) => {
            tracing::debug!(dir = %dir.display(), "created cache sub-directory");
            dir.join(file_name)
        }
        Err(e) => {
            tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "cache sub-directory unavailable, falling back to cache root"
            );
            cache_dir.join(file_name)
        }
    }
}
