//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Resolve
//!
//! ```text
//! content://com.android.providers.downloads.documents/document/42
//!     Class: downloads (row 42)
//!     Path: /storage/emulated/0/Download/a.jpg
//! ```
//!
//! A locator that needs materializing shows `Defer` in place of the path, one
//! whose store had nothing shows `Unresolved`.
//!
//! ## Cache
//!
//! ```text
//! content://com.example.provider/picked/1
//!     Path: .media-cache/sel/0f8fad5b-d9cb-469f-a165-70867728950e.jpg
//!     URI: file://.media-cache/sel/0f8fad5b-d9cb-469f-a165-70867728950e.jpg
//!     Size: 18.2 KB
//!     Type: image/jpeg
//!     Data: /9j/4AAQSkZJRgABAgAAAQABAAD/2wBDAAEBAQEBAQEBAQEBAQEB... (24680 chars)
//! ```
//!
//! ## Errors
//!
//! ```text
//! content://com.example.provider/picked/1
//!     Error 106 (decode_failed): Failed to decode ...
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::locator::{DownloadRef, LocatorClass, MediaLocator};
use crate::metadata::CacheResponse;
use crate::resolve::Resolution;
use crate::selector::CacheError;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Human-readable byte size with one decimal above 1 KB.
fn format_size(bytes: f64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024.0 {
        return format!("{bytes} B");
    }
    let mut value = bytes / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn class_label(class: &LocatorClass) -> String {
    match class {
        LocatorClass::ExternalStorage { volume, .. } => format!("external storage ({volume})"),
        LocatorClass::Downloads(DownloadRef::Row(row)) => format!("downloads (row {row})"),
        LocatorClass::Downloads(DownloadRef::Raw(_)) => "downloads (raw path)".to_string(),
        LocatorClass::Downloads(DownloadRef::Malformed(id)) => format!("downloads (unparsed id {id})"),
        LocatorClass::Media { kind: Some(kind), id } => {
            format!("media ({} {id})", format!("{kind:?}").to_lowercase())
        }
        LocatorClass::Media { kind: None, id } => format!("media (unknown kind, {id})"),
        LocatorClass::OtherDocument => "other document".to_string(),
        LocatorClass::PhotoLibrary => "photo library".to_string(),
        LocatorClass::GenericStore => "content store".to_string(),
        LocatorClass::DirectFile(_) => "file".to_string(),
        LocatorClass::OpaqueStream => "opaque stream".to_string(),
    }
}

// ============================================================================
// Resolve
// ============================================================================

pub fn format_resolution(locator: &MediaLocator, resolution: &Resolution) -> Vec<String> {
    let outcome = match resolution {
        Resolution::Path(path) => format!("Path: {}", path.display()),
        Resolution::Unresolved => "Unresolved".to_string(),
        Resolution::Defer => "Defer".to_string(),
    };
    vec![
        locator.to_string(),
        format!("{}Class: {}", indent(1), class_label(&locator.class())),
        format!("{}{outcome}", indent(1)),
    ]
}

pub fn print_resolution(locator: &MediaLocator, resolution: &Resolution) {
    for line in format_resolution(locator, resolution) {
        println!("{}", line);
    }
}

// ============================================================================
// Cache
// ============================================================================

pub fn format_response(locator: &MediaLocator, response: &CacheResponse) -> Vec<String> {
    vec![
        locator.to_string(),
        format!("{}Path: {}", indent(1), response.path),
        format!("{}URI: {}", indent(1), response.uri),
        format!("{}Size: {}", indent(1), format_size(response.file_size)),
        format!("{}Type: {}", indent(1), response.r#type),
        format!(
            "{}Data: {} ({} chars)",
            indent(1),
            truncate(&response.data, 48),
            response.data.len()
        ),
    ]
}

pub fn print_response(locator: &MediaLocator, response: &CacheResponse) {
    for line in format_response(locator, response) {
        println!("{}", line);
    }
}

pub fn format_error(locator: &MediaLocator, err: &CacheError) -> Vec<String> {
    vec![
        locator.to_string(),
        format!("{}Error {} ({}): {}", indent(1), err.code(), err.kind(), err),
    ]
}

pub fn print_error(locator: &MediaLocator, err: &CacheError) {
    for line in format_error(locator, err) {
        eprintln!("{}", line);
    }
}
