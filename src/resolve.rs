//! Locator resolution: find a readable path without copying bytes.
//!
//! Each [`LocatorClass`] maps to exactly one strategy:
//!
//! | Class | Strategy | On miss |
//! |---|---|---|
//! | external storage, `primary` volume | `<public storage root>/<relative>`, no I/O | defer |
//! | downloads, numeric id | `_data` of `content://downloads/public_downloads/<id>` | defer |
//! | downloads, `raw:<path>` | the path itself | |
//! | media, `image`/`video`/`audio` | `_data` of the kind's store where `_id=?` | defer |
//! | any other document | | defer |
//! | photo library | `_data` of the locator itself | defer |
//! | any other content locator | `_data` of the locator itself | unresolved |
//! | `file` | path component, no I/O | |
//! | anything else | | defer |
//!
//! "Defer" hands the locator to the stream materializer. "Unresolved" is
//! final: the store answered and had nothing.
//!
//! Store lookups never fail. A query error, an empty result or a missing
//! `_data` column all read as "no value" and are logged at debug level.

use crate::cache::CacheFile;
use crate::config::PickerOptions;
use crate::host::{DATA_COLUMN, HostError, ID_COLUMN, MediaHost, StoreQuery};
use crate::locator::{DownloadRef, LocatorClass, MediaLocator};
use crate::materialize::{self, MaterializeOptions};
use crate::selector::CacheError;
use std::path::PathBuf;

/// Outcome of resolving a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The locator already denotes a readable file.
    Path(PathBuf),
    /// A store was consulted and had no path for the locator.
    Unresolved,
    /// No path is available; the bytes must be materialized.
    Defer,
}

impl Resolution {
    fn from_lookup(value: Option<String>, on_miss: Resolution) -> Self {
        match value {
            Some(path) => Resolution::Path(PathBuf::from(path)),
            None => on_miss,
        }
    }
}

#[tracing::instrument(skip_all, fields(locator = %locator))]
pub fn resolve(host: &dyn MediaHost, locator: &MediaLocator) -> Resolution {
    let resolution = match locator.class() {
        LocatorClass::ExternalStorage { volume, relative } => {
            if volume.eq_ignore_ascii_case("primary") {
                Resolution::Path(
                    host.public_storage_root()
                        .join(relative.trim_start_matches('/')),
                )
            } else {
                Resolution::Defer
            }
        }
        LocatorClass::Downloads(DownloadRef::Raw(path)) => Resolution::Path(path),
        LocatorClass::Downloads(download) => match download.store_uri() {
            Some(store) => Resolution::from_lookup(
                lookup_data_column(host, &store, None, &[]),
                Resolution::Defer,
            ),
            None => Resolution::Defer,
        },
        LocatorClass::Media {
            kind: Some(kind),
            id,
        } => {
            let selection = format!("{ID_COLUMN}=?");
            Resolution::from_lookup(
                lookup_data_column(host, kind.store_uri(), Some(selection.as_str()), &[id.as_str()]),
                Resolution::Defer,
            )
        }
        LocatorClass::Media { kind: None, .. } | LocatorClass::OtherDocument => Resolution::Defer,
        LocatorClass::PhotoLibrary => Resolution::from_lookup(
            lookup_data_column(host, locator.as_str(), None, &[]),
            Resolution::Defer,
        ),
        LocatorClass::GenericStore => Resolution::from_lookup(
            lookup_data_column(host, locator.as_str(), None, &[]),
            Resolution::Unresolved,
        ),
        LocatorClass::DirectFile(path) => Resolution::Path(path),
        LocatorClass::OpaqueStream => Resolution::Defer,
    };
    tracing::debug!(?resolution, "resolved locator");
    resolution
}

/// Single-row lookup of the `_data` column.
///
/// Returns the first row's non-empty value. Every failure is "no value".
pub fn lookup_data_column(
    host: &dyn MediaHost,
    store: &str,
    selection: Option<&str>,
    args: &[&str],
) -> Option<String> {
    let query = StoreQuery::data_column(store, selection, args);
    match first_data_value(host, &query) {
        Ok(Some(value)) if !value.is_empty() => Some(value),
        Ok(_) => {
            tracing::debug!(store, "store lookup found no data");
            None
        }
        Err(e) => {
            tracing::debug!(store, error = %e, "store lookup failed");
            None
        }
    }
}

fn first_data_value(host: &dyn MediaHost, query: &StoreQuery) -> Result<Option<String>, HostError> {
    let mut cursor = host.query(query)?;
    let Some(row) = cursor.next_row()? else {
        return Ok(None);
    };
    Ok(row.get_string(DATA_COLUMN)?.map(str::to_string))
}

/// Resolve a locator to a readable path, materializing a cache file when
/// resolution defers.
#[tracing::instrument(skip_all, fields(locator = %locator))]
pub fn get_path(
    host: &dyn MediaHost,
    locator: &MediaLocator,
    options: &PickerOptions,
    settings: &MaterializeOptions,
) -> Result<PathBuf, CacheError> {
    match resolve(host, locator) {
        Resolution::Path(path) => Ok(path),
        Resolution::Unresolved => Err(CacheError::Unresolved(locator.to_string())),
        Resolution::Defer => {
            let CacheFile { path, .. } =
                materialize::materialize(host, locator, options, settings)?;
            Ok(path)
        }
    }
}
