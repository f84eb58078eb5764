//! # Media Cache
//!
//! Turns a media locator handed out by a system picker into a local file the
//! caller owns: an upright JPEG under the cache directory, plus a response
//! describing it (path, URI, size, type, name, inline base64 payload).
//!
//! # Architecture: Resolve, Then Materialize
//!
//! ```text
//! locator ─→ resolve ─┬─ Path ──────────────────────────────→ existing file
//!                     ├─ Unresolved ────────────────────────→ error
//!                     └─ Defer ─→ materialize ─→ assemble ─→ CacheResponse
//! ```
//!
//! 1. **Resolve**: classify the locator by provenance and find a filesystem
//!    path if one exists, either directly or through a single-row store lookup.
//! 2. **Materialize**: open the locator as a stream, decode, rotate upright
//!    from EXIF orientation, re-encode as JPEG into a fresh cache file.
//! 3. **Assemble**: describe the cache file and embed its re-encoded bytes.
//!
//! Every operation takes the host context as an explicit [`host::MediaHost`]
//! argument. Nothing is global, and concurrent calls share only the
//! filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`locator`] | Parse locators and classify them by provenance |
//! | [`host`] | The host context trait, store queries, and the filesystem-backed [`host::LocalHost`] |
//! | [`resolve`] | Locator resolution and single-row `_data` lookups |
//! | [`materialize`] | Stream → decode → orient → JPEG cache file |
//! | [`cache`] | Cache path allocation (UUID names, optional sub-directory) |
//! | [`imaging`] | Decode, EXIF orientation, JPEG encode |
//! | [`metadata`] | Response assembly with base64 payload |
//! | [`selector`] | Entry point, error kinds, bridge error codes |
//! | [`config`] | Picker option map and host config file |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Locator Classes
//!
//! Provenance is decided once, in [`locator::MediaLocator::class`], into a
//! closed [`locator::LocatorClass`]. Resolution matches on that enum; no
//! later step compares authority strings again.
//!
//! ## Lookups Never Fail
//!
//! A store query that errors, returns no row, or returns an empty `_data`
//! value is a miss. Misses fall through to materialization (or, for plain
//! content locators, to [`resolve::Resolution::Unresolved`]). The error is
//! logged at debug level and goes no further.
//!
//! ## Scoped Handles
//!
//! Streams, cursors and metadata readers are owned boxes released on drop.
//! A failed materialization removes its partial destination file.
//!
//! ## Typed Failures
//!
//! Every failure carries a [`selector::ErrorKind`], which maps onto the picker
//! bridge's numeric error codes. Callers that only understand absence use
//! [`selector::create_cache_file_opt`].

pub mod cache;
pub mod config;
pub mod host;
pub mod imaging;
pub mod locator;
pub mod materialize;
pub mod metadata;
pub mod output;
pub mod resolve;
pub mod selector;

#[cfg(test)]
pub(crate) mod test_helpers;
