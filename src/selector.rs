//! Entry point: locator in, cache file response out.
//!
//! [`create_cache_file`] always materializes. It never hands back the
//! provider's own file, so the response describes a copy the caller owns:
//!
//! ```text
//! locator ─→ materialize ─→ CacheFile ─→ assemble ─→ CacheResponse
//! ```
//!
//! # Errors
//!
//! Every failure carries an [`ErrorKind`]. Bridges that can only signal
//! absence use [`create_cache_file_opt`]; bridges that can reject with a code
//! use [`ErrorResponse`], which maps kinds onto the picker's numeric codes:
//!
//! | Kind | Code |
//! |---|---|
//! | `AllocationFailed`, `EncodeFailed` | 104 `FILE_CREATE_ERROR` |
//! | `StoreLookupFailed`, `StreamOpenFailed` | 105 `NOT_VALID_PATH` |
//! | `DecodeFailed` | 106 `FAIL_TO_PICK_IMAGE` |

use crate::config::PickerOptions;
use crate::host::MediaHost;
use crate::locator::MediaLocator;
use crate::materialize::{self, MaterializeError, MaterializeOptions};
use crate::metadata::{self, AssembleError, CacheResponse};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const FILE_CREATE_ERROR: i32 = 104;
pub const NOT_VALID_PATH: i32 = 105;
pub const FAIL_TO_PICK_IMAGE: i32 = 106;

/// Failure category, stable across error sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    StoreLookupFailed,
    StreamOpenFailed,
    DecodeFailed,
    EncodeFailed,
    AllocationFailed,
}

impl ErrorKind {
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::AllocationFailed | ErrorKind::EncodeFailed => FILE_CREATE_ERROR,
            ErrorKind::StoreLookupFailed | ErrorKind::StreamOpenFailed => NOT_VALID_PATH,
            ErrorKind::DecodeFailed => FAIL_TO_PICK_IMAGE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::StoreLookupFailed => "store_lookup_failed",
            ErrorKind::StreamOpenFailed => "stream_open_failed",
            ErrorKind::DecodeFailed => "decode_failed",
            ErrorKind::EncodeFailed => "encode_failed",
            ErrorKind::AllocationFailed => "allocation_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No path for {0}")]
    Unresolved(String),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error("Failed to assemble response: {0}")]
    Assemble(#[from] AssembleError),
}

impl CacheError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::Unresolved(_) => ErrorKind::StoreLookupFailed,
            CacheError::Materialize(e) => e.kind(),
            CacheError::Assemble(e) => e.kind(),
        }
    }

    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}

/// Rejection payload for bridges that report failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CacheError> for ErrorResponse {
    fn from(err: &CacheError) -> Self {
        Self {
            code: err.code(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Copy the image behind `locator` into the cache and describe the result.
#[tracing::instrument(skip_all, fields(locator = %locator))]
pub fn create_cache_file(
    host: &dyn MediaHost,
    locator: &MediaLocator,
    options: &PickerOptions,
    settings: &MaterializeOptions,
) -> Result<CacheResponse, CacheError> {
    let file = materialize::materialize(host, locator, options, settings)?;
    let response = metadata::assemble(&file)?;
    Ok(response)
}

/// [`create_cache_file`] for callers that only distinguish success from
/// absence. The error is logged, then dropped.
pub fn create_cache_file_opt(
    host: &dyn MediaHost,
    locator: &MediaLocator,
    options: &PickerOptions,
    settings: &MaterializeOptions,
) -> Option<CacheResponse> {
    match create_cache_file(host, locator, options, settings) {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!(locator = %locator, kind = %e.kind(), error = %e, "cache file not created");
            None
        }
    }
}
