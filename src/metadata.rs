//! Result metadata for a materialized cache file.
//!
//! The response map handed back to callers:
//!
//! | Key | Value |
//! |---|---|
//! | `path` | absolute filesystem path |
//! | `uri` | `file://` + path |
//! | `fileSize` | byte length on disk, as a number |
//! | `type` | always `image/jpeg` |
//! | `fileName` | base name (`<uuid>.jpg`) |
//! | `data` | base64 (standard alphabet, no line breaks) of the re-encoded JPEG |
//!
//! ## Inline payload
//!
//! `data` is not the file read back verbatim. The file is decoded and encoded
//! again at full quality, so the payload is always a clean JPEG even when the
//! file on disk carries appended trailing bytes. A file that no longer decodes
//! has no response.

use crate::cache::{CacheFile, MIME_TYPE};
use crate::imaging::{self, ImagingError, Quality};
use crate::selector::ErrorKind;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssembleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssembleError::Io(_) => ErrorKind::StreamOpenFailed,
            AssembleError::Imaging(ImagingError::Decode(_)) => ErrorKind::DecodeFailed,
            AssembleError::Imaging(ImagingError::Io(_)) => ErrorKind::StreamOpenFailed,
            AssembleError::Imaging(ImagingError::Encode(_)) | AssembleError::Json(_) => {
                ErrorKind::EncodeFailed
            }
        }
    }
}

/// Response for one cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheResponse {
    pub path: String,
    pub uri: String,
    pub file_size: f64,
    #[serde(rename = "type")]
    pub r#type: String,
    pub file_name: String,
    pub data: String,
}

impl CacheResponse {
    /// The response as a JSON object.
    pub fn to_value(&self) -> Result<serde_json::Value, AssembleError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Raw JPEG bytes behind `data`.
    pub fn decode_data(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Build the response for a cache file.
#[tracing::instrument(skip_all, fields(path = %file.path.display()))]
pub fn assemble(file: &CacheFile) -> Result<CacheResponse, AssembleError> {
    let reader = BufReader::new(File::open(&file.path)?);
    let img = imaging::decode(reader)?;
    let jpeg = imaging::encode_jpeg_to_vec(&img, Quality::MAX)?;

    let path = file.path.to_string_lossy().into_owned();
    Ok(CacheResponse {
        uri: format!("file://{path}"),
        path,
        file_size: file.len as f64,
        r#type: MIME_TYPE.to_string(),
        file_name: file.file_name(),
        data: STANDARD.encode(jpeg),
    })
}
