//! Media locators and their provenance.
//!
//! A picker hands back an opaque URI. Before anything touches the disk, the
//! locator is parsed once and classified into a [`LocatorClass`], which the
//! [`resolve`](crate::resolve) module dispatches on. String comparisons against
//! provider authorities happen here and nowhere else.
//!
//! ## Recognized shapes
//!
//! ```text
//! file:///storage/emulated/0/Pictures/a.jpg                          → DirectFile
//! content://com.android.externalstorage.documents/document/primary%3ADCIM%2Fa.jpg
//!                                                                     → ExternalStorage
//! content://com.android.providers.downloads.documents/document/17   → Downloads
//! content://com.android.providers.media.documents/document/image%3A42 → Media
//! content://com.google.android.apps.photos.content/0/1/mediakey%3A…  → PhotoLibrary
//! content://media/external/images/media/42                           → GenericStore
//! anything else                                                       → OpaqueStream
//! ```
//!
//! Document ids live in the last path segment after `document/` (or
//! `tree/<tree-id>/document/<id>`) and are percent-decoded before use.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const EXTERNAL_STORAGE_AUTHORITY: &str = "com.android.externalstorage.documents";
pub const DOWNLOADS_AUTHORITY: &str = "com.android.providers.downloads.documents";
pub const MEDIA_AUTHORITY: &str = "com.android.providers.media.documents";

/// Authorities under which the photo library serves its content.
pub const PHOTO_LIBRARY_AUTHORITIES: &[&str] = &[
    "com.google.android.apps.photos.content",
    "com.google.android.apps.photos.contentprovider",
];

/// Store holding public downloads, addressed by appending the row id.
pub const DOWNLOADS_STORE: &str = "content://downloads/public_downloads";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("invalid locator {input:?}: {reason}")]
    Invalid { input: String, reason: String },
}

/// URI scheme of a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    File,
    Content,
    Other(String),
}

impl Scheme {
    fn from_str_lossy(scheme: &str) -> Self {
        if scheme.eq_ignore_ascii_case("file") {
            Scheme::File
        } else if scheme.eq_ignore_ascii_case("content") {
            Scheme::Content
        } else {
            Scheme::Other(scheme.to_ascii_lowercase())
        }
    }
}

/// A parsed, immutable media locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocator {
    raw: String,
    scheme: Scheme,
    authority: Option<String>,
    path: String,
    document_id: Option<String>,
}

impl MediaLocator {
    /// Parse an absolute URI string.
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let url = Url::parse(input).map_err(|e| LocatorError::Invalid {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = Scheme::from_str_lossy(url.scheme());
        let authority = url
            .host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        let path = decode(url.path());
        let document_id = url
            .path_segments()
            .and_then(|segments| document_id(&segments.collect::<Vec<_>>()));

        Ok(Self {
            raw: input.to_string(),
            scheme,
            authority,
            path,
            document_id,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Provider authority, `None` for bare file locators.
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// Percent-decoded path component.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Percent-decoded document id, present only for document-shaped locators.
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Classify the locator by provenance. First match wins:
    ///
    /// 1. external-storage document
    /// 2. downloads document
    /// 3. media document
    /// 4. any other document
    /// 5. plain content locator (photo library or generic store)
    /// 6. file locator
    /// 7. everything else
    pub fn class(&self) -> LocatorClass {
        if self.scheme == Scheme::Content
            && let Some(doc_id) = self.document_id()
        {
            return match self.authority() {
                Some(EXTERNAL_STORAGE_AUTHORITY) => {
                    let (volume, relative) = split_tag(doc_id);
                    LocatorClass::ExternalStorage {
                        volume: volume.to_string(),
                        relative: relative.to_string(),
                    }
                }
                Some(DOWNLOADS_AUTHORITY) => LocatorClass::Downloads(DownloadRef::parse(doc_id)),
                Some(MEDIA_AUTHORITY) => {
                    let (kind, id) = split_tag(doc_id);
                    LocatorClass::Media {
                        kind: MediaKind::from_tag(kind),
                        id: id.to_string(),
                    }
                }
                _ => LocatorClass::OtherDocument,
            };
        }

        match self.scheme {
            Scheme::Content => {
                if self
                    .authority()
                    .is_some_and(|a| PHOTO_LIBRARY_AUTHORITIES.contains(&a))
                {
                    LocatorClass::PhotoLibrary
                } else {
                    LocatorClass::GenericStore
                }
            }
            Scheme::File => LocatorClass::DirectFile(PathBuf::from(&self.path)),
            Scheme::Other(_) => LocatorClass::OpaqueStream,
        }
    }
}

impl FromStr for MediaLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Provenance of a locator, decided once at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorClass {
    /// External storage document: `<volume>:<relative path>`.
    ExternalStorage { volume: String, relative: String },
    /// Downloads document.
    Downloads(DownloadRef),
    /// Media document: `<kind>:<row id>`. Unknown kinds carry `None`.
    Media { kind: Option<MediaKind>, id: String },
    /// Document from a provider we have no path mapping for.
    OtherDocument,
    /// Photo library content that may not expose a data column.
    PhotoLibrary,
    /// Any other content locator, queried directly.
    GenericStore,
    /// `file://` locator.
    DirectFile(PathBuf),
    /// Opaque scheme, only readable as a stream.
    OpaqueStream,
}

/// Identifier portion of a downloads document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadRef {
    /// Numeric row in the public downloads store.
    Row(u64),
    /// `raw:<path>` ids carry the filesystem path directly.
    Raw(PathBuf),
    Malformed(String),
}

impl DownloadRef {
    fn parse(doc_id: &str) -> Self {
        if let Some(path) = doc_id.strip_prefix("raw:") {
            return DownloadRef::Raw(PathBuf::from(path));
        }
        match doc_id.parse::<u64>() {
            Ok(row) => DownloadRef::Row(row),
            Err(_) => DownloadRef::Malformed(doc_id.to_string()),
        }
    }

    /// Store URI for a numeric row, `None` otherwise.
    pub fn store_uri(&self) -> Option<String> {
        match self {
            DownloadRef::Row(row) => Some(format!("{DOWNLOADS_STORE}/{row}")),
            _ => None,
        }
    }
}

/// Media collections served by the media provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }

    /// External-volume store for this collection.
    pub fn store_uri(self) -> &'static str {
        match self {
            MediaKind::Image => "content://media/external/images/media",
            MediaKind::Video => "content://media/external/video/media",
            MediaKind::Audio => "content://media/external/audio/media",
        }
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Extract the document id from `document/<id>` or `tree/<t>/document/<id>`.
fn document_id(segments: &[&str]) -> Option<String> {
    match segments {
        ["document", id] | ["tree", _, "document", id] if !id.is_empty() => Some(decode(id)),
        _ => None,
    }
}

/// Split `tag:rest` at the first colon. Missing colon yields an empty rest.
fn split_tag(doc_id: &str) -> (&str, &str) {
    doc_id.split_once(':').unwrap_or((doc_id, ""))
}
