//! The host context every call runs against.
//!
//! | Capability | Trait method |
//! |---|---|
//! | **Open a content stream** | [`MediaHost::open_stream`] |
//! | **Query a structured store** | [`MediaHost::query`] → [`StoreCursor`] |
//! | **Embedded metadata channel** | [`MediaHost::orientation_source`] |
//! | **Directories** | [`MediaHost::cache_dir`], [`MediaHost::public_storage_root`] |
//!
//! The context is an explicit value passed into every operation. Nothing in
//! the crate reaches for process-wide state.
//!
//! The module is split into:
//! - **Context**: [`MediaHost`] trait, [`HostError`], and the metadata reader alias
//! - **Store**: query/row/cursor types and the in-memory [`StoreIndex`]
//! - **Local**: [`LocalHost`], a filesystem-backed host used by the CLI and tests

pub mod context;
pub mod local;
pub mod store;

pub use context::{HostError, MediaHost, MetadataReader};
pub use local::LocalHost;
pub use store::{DATA_COLUMN, ID_COLUMN, StoreCursor, StoreIndex, StoreQuery, StoreRow};
