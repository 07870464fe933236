//! # Wikigraph Vault
//!
//! Storage, path policy and metadata collaborators, plus the transactional
//! [`DocumentMover`].
//!
//! This crate provides:
//! - [`FsStorage`]: documents as files under a root directory, written via a
//!   temp file and rename; listing filtered by extension and excluded names
//! - [`MemoryStorage`]: an in-memory store for tests and ephemeral corpora
//! - [`TopSegmentPolicy`]: identity validation and folder-derived categories
//! - [`FrontmatterCodec`]: YAML front matter parsing and category rewrites
//! - [`DocumentLocks`]: per-document async locks acquired in sorted order
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use wikigraph_core::{DocumentId, IndexConfig, Storage};
//! use wikigraph_index::BacklinkStore;
//! use wikigraph_vault::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> wikigraph_core::Result<()> {
//! let config = IndexConfig::default();
//! let storage = Arc::new(MemoryStorage::with_documents([
//!     ("projects/x.md", "# X"),
//!     ("notes/a.md", "See [[/projects/x]]"),
//! ]));
//! let store = Arc::new(BacklinkStore::new(&config));
//! for id in storage.list().await? {
//!     store.update(&id, &storage.read(&id).await?);
//! }
//!
//! let mover = DocumentMover::new(
//!     storage.clone(),
//!     Arc::new(TopSegmentPolicy::new(&config)),
//!     Arc::new(FrontmatterCodec),
//!     store.clone(),
//!     Arc::new(DocumentLocks::new()),
//! );
//! let report = mover
//!     .move_document(
//!         &DocumentId::new("projects/x.md"),
//!         &DocumentId::new("archives/x.md"),
//!         MoveOptions::default(),
//!     )
//!     .await?;
//!
//! assert_eq!(report.total_links_updated, 1);
//! assert_eq!(
//!     storage.read(&DocumentId::new("notes/a.md")).await?,
//!     "See [[/archives/x]]"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Move Transactions
//!
//! A move locks the source, the destination and every document linking to
//! the source, captures their content, renames, then rewrites. Any failure
//! restores the written documents and reverses the rename before
//! `MoveFailed` is returned; `RollbackFailed` means the restore itself did
//! not complete.

pub mod locks;
pub mod metadata;
pub mod mover;
pub mod policy;
pub mod storage;

pub use locks::{DocumentLocks, LockSet};
pub use metadata::FrontmatterCodec;
pub use mover::{CategoryChange, DocumentMover, LinkUpdate, MoveOptions, MoveReport, retarget};
pub use policy::TopSegmentPolicy;
pub use storage::{FsStorage, MemoryStorage};

pub mod prelude {
    pub use crate::locks::DocumentLocks;
    pub use crate::metadata::FrontmatterCodec;
    pub use crate::mover::{DocumentMover, MoveOptions, MoveReport};
    pub use crate::policy::TopSegmentPolicy;
    pub use crate::storage::{FsStorage, MemoryStorage};
    pub use wikigraph_core::prelude::*;
}
