//! Thread-safe backlink store over a [`LinkIndex`].
//!
//! Link extraction happens before the shared lock is taken. Updates to the
//! same identity are serialized through a per-document lock registry, so the
//! last completed update wins and no update is ever partially applied.

use crate::link_index::{Backlink, BrokenLinks, IndexedLink, LinkIndex, LinkStats, prepare_links};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wikigraph_core::{DocumentId, IndexConfig, Page, Paginated};

/// Ranking size used by [`BacklinkStore::get_stats`]
pub const DEFAULT_STATS_TOP_N: usize = 10;

/// Backlinks of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklinkList {
    pub target: DocumentId,
    /// Ordered by source identity, then byte offset
    pub entries: Vec<Backlink>,
    pub total: usize,
}

/// Shared backlink graph store
pub struct BacklinkStore {
    index: RwLock<LinkIndex>,
    /// Per-document update locks
    locks: DashMap<DocumentId, Arc<Mutex<()>>>,
    snippet_radius: usize,
}

impl BacklinkStore {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            index: RwLock::new(LinkIndex::new(config)),
            locks: DashMap::new(),
            snippet_radius: config.snippet_radius,
        }
    }

    fn document_lock(&self, id: &DocumentId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Re-extract a document's links and install them. Returns the number of
    /// link records installed.
    pub fn update(&self, id: &DocumentId, content: &str) -> usize {
        let lock = self.document_lock(id);
        let _guard = lock.lock();

        let links = prepare_links(content, self.snippet_radius);
        let count = self.index.write().install(id, links);

        log::debug!("Updated links for {}: {} records", id, count);
        count
    }

    /// Install links that were extracted elsewhere
    pub fn update_prepared(&self, id: &DocumentId, links: Vec<IndexedLink>) -> usize {
        let lock = self.document_lock(id);
        let _guard = lock.lock();
        self.index.write().install(id, links)
    }

    /// Register an identity without content
    pub fn register(&self, id: &DocumentId) -> bool {
        self.index.write().insert_document(id)
    }

    pub fn remove(&self, id: &DocumentId) -> bool {
        let lock = self.document_lock(id);
        let _guard = lock.lock();
        let removed = self.index.write().remove_document(id);
        if removed {
            // only the registry and this call hold the lock; anyone else
            // still waiting on it keeps the entry alive
            self.locks
                .remove_if(id, |_, entry| Arc::strong_count(entry) == 2);
        }
        removed
    }

    /// Number of identities with a registered update lock
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Move an identity's entries to a new identity
    pub fn rename(&self, old: &DocumentId, new: &DocumentId) -> bool {
        let (first, second) = if old <= new { (old, new) } else { (new, old) };
        let first_lock = self.document_lock(first);
        let second_lock = self.document_lock(second);
        let _first = first_lock.lock();
        let _second = (first != second).then(|| second_lock.lock());

        self.index.write().rename_document(old, new)
    }

    /// Every backlink of `id`; unknown identities yield an empty list
    pub fn get_backlinks(&self, id: &DocumentId) -> BacklinkList {
        let index = self.index.read();
        let entries = index.backlink_entries(id).to_vec();
        BacklinkList {
            target: id.clone(),
            total: entries.len(),
            entries,
        }
    }

    pub fn get_stats(&self) -> LinkStats {
        self.stats(DEFAULT_STATS_TOP_N)
    }

    pub fn stats(&self, top_n: usize) -> LinkStats {
        self.index.read().stats(top_n)
    }

    pub fn forward(&self, id: &DocumentId, include_broken: bool, page: Page) -> Paginated<IndexedLink> {
        self.index.read().forward(id, include_broken, page)
    }

    pub fn backlinks(&self, id: &DocumentId, page: Page) -> Paginated<Backlink> {
        self.index.read().backlinks(id, page)
    }

    pub fn orphaned(&self, page: Page) -> Paginated<DocumentId> {
        self.index.read().orphaned(page)
    }

    pub fn broken(&self, page: Page) -> Paginated<BrokenLinks> {
        self.index.read().broken(page)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.index.read().contains(id)
    }

    /// Read access to the underlying index for snapshot consumers
    pub fn read(&self) -> RwLockReadGuard<'_, LinkIndex> {
        self.index.read()
    }
}
