//! Per-document lock registry for multi-document transactions.

use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use wikigraph_core::DocumentId;

/// Guards held for the duration of one transaction
#[derive(Debug)]
pub struct LockSet {
    ids: Vec<DocumentId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    /// Locked identities in acquisition order
    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    pub fn covers(&self, id: &DocumentId) -> bool {
        self.ids.binary_search(id).is_ok()
    }
}

/// Lock registry keyed by document identity.
///
/// Lock sets are acquired in sorted identity order, so two transactions
/// over overlapping sets cannot deadlock.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: DashMap<DocumentId, Arc<Mutex<()>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: &DocumentId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock a single document
    pub async fn acquire_one(&self, id: &DocumentId) -> LockSet {
        self.acquire([id.clone()]).await
    }

    /// Lock every identity in `ids` (duplicates collapse), in sorted order
    pub async fn acquire<I>(&self, ids: I) -> LockSet
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let ids: Vec<DocumentId> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            guards.push(self.lock_for(id).lock_owned().await);
        }
        LockSet {
            ids,
            _guards: guards,
        }
    }

    /// Number of identities with a registered lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
