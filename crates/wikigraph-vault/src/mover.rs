//! Transactional document moves.
//!
//! A move renames one document and retargets every link that resolved to
//! it. The whole change is one transaction over the lock set {source,
//! destination, linking documents}: all original content is captured before
//! the first mutation, and a failure at any step restores every document
//! that was already written and reverses the rename.

use crate::locks::{DocumentLocks, LockSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;
use wikigraph_core::utils::relative_path;
use wikigraph_core::{
    DocumentId, Error, LinkRecord, MetadataCodec, MoveStep, PathPolicy, Result, Storage,
};
use wikigraph_index::{BacklinkStore, LinkIndex, Resolution};
use wikigraph_parser::{build_link, extract_links, has_extension, replace_link};

/// Move behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOptions {
    /// Retarget links pointing at the moved document
    pub update_links: bool,
    /// Replace an existing destination
    pub overwrite: bool,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            update_links: true,
            overwrite: false,
        }
    }
}

/// Category before and after a move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Links retargeted in one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkUpdate {
    pub document: DocumentId,
    pub links_updated: usize,
}

/// Outcome of a successful move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub old_path: DocumentId,
    pub new_path: DocumentId,
    /// Present only when the category changed
    pub category_change: Option<CategoryChange>,
    /// Per-document counts, ordered by document
    pub updates: Vec<LinkUpdate>,
    pub total_links_updated: usize,
}

/// One linking document's planned rewrite
#[derive(Debug, Clone)]
struct Rewrite {
    document: DocumentId,
    original: String,
    updated: String,
    links: usize,
}

impl Rewrite {
    fn changed(&self) -> bool {
        self.original != self.updated
    }
}

/// Everything a move will write, computed before any mutation
#[derive(Debug)]
struct MovePlan {
    source: DocumentId,
    destination: DocumentId,
    source_original: String,
    /// Content of an overwritten destination
    destination_original: Option<String>,
    moved_content: String,
    moved_links: usize,
    category_change: Option<CategoryChange>,
    rewrites: Vec<Rewrite>,
}

impl MovePlan {
    fn original_of(&self, id: &DocumentId) -> Option<&str> {
        if *id == self.destination {
            return Some(&self.source_original);
        }
        self.rewrites
            .iter()
            .find(|r| r.document == *id)
            .map(|r| r.original.as_str())
    }

    fn report(&self) -> MoveReport {
        let mut updates: Vec<LinkUpdate> = self
            .rewrites
            .iter()
            .filter(|r| r.links > 0)
            .map(|r| LinkUpdate {
                document: r.document.clone(),
                links_updated: r.links,
            })
            .collect();
        if self.moved_links > 0 {
            updates.push(LinkUpdate {
                document: self.destination.clone(),
                links_updated: self.moved_links,
            });
        }
        updates.sort_by(|a, b| a.document.cmp(&b.document));

        MoveReport {
            old_path: self.source.clone(),
            new_path: self.destination.clone(),
            category_change: self.category_change.clone(),
            total_links_updated: updates.iter().map(|u| u.links_updated).sum(),
            updates,
        }
    }
}

/// Mutations already applied, in order
#[derive(Debug, Clone, PartialEq, Eq)]
enum Applied {
    Renamed,
    Wrote(DocumentId),
}

/// Recompute a link target for `new`, keeping the original's convention:
/// root-absolute (`/dir/x`), relative to the linking document (`../dir/x`),
/// corpus path (`dir/x`, for path targets that matched by lookup rather
/// than by joining) or a bare name. The extension is kept only when the
/// original had one.
pub fn retarget(
    original: &str,
    resolution: Resolution,
    linking_document: &DocumentId,
    new: &DocumentId,
) -> String {
    let original = original.trim();
    let path = target_path(original, new);

    if original.starts_with('/') {
        format!("/{}", path)
    } else if original.starts_with('.')
        || (original.contains('/') && resolution == Resolution::Exact)
    {
        relative_path(linking_document.parent(), path)
    } else if original.contains('/') {
        path.to_string()
    } else if has_extension(original) {
        new.file_name().to_string()
    } else {
        new.stem().to_string()
    }
}

fn target_path<'a>(original: &str, new: &'a DocumentId) -> &'a str {
    if has_extension(original) {
        new.as_str()
    } else {
        new.without_extension()
    }
}

/// Retarget `record` so that, once `old` is renamed to `new`, it still
/// resolves to `new` from `located_at`.
///
/// The conventional form is tried first. When it would bind to another
/// document it is upgraded to a relative path, then to a root-absolute one.
fn retarget_resolving(
    index: &LinkIndex,
    record: &LinkRecord,
    resolution: Resolution,
    located_at: &DocumentId,
    old: &DocumentId,
    new: &DocumentId,
) -> String {
    let original = record.target.trim();
    let candidates = [
        retarget(original, resolution, located_at, new),
        relative_path(located_at.parent(), target_path(original, new)),
        format!("/{}", new.without_extension()),
    ];

    candidates
        .into_iter()
        .find(|target| {
            let candidate = LinkRecord {
                target: target.clone(),
                ..record.clone()
            };
            index.resolve_after_rename(located_at, &candidate, old, new).as_ref() == Some(new)
        })
        .unwrap_or_else(|| {
            log::debug!("{} from {}: using the full path of {}", record.raw, located_at, new);
            format!("/{}", new)
        })
}

/// Apply `(old raw, new raw)` link replacements
fn rewrite_text(content: &str, links: &[(String, String)]) -> String {
    let mut text = content.to_string();
    let mut done: BTreeSet<&str> = BTreeSet::new();
    for (old_raw, new_raw) in links {
        if old_raw == new_raw || !done.insert(old_raw.as_str()) {
            continue;
        }
        let (updated, count) = replace_link(&text, old_raw, new_raw);
        log::trace!("{} -> {}: {} occurrence(s)", old_raw, new_raw, count);
        text = updated;
    }
    text
}

/// Moves documents through the storage, path policy and metadata
/// collaborators, keeping the backlink store in step.
pub struct DocumentMover {
    storage: Arc<dyn Storage>,
    policy: Arc<dyn PathPolicy>,
    codec: Arc<dyn MetadataCodec>,
    store: Arc<BacklinkStore>,
    locks: Arc<DocumentLocks>,
}

impl DocumentMover {
    pub fn new(
        storage: Arc<dyn Storage>,
        policy: Arc<dyn PathPolicy>,
        codec: Arc<dyn MetadataCodec>,
        store: Arc<BacklinkStore>,
        locks: Arc<DocumentLocks>,
    ) -> Self {
        Self {
            storage,
            policy,
            codec,
            store,
            locks,
        }
    }

    /// Move `source` to `destination`.
    ///
    /// # Errors
    /// - `InvalidPath` when either path fails the policy or both are equal
    /// - `NotFound` when the source does not exist
    /// - `AlreadyExists` when the destination exists and `overwrite` is off
    /// - `MoveFailed` when a step failed and every change was undone
    /// - `RollbackFailed` when undoing a failed step also failed
    #[instrument(skip(self, source, destination), fields(source = %source, destination = %destination), name = "move_document")]
    pub async fn move_document(
        &self,
        source: &DocumentId,
        destination: &DocumentId,
        options: MoveOptions,
    ) -> Result<MoveReport> {
        self.policy.validate(source)?;
        self.policy.validate(destination)?;
        if source == destination {
            return Err(Error::invalid_path(
                destination.as_str(),
                "source and destination are the same document",
            ));
        }

        let locks = self.lock_transaction(source, destination).await;

        if !self.storage.exists(source).await? {
            return Err(Error::not_found(source.as_str()));
        }
        let destination_exists = self.storage.exists(destination).await?;
        if destination_exists && !options.overwrite {
            return Err(Error::already_exists(destination.as_str()));
        }

        let plan = self
            .plan(source, destination, destination_exists, options)
            .await?;
        self.apply(&plan).await?;
        self.reindex(&plan);
        drop(locks);

        let report = plan.report();
        log::info!(
            "Moved {} -> {}: {} link(s) updated in {} document(s)",
            report.old_path,
            report.new_path,
            report.total_links_updated,
            report.updates.len()
        );
        Ok(report)
    }

    /// Lock source, destination and every document linking to the source.
    ///
    /// The linking set is re-read once the locks are held; when it grew in
    /// the meantime the locks are released and the larger set is acquired.
    async fn lock_transaction(&self, source: &DocumentId, destination: &DocumentId) -> LockSet {
        let mut wanted: BTreeSet<DocumentId> = BTreeSet::from([source.clone(), destination.clone()]);
        loop {
            wanted.extend(self.store.read().linking_sources(source));
            let locks = self.locks.acquire(wanted.iter().cloned()).await;

            let current = self.store.read().linking_sources(source);
            if current.iter().all(|id| locks.covers(id)) {
                return locks;
            }
            log::debug!("Documents linking to {} changed while locking; retrying", source);
        }
    }

    /// Link replacements for every link in `content` resolving to `old`.
    ///
    /// Resolution uses `resolve_from` (the document's pre-move identity);
    /// new targets are computed and checked from `located_at`.
    fn retargeted_links(
        &self,
        resolve_from: &DocumentId,
        located_at: &DocumentId,
        content: &str,
        old: &DocumentId,
        new: &DocumentId,
    ) -> Vec<(String, String)> {
        let index = self.store.read();
        extract_links(content)
            .into_iter()
            .filter(|record| !record.target.is_empty())
            .filter_map(|record| match index.resolve_with(resolve_from, &record) {
                Some((target, resolution)) if target == *old => Some((record, resolution)),
                _ => None,
            })
            .map(|(record, resolution)| {
                let target =
                    retarget_resolving(&index, &record, resolution, located_at, old, new);
                let link = build_link(
                    &target,
                    record.anchor.as_deref(),
                    record.display_text.as_deref(),
                );
                (record.raw, link)
            })
            .collect()
    }

    async fn capture(&self, id: &DocumentId) -> Result<String> {
        self.storage
            .read(id)
            .await
            .map_err(|e| Error::move_failed(id.as_str(), MoveStep::Capture, 0, e))
    }

    async fn plan(
        &self,
        source: &DocumentId,
        destination: &DocumentId,
        destination_exists: bool,
        options: MoveOptions,
    ) -> Result<MovePlan> {
        let source_original = self.capture(source).await?;
        let destination_original = if destination_exists {
            Some(self.capture(destination).await?)
        } else {
            None
        };

        let from = self.policy.category_of(source);
        let to = self.policy.category_of(destination);
        let mut moved_content = source_original.clone();
        let category_change = if from != to {
            if let Some(category) = &to {
                moved_content = self.codec.with_category(&moved_content, category)?;
            }
            Some(CategoryChange { from, to })
        } else {
            None
        };

        let mut moved_links = 0;
        let mut rewrites = Vec::new();
        if options.update_links {
            let self_links =
                self.retargeted_links(source, destination, &moved_content, source, destination);
            moved_links = self_links.len();
            moved_content = rewrite_text(&moved_content, &self_links);

            let linking = self.store.read().linking_sources(source);
            for document in linking {
                if document == *source || document == *destination {
                    continue;
                }
                let original = self.capture(&document).await?;
                let links =
                    self.retargeted_links(&document, &document, &original, source, destination);
                if links.is_empty() {
                    continue;
                }
                rewrites.push(Rewrite {
                    updated: rewrite_text(&original, &links),
                    links: links.len(),
                    document,
                    original,
                });
            }
        }

        Ok(MovePlan {
            source: source.clone(),
            destination: destination.clone(),
            source_original,
            destination_original,
            moved_content,
            moved_links,
            category_change,
            rewrites,
        })
    }

    async fn apply(&self, plan: &MovePlan) -> Result<()> {
        let mut applied = Vec::new();
        let Err((step, document, cause)) = self.apply_steps(plan, &mut applied).await else {
            return Ok(());
        };

        let failure = Error::move_failed(document.as_str(), step, applied.len(), cause);
        let failures = self.rollback(plan, &applied).await;
        if failures.is_empty() {
            log::warn!("Move rolled back: {}", failure);
            Err(failure)
        } else {
            log::error!("Move rollback incomplete: {}", failures.join("; "));
            Err(Error::rollback_failed(failure, failures))
        }
    }

    async fn apply_steps(
        &self,
        plan: &MovePlan,
        applied: &mut Vec<Applied>,
    ) -> std::result::Result<(), (MoveStep, DocumentId, Error)> {
        self.storage
            .rename(&plan.source, &plan.destination)
            .await
            .map_err(|e| (MoveStep::Rename, plan.source.clone(), e))?;
        applied.push(Applied::Renamed);

        if plan.moved_content != plan.source_original {
            self.storage
                .write(&plan.destination, &plan.moved_content)
                .await
                .map_err(|e| (MoveStep::RewriteMoved, plan.destination.clone(), e))?;
            applied.push(Applied::Wrote(plan.destination.clone()));
        }

        for rewrite in plan.rewrites.iter().filter(|r| r.changed()) {
            self.storage
                .write(&rewrite.document, &rewrite.updated)
                .await
                .map_err(|e| (MoveStep::RewriteLinks, rewrite.document.clone(), e))?;
            applied.push(Applied::Wrote(rewrite.document.clone()));
        }

        Ok(())
    }

    /// Undo `applied` in reverse order; returns a description per failure
    async fn rollback(&self, plan: &MovePlan, applied: &[Applied]) -> Vec<String> {
        let mut failures = Vec::new();

        for step in applied.iter().rev() {
            match step {
                Applied::Wrote(document) => {
                    let Some(original) = plan.original_of(document) else {
                        failures.push(format!("restore {}: no captured content", document));
                        continue;
                    };
                    if let Err(e) = self.storage.write(document, original).await {
                        failures.push(format!("restore {}: {}", document, e));
                    }
                }
                Applied::Renamed => {
                    if let Err(e) = self.storage.rename(&plan.destination, &plan.source).await {
                        failures.push(format!(
                            "rename {} back to {}: {}",
                            plan.destination, plan.source, e
                        ));
                        continue;
                    }
                    if let Some(previous) = &plan.destination_original
                        && let Err(e) = self.storage.write(&plan.destination, previous).await
                    {
                        failures.push(format!("restore {}: {}", plan.destination, e));
                    }
                }
            }
        }

        failures
    }

    fn reindex(&self, plan: &MovePlan) {
        self.store.rename(&plan.source, &plan.destination);
        self.store.update(&plan.destination, &plan.moved_content);
        for rewrite in plan.rewrites.iter().filter(|r| r.changed()) {
            self.store.update(&rewrite.document, &rewrite.updated);
        }
    }
}
