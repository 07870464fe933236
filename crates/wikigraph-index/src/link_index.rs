//! Incrementally maintained forward/backward link index.
//!
//! Forward entries are the source of truth; backlink entries are derived from
//! them and rebuilt only for the targets a change touches.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use wikigraph_core::utils::join_relative;
use wikigraph_core::{DocumentId, IndexConfig, LinkRecord, Page, Paginated, SourcePosition};
use wikigraph_parser::{extract_links, link_context, normalize_target, target_stem};

/// A forward link paired with its resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedLink {
    pub record: LinkRecord,
    /// Resolved identity, `None` when the link is broken
    pub target: Option<DocumentId>,
    pub context: String,
}

impl IndexedLink {
    pub fn is_broken(&self) -> bool {
        self.target.is_none()
    }
}

/// One inbound link occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backlink {
    pub source: DocumentId,
    /// Literal link text as written in the source
    pub link_text: String,
    pub context: Option<String>,
    pub position: SourcePosition,
}

/// A document with at least one unresolved link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenLinks {
    pub source: DocumentId,
    /// Distinct unresolved targets, in first-occurrence order
    pub targets: Vec<String>,
}

/// Aggregate link statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub document_count: usize,
    pub link_count: usize,
    pub resolved_links: usize,
    pub broken_links: usize,
    /// Documents with at least one inbound link
    pub documents_with_backlinks: usize,
    /// (identity, inbound count), descending
    pub most_linked: Vec<(DocumentId, usize)>,
    /// (identity, outbound count), descending
    pub most_linking: Vec<(DocumentId, usize)>,
}

/// Extract a document's links with context snippets, unresolved.
///
/// This is the expensive half of indexing and needs no access to the index.
pub fn prepare_links(text: &str, snippet_radius: usize) -> Vec<IndexedLink> {
    extract_links(text)
        .into_iter()
        .map(|record| IndexedLink {
            context: link_context(text, &record.position, snippet_radius),
            target: None,
            record,
        })
        .collect()
}

/// How a link found its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Joined to the source's directory, or to the root for `/` targets
    Exact,
    /// Corpus-wide normalized key
    Lookup,
}

/// Path key: every segment normalized on its own, joined under a leading
/// `/` so path keys never collide with stem keys
fn path_key(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .map(normalize_target)
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

fn is_key(key: &str) -> bool {
    !key.is_empty() && key != "/"
}

/// Lookup keys a document answers to: normalized stem and extension-less path
fn document_keys(id: &DocumentId) -> Vec<String> {
    let mut keys = vec![normalize_target(id.stem()), path_key(id.without_extension())];
    keys.retain(|k| is_key(k));
    keys
}

/// Keys a link target may be looked up under, most specific first.
///
/// Bare names use stem keys; targets with a `/` use path keys only.
fn lookup_keys(target: &str) -> Vec<String> {
    let target = target.trim();
    let qualified = target.contains('/');
    let name = target.rsplit('/').next().unwrap_or_default();
    let ext_len = name.len() - target_stem(target).len();
    let without_ext = &target[..target.len() - ext_len];

    let key = |s: &str| {
        if qualified {
            path_key(s)
        } else {
            normalize_target(s)
        }
    };
    let mut keys = vec![key(without_ext)];
    let full = key(target);
    if !keys.contains(&full) {
        keys.push(full);
    }
    keys.retain(|k| is_key(k));
    keys
}

/// Identity set seen by resolution, optionally with one identity swapped
/// for another
#[derive(Debug, Clone, Copy, Default)]
struct View<'a> {
    without: Option<&'a DocumentId>,
    with: Option<&'a DocumentId>,
}

/// Name-level keys relating link targets to the documents they could hit
fn target_reference_keys(target: &str) -> Vec<String> {
    let name = target.trim().rsplit('/').next().unwrap_or_default();
    let mut keys = vec![normalize_target(target_stem(name))];
    let full = normalize_target(name);
    if !keys.contains(&full) {
        keys.push(full);
    }
    keys.retain(|k| !k.is_empty());
    keys
}

fn document_reference_keys(id: &DocumentId) -> Vec<String> {
    let mut keys = vec![normalize_target(id.stem())];
    let full = normalize_target(id.file_name());
    if !keys.contains(&full) {
        keys.push(full);
    }
    keys.retain(|k| !k.is_empty());
    keys
}

fn ranked(mut counts: Vec<(DocumentId, usize)>, top_n: usize) -> Vec<(DocumentId, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(top_n);
    counts
}

/// Forward and backward link index over a set of known identities
#[derive(Debug, Clone)]
pub struct LinkIndex {
    extensions: Vec<String>,
    snippet_radius: usize,
    orphan_exempt: Vec<String>,

    /// Every known identity
    documents: BTreeSet<DocumentId>,

    /// Normalized lookup key -> identities answering to it
    keys: HashMap<String, BTreeSet<DocumentId>>,

    /// Source -> links in document order
    forward: HashMap<DocumentId, Vec<IndexedLink>>,

    /// Target -> inbound occurrences sorted by (source, offset)
    inbound: HashMap<DocumentId, Vec<Backlink>>,

    /// Target name key -> sources holding a link with that key
    references: HashMap<String, BTreeSet<DocumentId>>,
}

impl LinkIndex {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            snippet_radius: config.snippet_radius,
            orphan_exempt: config.orphan_exempt.clone(),
            documents: BTreeSet::new(),
            keys: HashMap::new(),
            forward: HashMap::new(),
            inbound: HashMap::new(),
            references: HashMap::new(),
        }
    }

    pub fn snippet_radius(&self) -> usize {
        self.snippet_radius
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.contains(id)
    }

    /// Known identities in sorted order
    pub fn documents(&self) -> impl Iterator<Item = &DocumentId> {
        self.documents.iter()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Resolve one link record from `source`.
    ///
    /// Exact relative resolution first, then corpus-wide normalized lookup
    /// (smallest identity wins), else broken.
    pub fn resolve(&self, source: &DocumentId, record: &LinkRecord) -> Option<DocumentId> {
        self.resolve_in(source, record, View::default())
            .map(|(id, _)| id)
    }

    /// Like [`LinkIndex::resolve`], also reporting which step matched
    pub fn resolve_with(
        &self,
        source: &DocumentId,
        record: &LinkRecord,
    ) -> Option<(DocumentId, Resolution)> {
        self.resolve_in(source, record, View::default())
    }

    /// Resolve as if `old` had already been renamed to `new`
    pub fn resolve_after_rename(
        &self,
        source: &DocumentId,
        record: &LinkRecord,
        old: &DocumentId,
        new: &DocumentId,
    ) -> Option<DocumentId> {
        let view = View {
            without: Some(old),
            with: Some(new),
        };
        self.resolve_in(source, record, view).map(|(id, _)| id)
    }

    fn resolve_in(
        &self,
        source: &DocumentId,
        record: &LinkRecord,
        view: View<'_>,
    ) -> Option<(DocumentId, Resolution)> {
        if record.target.is_empty() {
            return record
                .anchor
                .as_ref()
                .map(|_| (source.clone(), Resolution::Exact));
        }

        let known = |id: &DocumentId| {
            view.with == Some(id) || (view.without != Some(id) && self.documents.contains(id))
        };

        if let Some(joined) = join_relative(source.parent(), &record.target)
            && !joined.is_empty()
        {
            let exact = DocumentId::new(joined.as_str());
            if known(&exact) {
                return Some((exact, Resolution::Exact));
            }
            for ext in &self.extensions {
                let candidate = DocumentId::new(format!("{}.{}", joined, ext));
                if known(&candidate) {
                    return Some((candidate, Resolution::Exact));
                }
            }
        }

        lookup_keys(&record.target).into_iter().find_map(|key| {
            let mut candidates: BTreeSet<&DocumentId> = self
                .keys
                .get(&key)
                .into_iter()
                .flatten()
                .filter(|id| view.without != Some(*id))
                .collect();
            if let Some(added) = view.with
                && document_keys(added).contains(&key)
            {
                candidates.insert(added);
            }
            candidates
                .first()
                .map(|id| ((*id).clone(), Resolution::Lookup))
        })
    }

    /// Register an identity. Sources whose links could now resolve to it are
    /// re-resolved. Returns `false` if it was already known.
    pub fn insert_document(&mut self, id: &DocumentId) -> bool {
        if !self.documents.insert(id.clone()) {
            return false;
        }
        for key in document_keys(id) {
            self.keys.entry(key).or_default().insert(id.clone());
        }

        let affected = self.referencing(id);
        for source in &affected {
            self.reresolve(source);
        }

        log::debug!(
            "Registered {} ({} sources re-resolved)",
            id,
            affected.len()
        );
        true
    }

    /// Drop an identity and its contributions. Sources that linked to it are
    /// re-resolved (their links become broken or resolve elsewhere).
    pub fn remove_document(&mut self, id: &DocumentId) -> bool {
        if !self.documents.remove(id) {
            return false;
        }
        for key in document_keys(id) {
            if let Some(ids) = self.keys.get_mut(&key) {
                ids.remove(id);
                if ids.is_empty() {
                    self.keys.remove(&key);
                }
            }
        }

        self.detach(id);

        let mut affected = self.referencing(id);
        if let Some(entries) = self.inbound.remove(id) {
            affected.extend(entries.into_iter().map(|b| b.source));
        }
        for source in &affected {
            self.reresolve(source);
        }

        log::debug!("Removed {} ({} sources re-resolved)", id, affected.len());
        true
    }

    /// Move a document's forward entry to a new identity, re-resolving its
    /// links relative to the new location. An existing entry at `new` is
    /// replaced.
    pub fn rename_document(&mut self, old: &DocumentId, new: &DocumentId) -> bool {
        if old == new || !self.documents.contains(old) {
            return false;
        }

        let links = self.detach(old);
        self.remove_document(old);
        self.detach(new);
        self.insert_document(new);
        self.attach(new, links);

        log::debug!("Renamed {} -> {}", old, new);
        true
    }

    /// Re-index one document from its full text
    pub fn index_document(&mut self, id: &DocumentId, text: &str) -> usize {
        let links = prepare_links(text, self.snippet_radius);
        self.install(id, links)
    }

    /// Install pre-extracted links for a document, replacing its previous
    /// contributions. Registers the identity if needed.
    pub fn install(&mut self, id: &DocumentId, links: Vec<IndexedLink>) -> usize {
        self.insert_document(id);
        self.detach(id);
        self.attach(id, links)
    }

    /// Outgoing links of a document in document order
    pub fn forward(&self, id: &DocumentId, include_broken: bool, page: Page) -> Paginated<IndexedLink> {
        let links: Vec<IndexedLink> = self
            .forward_links(id)
            .iter()
            .filter(|link| include_broken || !link.is_broken())
            .cloned()
            .collect();
        page.apply(links)
    }

    pub fn forward_links(&self, id: &DocumentId) -> &[IndexedLink] {
        self.forward.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Inbound links ordered by source identity, then byte offset
    pub fn backlinks(&self, id: &DocumentId, page: Page) -> Paginated<Backlink> {
        page.apply(self.backlink_entries(id).to_vec())
    }

    pub fn backlink_entries(&self, id: &DocumentId) -> &[Backlink] {
        self.inbound.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn backlink_count(&self, id: &DocumentId) -> usize {
        self.backlink_entries(id).len()
    }

    /// Distinct sources with at least one link resolving to `id`
    pub fn linking_sources(&self, id: &DocumentId) -> BTreeSet<DocumentId> {
        self.backlink_entries(id)
            .iter()
            .map(|b| b.source.clone())
            .collect()
    }

    /// Documents with zero inbound links, landing pages excepted
    pub fn orphaned(&self, page: Page) -> Paginated<DocumentId> {
        let orphans: Vec<DocumentId> = self
            .documents
            .iter()
            .filter(|id| self.backlink_entries(id).is_empty())
            .filter(|id| !self.orphan_exempt.iter().any(|name| name == id.file_name()))
            .cloned()
            .collect();
        page.apply(orphans)
    }

    /// Documents with at least one unresolved link
    pub fn broken(&self, page: Page) -> Paginated<BrokenLinks> {
        let broken: Vec<BrokenLinks> = self
            .documents
            .iter()
            .filter_map(|id| {
                let mut targets: Vec<String> = Vec::new();
                for link in self.forward_links(id).iter().filter(|l| l.is_broken()) {
                    if !targets.contains(&link.record.target) {
                        targets.push(link.record.target.clone());
                    }
                }
                (!targets.is_empty()).then(|| BrokenLinks {
                    source: id.clone(),
                    targets,
                })
            })
            .collect();
        page.apply(broken)
    }

    /// Total link records across the corpus
    pub fn link_count(&self) -> usize {
        self.forward.values().map(Vec::len).sum()
    }

    pub fn stats(&self, top_n: usize) -> LinkStats {
        let link_count = self.link_count();
        let resolved_links: usize = self.inbound.values().map(Vec::len).sum();

        let most_linked = ranked(
            self.inbound
                .iter()
                .map(|(id, entries)| (id.clone(), entries.len()))
                .collect(),
            top_n,
        );
        let most_linking = ranked(
            self.forward
                .iter()
                .filter(|(_, links)| !links.is_empty())
                .map(|(id, links)| (id.clone(), links.len()))
                .collect(),
            top_n,
        );

        LinkStats {
            document_count: self.documents.len(),
            link_count,
            resolved_links,
            broken_links: link_count - resolved_links,
            documents_with_backlinks: self.inbound.len(),
            most_linked,
            most_linking,
        }
    }

    /// Sources holding links whose name key matches `id`
    fn referencing(&self, id: &DocumentId) -> BTreeSet<DocumentId> {
        document_reference_keys(id)
            .iter()
            .filter_map(|key| self.references.get(key))
            .flatten()
            .cloned()
            .collect()
    }

    fn reresolve(&mut self, source: &DocumentId) {
        if !self.forward.contains_key(source) {
            return;
        }
        let links = self.detach(source);
        self.attach(source, links);
    }

    /// Remove a source's forward entry and every contribution derived from it
    fn detach(&mut self, source: &DocumentId) -> Vec<IndexedLink> {
        let Some(links) = self.forward.remove(source) else {
            return Vec::new();
        };

        let targets: BTreeSet<&DocumentId> =
            links.iter().filter_map(|l| l.target.as_ref()).collect();
        for target in targets {
            if let Some(entries) = self.inbound.get_mut(target) {
                entries.retain(|b| &b.source != source);
                if entries.is_empty() {
                    self.inbound.remove(target);
                }
            }
        }

        for link in &links {
            for key in target_reference_keys(&link.record.target) {
                if let Some(sources) = self.references.get_mut(&key) {
                    sources.remove(source);
                    if sources.is_empty() {
                        self.references.remove(&key);
                    }
                }
            }
        }

        links
    }

    /// Resolve and install a source's forward entry and its contributions
    fn attach(&mut self, source: &DocumentId, mut links: Vec<IndexedLink>) -> usize {
        for link in &mut links {
            link.target = self.resolve(source, &link.record);
        }

        let mut touched = BTreeSet::new();
        for link in &links {
            for key in target_reference_keys(&link.record.target) {
                self.references
                    .entry(key)
                    .or_default()
                    .insert(source.clone());
            }
            if let Some(target) = &link.target {
                self.inbound.entry(target.clone()).or_default().push(Backlink {
                    source: source.clone(),
                    link_text: link.record.raw.clone(),
                    context: Some(link.context.clone()),
                    position: link.record.position,
                });
                touched.insert(target.clone());
            }
        }

        for target in touched {
            if let Some(entries) = self.inbound.get_mut(&target) {
                entries.sort_by(|a, b| {
                    a.source
                        .cmp(&b.source)
                        .then(a.position.offset.cmp(&b.position.offset))
                });
            }
        }

        let count = links.len();
        self.forward.insert(source.clone(), links);
        count
    }
}

impl Default for LinkIndex {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}
