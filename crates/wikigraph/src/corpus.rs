//! The corpus service: one explicitly constructed object owning the backlink
//! store, metadata cache, lock registry and document mover.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use wikigraph_core::{
    DocumentId, DocumentMetadata, MetadataCodec, Page, Paginated, PathPolicy, Result, Storage,
    WikiGraphConfig,
};
use wikigraph_graph::{
    AlgorithmOptions, ConnectionSuggestion, Graph, GraphAnalyzer, GraphBuilder, GraphReport,
    GraphScope, RelatedDocument,
};
use wikigraph_index::{Backlink, BacklinkStore, BrokenLinks, IndexedLink, LinkStats};
use wikigraph_vault::{
    DocumentLocks, DocumentMover, FrontmatterCodec, FsStorage, MoveOptions, MoveReport,
    TopSegmentPolicy,
};

/// Result of a full corpus load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub documents: usize,
    pub links: usize,
    /// Documents that could not be read
    pub failed: Vec<DocumentId>,
}

/// Wiki-link corpus over a storage backend
pub struct Corpus {
    config: WikiGraphConfig,
    storage: Arc<dyn Storage>,
    policy: Arc<dyn PathPolicy>,
    codec: Arc<dyn MetadataCodec>,
    store: Arc<BacklinkStore>,
    locks: Arc<DocumentLocks>,
    metadata: RwLock<HashMap<DocumentId, DocumentMetadata>>,
    mover: DocumentMover,
}

impl Corpus {
    /// Assemble a corpus from its collaborators. Nothing is indexed until
    /// [`Corpus::load`] or [`Corpus::index_document`] is called.
    pub fn new(
        config: WikiGraphConfig,
        storage: Arc<dyn Storage>,
        policy: Arc<dyn PathPolicy>,
        codec: Arc<dyn MetadataCodec>,
    ) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(BacklinkStore::new(&config.index));
        let locks = Arc::new(DocumentLocks::new());
        let mover = DocumentMover::new(
            Arc::clone(&storage),
            Arc::clone(&policy),
            Arc::clone(&codec),
            Arc::clone(&store),
            Arc::clone(&locks),
        );

        Ok(Self {
            config,
            storage,
            policy,
            codec,
            store,
            locks,
            metadata: RwLock::new(HashMap::new()),
            mover,
        })
    }

    /// Open a directory-backed corpus with the stock collaborators and load it
    #[instrument(skip(config), fields(root = %config.root.display()), name = "corpus_open")]
    pub async fn open(config: WikiGraphConfig) -> Result<Self> {
        config.validate_root()?;

        let storage = Arc::new(FsStorage::new(&config.root, &config.index));
        let policy = Arc::new(TopSegmentPolicy::new(&config.index).with_root(&config.root));
        let corpus = Self::new(config, storage, policy, Arc::new(FrontmatterCodec))?;
        corpus.load().await?;
        Ok(corpus)
    }

    pub fn config(&self) -> &WikiGraphConfig {
        &self.config
    }

    /// Shared backlink store
    pub fn store(&self) -> &Arc<BacklinkStore> {
        &self.store
    }

    /// Index every document the storage lists.
    ///
    /// All identities are registered before any content is indexed, so link
    /// resolution does not depend on listing order. Unreadable documents are
    /// skipped and reported.
    #[instrument(skip(self), name = "corpus_load")]
    pub async fn load(&self) -> Result<LoadSummary> {
        let ids = self.storage.list().await?;
        log::info!("Loading {} documents", ids.len());

        for id in &ids {
            self.store.register(id);
        }

        let mut summary = LoadSummary::default();
        for id in ids {
            match self.storage.read(&id).await {
                Ok(content) => {
                    summary.links += self.index_document(&id, &content);
                    summary.documents += 1;
                }
                Err(e) => {
                    log::warn!("Failed to read {}: {}", id, e);
                    self.store.remove(&id);
                    summary.failed.push(id);
                }
            }
        }

        log::info!(
            "Loaded {} documents with {} links ({} failed)",
            summary.documents,
            summary.links,
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Parse metadata and re-extract links for one document's content.
    /// Returns the number of link records.
    pub fn index_document(&self, id: &DocumentId, content: &str) -> usize {
        let mut metadata = match self.codec.parse(id, content) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Ignoring metadata of {}: {}", id, e);
                DocumentMetadata::default()
            }
        };
        if metadata.category.is_none() {
            metadata.category = self.policy.category_of(id);
        }

        let links = self.store.update(id, content);
        self.metadata.write().insert(id.clone(), metadata);
        links
    }

    /// Persist a document and re-index it
    #[instrument(skip(self, id, content), fields(document = %id, size = content.len()), name = "corpus_write")]
    pub async fn write_document(&self, id: &DocumentId, content: &str) -> Result<usize> {
        self.policy.validate(id)?;
        let _lock = self.locks.acquire_one(id).await;

        self.storage.write(id, content).await?;
        Ok(self.index_document(id, content))
    }

    pub async fn read_document(&self, id: &DocumentId) -> Result<String> {
        self.storage.read(id).await
    }

    /// Drop a document from the index; storage is left untouched
    pub fn remove_document(&self, id: &DocumentId) -> bool {
        self.metadata.write().remove(id);
        self.store.remove(id)
    }

    pub fn metadata(&self, id: &DocumentId) -> Option<DocumentMetadata> {
        self.metadata.read().get(id).cloned()
    }

    pub fn forward_links(
        &self,
        id: &DocumentId,
        include_broken: bool,
        page: Page,
    ) -> Paginated<IndexedLink> {
        self.store.forward(id, include_broken, page)
    }

    pub fn backlinks(&self, id: &DocumentId, page: Page) -> Paginated<Backlink> {
        self.store.backlinks(id, page)
    }

    pub fn orphaned(&self, page: Page) -> Paginated<DocumentId> {
        self.store.orphaned(page)
    }

    pub fn broken(&self, page: Page) -> Paginated<BrokenLinks> {
        self.store.broken(page)
    }

    pub fn backlink_stats(&self) -> LinkStats {
        self.store.get_stats()
    }

    /// Snapshot of the documents selected by `scope`
    pub fn build_graph(&self, scope: &GraphScope) -> Graph {
        let index = self.store.read();
        let metadata = self.metadata.read();
        GraphBuilder::new(&index, &metadata)
            .with_config(self.config.graph.clone())
            .build(scope)
    }

    /// Snapshot of the `depth`-hop neighborhood of `roots`
    pub fn build_subgraph(&self, roots: &[DocumentId], depth: usize) -> Graph {
        let index = self.store.read();
        let metadata = self.metadata.read();
        GraphBuilder::new(&index, &metadata)
            .with_config(self.config.graph.clone())
            .build_subgraph(roots, depth)
    }

    pub fn analyze_graph(&self, scope: &GraphScope) -> GraphReport {
        self.analyze_graph_with(scope, AlgorithmOptions::default())
    }

    /// Analysis with cancellation for the long-running steps
    pub fn analyze_graph_with(&self, scope: &GraphScope, options: AlgorithmOptions) -> GraphReport {
        let graph = self.build_graph(scope);
        GraphAnalyzer::new(&graph, self.config.analysis.clone())
            .with_options(options)
            .analyze()
    }

    pub fn find_related(&self, id: &DocumentId, limit: usize) -> Vec<RelatedDocument> {
        let graph = self.build_graph(&GraphScope::All);
        GraphAnalyzer::new(&graph, self.config.analysis.clone()).find_related(id, limit)
    }

    pub fn suggest_connections(&self, limit: usize) -> Vec<ConnectionSuggestion> {
        let graph = self.build_graph(&GraphScope::All);
        GraphAnalyzer::new(&graph, self.config.analysis.clone()).suggest_connections(limit)
    }

    /// Move a document, retargeting inbound links. See
    /// [`DocumentMover::move_document`] for the transaction guarantees.
    pub async fn move_document(
        &self,
        source: &DocumentId,
        destination: &DocumentId,
        options: MoveOptions,
    ) -> Result<MoveReport> {
        let report = self
            .mover
            .move_document(source, destination, options)
            .await?;

        self.metadata.write().remove(&report.old_path);
        match self.storage.read(&report.new_path).await {
            Ok(content) => {
                let metadata = self.codec.parse(&report.new_path, &content).ok();
                let mut metadata = metadata.unwrap_or_default();
                if metadata.category.is_none() {
                    metadata.category = self.policy.category_of(&report.new_path);
                }
                self.metadata.write().insert(report.new_path.clone(), metadata);
            }
            Err(e) => log::warn!("Moved document {} unreadable: {}", report.new_path, e),
        }

        Ok(report)
    }
}
