//! End-to-end scenarios over the `Corpus` facade.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wikigraph::algorithms::{
    degree_centrality, find_cycles, topological_sort, weakly_connected_components,
};
use wikigraph::prelude::*;
use wikigraph::AlgorithmOptions;

fn id(path: &str) -> DocumentId {
    DocumentId::new(path)
}

fn config() -> WikiGraphConfig {
    ConfigProfile::Deterministic.create_config("/corpus")
}

async fn memory_corpus(documents: &[(&str, &str)]) -> (Corpus, Arc<MemoryStorage>) {
    let config = config();
    let storage = Arc::new(MemoryStorage::with_documents(documents.iter().copied()));
    let policy = Arc::new(TopSegmentPolicy::new(&config.index));
    let corpus = Corpus::new(config, storage.clone(), policy, Arc::new(FrontmatterCodec))
        .expect("valid corpus");
    corpus.load().await.expect("load");
    (corpus, storage)
}

/// Storage whose n-th write (1-based) fails
struct FailingWrites {
    inner: MemoryStorage,
    fail_on: usize,
    writes: AtomicUsize,
}

#[async_trait]
impl Storage for FailingWrites {
    async fn exists(&self, id: &DocumentId) -> Result<bool> {
        self.inner.exists(id).await
    }
    async fn read(&self, id: &DocumentId) -> Result<String> {
        self.inner.read(id).await
    }
    async fn write(&self, id: &DocumentId, content: &str) -> Result<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.inner.write(id, content).await
    }
    async fn rename(&self, from: &DocumentId, to: &DocumentId) -> Result<()> {
        self.inner.rename(from, to).await
    }
    async fn list(&self) -> Result<Vec<DocumentId>> {
        self.inner.list().await
    }
}

#[tokio::test]
async fn test_link_then_unlink() {
    let (corpus, _) = memory_corpus(&[("a.md", "[[b]]"), ("b.md", "")]).await;
    assert_eq!(corpus.backlinks(&id("b.md"), Page::all()).total, 1);

    assert_eq!(corpus.index_document(&id("a.md"), "no links any more"), 0);
    assert_eq!(corpus.backlinks(&id("b.md"), Page::all()).total, 0);
    assert_eq!(corpus.orphaned(Page::all()).total, 2);
}

#[tokio::test]
async fn test_reindex_is_idempotent() {
    let content = "[[b]] [[c#Part|part]] [[missing]]";
    let (corpus, _) = memory_corpus(&[("a.md", content), ("b.md", ""), ("c.md", "[[a]]")]).await;

    let before = corpus.backlink_stats();
    let forward_before = corpus.forward_links(&id("a.md"), true, Page::all());

    corpus.index_document(&id("a.md"), content);
    corpus.index_document(&id("a.md"), content);

    assert_eq!(corpus.backlink_stats(), before);
    assert_eq!(corpus.forward_links(&id("a.md"), true, Page::all()), forward_before);
}

#[tokio::test]
async fn test_backlink_counts_match_resolved_links() {
    let (corpus, _) = memory_corpus(&[
        ("notes/a.md", "[[b]] [[b]] [[/projects/c]] [[ghost]]"),
        ("notes/b.md", "[[../projects/c.md]] [[#Local]]"),
        ("projects/c.md", "[[a]] `[[b]]`"),
    ])
    .await;

    let mut resolved: BTreeMap<DocumentId, usize> = BTreeMap::new();
    for source in ["notes/a.md", "notes/b.md", "projects/c.md"] {
        for link in corpus.forward_links(&id(source), false, Page::all()).items {
            if let Some(target) = link.target {
                *resolved.entry(target).or_default() += 1;
            }
        }
    }

    for doc in ["notes/a.md", "notes/b.md", "projects/c.md"] {
        let expected = resolved.get(&id(doc)).copied().unwrap_or(0);
        assert_eq!(
            corpus.backlinks(&id(doc), Page::all()).total,
            expected,
            "backlinks of {}",
            doc
        );
    }
    assert_eq!(corpus.backlinks(&id("notes/b.md"), Page::all()).total, 3);
    assert_eq!(corpus.broken(Page::all()).total, 1);
}

#[tokio::test]
async fn test_three_cycle() {
    let (corpus, _) = memory_corpus(&[("a.md", "[[b]]"), ("b.md", "[[c]]"), ("c.md", "[[a]]")]).await;
    let graph = corpus.build_graph(&GraphScope::All);

    let cycles = find_cycles(&graph);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 4);
    assert_eq!(cycles[0].first(), cycles[0].last());
    assert_eq!(topological_sort(&graph), None);
    assert!(corpus.analyze_graph(&GraphScope::All).summary.has_cycles);
}

#[tokio::test]
async fn test_disconnected_document() {
    let (corpus, _) = memory_corpus(&[
        ("a.md", "[[b]] [[c]]"),
        ("b.md", "[[d]]"),
        ("c.md", ""),
        ("d.md", "[[a]]"),
        ("lonely.md", "nothing here"),
    ])
    .await;
    let graph = corpus.build_graph(&GraphScope::All);

    let mut sizes: Vec<usize> = weakly_connected_components(&graph)
        .iter()
        .map(Vec::len)
        .collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(sizes, vec![4, 1]);

    assert_eq!(degree_centrality(&graph).get(&id("lonely.md")), Some(&0.0));

    let report = corpus.analyze_graph(&GraphScope::All);
    assert_eq!(report.summary.component_count, 2);
    assert_eq!(report.orphans, vec![id("lonely.md")]);
}

#[tokio::test]
async fn test_move_rewrites_every_reference() {
    let (corpus, storage) = memory_corpus(&[
        ("projects/x.md", "---\ncategory: projects\n---\n# X\n"),
        ("notes/a.md", "See [[/projects/x]] and [[../projects/x#Plan|the plan]]"),
        ("notes/b.md", "[[/projects/x.md|X]]"),
    ])
    .await;
    let old = id("projects/x.md");
    let new = id("archives/x.md");
    let inbound = corpus.backlinks(&old, Page::all()).total;
    assert_eq!(inbound, 3);

    let report = corpus
        .move_document(&old, &new, MoveOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total_links_updated, 3);
    assert_eq!(report.updates.len(), 2);
    assert_eq!(
        report.category_change.as_ref().map(|c| c.to.as_deref()),
        Some(Some("archives"))
    );

    assert_eq!(corpus.backlinks(&old, Page::all()).total, 0);
    assert_eq!(corpus.backlinks(&new, Page::all()).total, inbound);
    assert_eq!(
        storage.read(&id("notes/a.md")).await.unwrap(),
        "See [[/archives/x]] and [[../archives/x#Plan|the plan]]"
    );
    assert_eq!(
        storage.read(&id("notes/b.md")).await.unwrap(),
        "[[/archives/x.md|X]]"
    );
    assert!(!storage.exists(&old).await.unwrap());
    assert_eq!(
        corpus.metadata(&new).and_then(|m| m.category),
        Some("archives".to_string())
    );
}

#[tokio::test]
async fn test_failed_move_leaves_corpus_untouched() {
    let inner = MemoryStorage::with_documents([
        ("p/x.md", "# X"),
        ("a.md", "[[/p/x]]"),
        ("b.md", "[[/p/x]]"),
        ("c.md", "[[/p/x]]"),
    ]);
    let before = inner.snapshot().await;
    let storage = Arc::new(FailingWrites {
        inner,
        fail_on: 2,
        writes: AtomicUsize::new(0),
    });

    let config = config();
    let policy = Arc::new(TopSegmentPolicy::new(&config.index));
    let corpus = Corpus::new(config, storage.clone(), policy, Arc::new(FrontmatterCodec)).unwrap();
    corpus.load().await.unwrap();

    let err = corpus
        .move_document(&id("p/x.md"), &id("x.md"), MoveOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MoveFailed { .. }), "got {err:?}");
    assert_eq!(storage.inner.snapshot().await, before);
    assert_eq!(corpus.backlinks(&id("p/x.md"), Page::all()).total, 3);
    assert_eq!(corpus.backlinks(&id("x.md"), Page::all()).total, 0);
}

#[tokio::test]
async fn test_move_never_rebinds_to_a_namesake() {
    let (corpus, storage) = memory_corpus(&[
        ("projects/x.md", "# X"),
        ("projects/a.md", "See [[x#Goals|goals]]"),
        ("other/x.md", "# Other"),
    ])
    .await;
    let new = id("zeta/x.md");

    let report = corpus
        .move_document(&id("projects/x.md"), &new, MoveOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total_links_updated, 1);
    assert_eq!(
        storage.read(&id("projects/a.md")).await.unwrap(),
        "See [[../zeta/x#Goals|goals]]"
    );
    assert_eq!(corpus.backlinks(&new, Page::all()).total, 1);
    assert_eq!(corpus.backlinks(&id("other/x.md"), Page::all()).total, 0);
}

#[tokio::test]
async fn test_move_rewrites_corpus_path_target() {
    let (corpus, storage) = memory_corpus(&[
        ("projects/x.md", "# X"),
        ("notes/a.md", "See [[projects/x]]"),
    ])
    .await;
    let new = id("archives/x.md");
    assert_eq!(corpus.backlinks(&id("projects/x.md"), Page::all()).total, 1);

    corpus
        .move_document(&id("projects/x.md"), &new, MoveOptions::default())
        .await
        .unwrap();

    assert_eq!(
        storage.read(&id("notes/a.md")).await.unwrap(),
        "See [[archives/x]]"
    );
    assert_eq!(corpus.backlinks(&new, Page::all()).total, 1);
    assert_eq!(corpus.broken(Page::all()).total, 0);
}

#[tokio::test]
async fn test_path_targets_match_whole_segments() {
    let (corpus, _) = memory_corpus(&[
        ("notesx.md", ""),
        ("projects/y.md", ""),
        ("a.md", "[[notes/x]] [[projectsy]] [[projects/y]]"),
    ])
    .await;

    assert_eq!(corpus.backlinks(&id("notesx.md"), Page::all()).total, 0);
    assert_eq!(corpus.backlinks(&id("projects/y.md"), Page::all()).total, 1);

    let broken = corpus.broken(Page::all());
    assert_eq!(broken.total, 1);
    assert_eq!(broken.items[0].source, id("a.md"));
    assert_eq!(broken.items[0].targets, vec!["notes/x", "projectsy"]);
}

#[tokio::test]
async fn test_landing_pages_are_not_orphaned() {
    let (corpus, _) = memory_corpus(&[
        ("index.md", "[[a]]"),
        ("docs/README.md", ""),
        ("a.md", ""),
        ("lost.md", ""),
    ])
    .await;

    let orphans = corpus.orphaned(Page::all());
    assert_eq!(orphans.items, vec![id("lost.md")]);
    assert_eq!(corpus.backlink_stats().documents_with_backlinks, 1);
}

#[tokio::test]
async fn test_scoped_graph() {
    let (corpus, _) = memory_corpus(&[
        ("projects/a.md", "[[b]] [[n]]"),
        ("projects/b.md", "[[a]]"),
        ("notes/n.md", "[[a]]"),
    ])
    .await;

    let graph = corpus.build_graph(&GraphScope::Category("projects".to_string()));
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 2);
    assert!(!graph.contains_node(&id("notes/n.md")));

    let neighborhood = corpus.build_subgraph(&[id("notes/n.md")], 1);
    assert!(neighborhood.contains_node(&id("projects/a.md")));
    assert!(!neighborhood.contains_node(&id("projects/b.md")));
}

#[tokio::test]
async fn test_cancelled_analysis_is_flagged() {
    let (corpus, _) = memory_corpus(&[("a.md", "[[b]]"), ("b.md", "[[c]]"), ("c.md", "")]).await;

    let token = CancellationToken::new();
    token.cancel();
    let report = corpus.analyze_graph_with(
        &GraphScope::All,
        AlgorithmOptions::new().with_cancellation(token),
    );
    assert!(report.cancelled);
    assert_eq!(report.summary.node_count, 3);

    assert!(!corpus.analyze_graph(&GraphScope::All).cancelled);
}

#[tokio::test]
async fn test_filesystem_corpus() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    tokio::fs::create_dir_all(root.join("projects")).await.unwrap();
    tokio::fs::create_dir_all(root.join(".git")).await.unwrap();
    tokio::fs::write(root.join("projects/x.md"), "# X").await.unwrap();
    tokio::fs::write(root.join("index.md"), "[[x]] and [[/projects/x]]").await.unwrap();
    tokio::fs::write(root.join("image.png"), "binary").await.unwrap();
    tokio::fs::write(root.join(".git/HEAD.md"), "[[x]]").await.unwrap();

    let config = WikiGraphConfig::builder(root).random_seed(1).build().unwrap();
    let corpus = Corpus::open(config).await.unwrap();

    let x = id("projects/x.md");
    assert_eq!(corpus.backlinks(&x, Page::all()).total, 2);
    assert_eq!(corpus.backlink_stats().document_count, 2);

    corpus
        .write_document(&id("notes/new.md"), "[[index]]")
        .await
        .unwrap();
    assert_eq!(
        tokio::fs::read_to_string(root.join("notes/new.md")).await.unwrap(),
        "[[index]]"
    );
    assert_eq!(corpus.backlinks(&id("index.md"), Page::all()).total, 1);
    assert_eq!(
        corpus.read_document(&id("notes/new.md")).await.unwrap(),
        "[[index]]"
    );

    let report = corpus
        .move_document(&x, &id("archives/x.md"), MoveOptions::default())
        .await
        .unwrap();
    assert_eq!(report.total_links_updated, 2);
    assert!(!root.join("projects/x.md").exists());
    assert_eq!(
        tokio::fs::read_to_string(root.join("index.md")).await.unwrap(),
        "[[x]] and [[/archives/x]]"
    );
}

#[tokio::test]
async fn test_open_rejects_missing_root() {
    let temp = TempDir::new().unwrap();
    let config = WikiGraphConfig::new(temp.path().join("missing"));
    assert!(matches!(
        Corpus::open(config).await,
        Err(Error::Config { .. })
    ));
}

#[tokio::test]
async fn test_related_and_suggestions() {
    let (corpus, _) = memory_corpus(&[
        ("a.md", "[[hub]] [[other]]"),
        ("b.md", "[[hub]] [[other]]"),
        ("hub.md", ""),
        ("other.md", ""),
    ])
    .await;

    let related = corpus.find_related(&id("a.md"), 5);
    let ids: Vec<DocumentId> = related.into_iter().map(|r| r.id).collect();
    // direct links first, then the two-hop neighbor
    assert_eq!(ids, vec![id("hub.md"), id("other.md"), id("b.md")]);

    let suggestions = corpus.suggest_connections(5);
    assert_eq!(suggestions.len(), 2);
    assert!(
        suggestions
            .iter()
            .any(|s| s.source == id("a.md") && s.target == id("b.md"))
    );
}
