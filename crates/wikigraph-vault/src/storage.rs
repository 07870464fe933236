//! [`Storage`] implementations: a directory on disk and an in-memory map.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::sync::RwLock;
use tracing::instrument;
use walkdir::{DirEntry, WalkDir};
use wikigraph_core::{DocumentId, Error, IndexConfig, PathValidator, Result, Storage};

/// Documents stored as files under a root directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    extensions: Vec<String>,
    excluded_paths: HashSet<String>,
    max_file_size: u64,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>, config: &IndexConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config.extensions.clone(),
            excluded_paths: config.excluded_paths.clone(),
            max_file_size: config.max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a document, rejecting anything outside the root
    pub fn resolve(&self, id: &DocumentId) -> Result<PathBuf> {
        PathValidator::validate_path_in_root(&self.root, id.as_str())
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.excluded_paths.contains(name))
    }

    fn is_document(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_file() {
            return false;
        }
        let extension_ok = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext));
        extension_ok
            && entry
                .metadata()
                .map(|m| m.len() <= self.max_file_size)
                .unwrap_or(false)
    }

    fn identity_of(&self, path: &Path) -> Option<DocumentId> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?),
                _ => return None,
            }
        }
        Some(DocumentId::new(segments.join("/")))
    }

    fn scan_files(&self) -> Vec<DocumentId> {
        let mut documents: Vec<DocumentId> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| self.is_document(entry))
            .filter_map(|entry| self.identity_of(entry.path()))
            .collect();

        documents.sort();
        documents
    }
}

fn map_missing(id: &DocumentId, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::not_found(id.as_str())
    } else {
        Error::Io(err)
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn exists(&self, id: &DocumentId) -> Result<bool> {
        let path = self.resolve(id)?;
        Ok(tokio::fs::try_exists(&path).await? && path.is_file())
    }

    #[instrument(skip(self, id), fields(document = %id), name = "storage_read")]
    async fn read(&self, id: &DocumentId) -> Result<String> {
        let path = self.resolve(id)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| map_missing(id, e))
    }

    /// Writes go to a sibling temp file that is then renamed over the target
    #[instrument(skip(self, id, content), fields(document = %id, size = content.len()), name = "storage_write")]
    async fn write(&self, id: &DocumentId, content: &str) -> Result<()> {
        let path = self.resolve(id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_file_name(format!(".{}.wikigraph-tmp", id.file_name()));
        tokio::fs::write(&temp_path, content).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    #[instrument(skip(self, from, to), fields(from = %from, to = %to), name = "storage_rename")]
    async fn rename(&self, from: &DocumentId, to: &DocumentId) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| map_missing(from, e))
    }

    #[instrument(skip(self), name = "storage_list")]
    async fn list(&self) -> Result<Vec<DocumentId>> {
        let documents = self.scan_files();
        log::debug!("Found {} documents under {}", documents.len(), self.root.display());
        Ok(documents)
    }
}

/// In-memory storage, mostly for tests and ephemeral corpora
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: RwLock<BTreeMap<DocumentId, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with `(identity, content)` pairs
    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<DocumentId>,
        V: Into<String>,
    {
        Self {
            documents: RwLock::new(
                documents
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Copy of every stored document
    pub async fn snapshot(&self) -> BTreeMap<DocumentId, String> {
        self.documents.read().await.clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.documents.read().await.contains_key(id))
    }

    async fn read(&self, id: &DocumentId) -> Result<String> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id.as_str()))
    }

    async fn write(&self, id: &DocumentId, content: &str) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(id.clone(), content.to_string());
        Ok(())
    }

    async fn rename(&self, from: &DocumentId, to: &DocumentId) -> Result<()> {
        let mut documents = self.documents.write().await;
        let content = documents
            .remove(from)
            .ok_or_else(|| Error::not_found(from.as_str()))?;
        documents.insert(to.clone(), content);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DocumentId>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }
}
