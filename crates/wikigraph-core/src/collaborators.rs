//! Traits for the external collaborators the core is driven through.
//!
//! Storage is async because every implementation touches I/O; path policy and
//! metadata parsing are pure and stay synchronous.

use crate::error::Result;
use crate::models::{DocumentId, DocumentMetadata};
use async_trait::async_trait;

/// Persistent document storage
#[async_trait]
pub trait Storage: Send + Sync {
    async fn exists(&self, id: &DocumentId) -> Result<bool>;

    /// Read the full content; missing documents are `Error::NotFound`
    async fn read(&self, id: &DocumentId) -> Result<String>;

    /// Write the full content, creating parent containers as needed
    async fn write(&self, id: &DocumentId, content: &str) -> Result<()>;

    /// Rename a document, replacing `to` if it exists
    async fn rename(&self, from: &DocumentId, to: &DocumentId) -> Result<()>;

    /// Every document identity in the corpus, sorted
    async fn list(&self) -> Result<Vec<DocumentId>>;
}

/// Path validation and category derivation
pub trait PathPolicy: Send + Sync {
    /// Reject malformed identities and identities escaping the root
    fn validate(&self, id: &DocumentId) -> Result<()>;

    /// Category of a document, if its location implies one
    fn category_of(&self, id: &DocumentId) -> Option<String>;
}

/// Structured-header codec
pub trait MetadataCodec: Send + Sync {
    /// Parse the document header; documents without a header get defaults
    fn parse(&self, id: &DocumentId, text: &str) -> Result<DocumentMetadata>;

    /// Return `text` with its category field set to `category`
    fn with_category(&self, text: &str, category: &str) -> Result<String>;

    /// The document body with any header stripped
    fn body<'a>(&self, text: &'a str) -> &'a str;
}
