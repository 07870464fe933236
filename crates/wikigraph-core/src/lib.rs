//! # Wikigraph Core
//!
//! Core data models, error types, configuration and collaborator traits for
//! the wikigraph link index. Every other wikigraph crate depends on this one.
//!
//! ## Core Modules
//!
//! - [`models`] - Document identities, link records, positions, metadata, pagination
//! - [`error`] - Error enum and Result alias
//! - [`config`] - Corpus configuration with builder and YAML persistence
//! - [`profiles`] - Configuration presets
//! - [`collaborators`] - Storage, path policy and metadata codec traits
//! - [`utils`] - Path normalization helpers
//!
//! ## Usage Examples
//!
//! ### Document identities
//!
//! ```
//! use wikigraph_core::prelude::*;
//!
//! let id = DocumentId::new("./projects/roadmap.md");
//! assert_eq!(id.as_str(), "projects/roadmap.md");
//! assert_eq!(id.stem(), "roadmap");
//! assert_eq!(id.top_segment(), Some("projects"));
//! ```
//!
//! ### Error Handling
//!
//! ```
//! use wikigraph_core::prelude::*;
//!
//! fn lookup(id: &DocumentId) -> Result<()> {
//!     Err(Error::not_found(id.as_str()))
//! }
//!
//! assert!(lookup(&DocumentId::new("missing.md")).is_err());
//! ```
//!
//! ### Configuration
//!
//! ```
//! use wikigraph_core::prelude::*;
//!
//! let config = WikiGraphConfig::builder("/corpus")
//!     .tag_relations(2)
//!     .random_seed(42)
//!     .build()
//!     .unwrap();
//! assert!(config.graph.tag_relations);
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod models;
pub mod profiles;
pub mod utils;

pub use collaborators::{MetadataCodec, PathPolicy, Storage};
pub use config::*;
pub use error::{Error, MoveStep, Result};
pub use models::*;
pub use profiles::ConfigProfile;
pub use utils::PathValidator;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::collaborators::{MetadataCodec, PathPolicy, Storage};
    pub use crate::config::{AnalysisConfig, GraphConfig, IndexConfig, WikiGraphConfig};
    pub use crate::error::{Error, MoveStep, Result};
    pub use crate::models::{
        DocumentId, DocumentMetadata, LineIndex, LinkRecord, Page, Paginated, SourcePosition,
    };
    pub use crate::profiles::ConfigProfile;
}
