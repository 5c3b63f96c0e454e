//! Storage collaborators consumed by the sync engine.
//!
//! The engine never reaches for a global handle: a [`DocumentStore`] and an
//! [`EphemeralStore`] are passed in at construction. In-memory versions live
//! in [`memory`]; filesystem-backed ones in [`crate::io`].

pub mod memory;

use async_trait::async_trait;

use crate::models::{Document, DocumentId, NewDocument, UserId};

pub use memory::{MemoryDocumentStore, MemoryEphemeralStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Remote store holding one document per owner.
///
/// Operations are asynchronous and may fail with a transport or permission
/// error. Futures are `!Send`: everything runs on the single UI thread.
#[async_trait(?Send)]
pub trait DocumentStore {
    /// All documents owned by `owner_id`. Order is store-defined.
    async fn query(&self, owner_id: &UserId) -> Result<Vec<Document>, StoreError>;

    /// Create a document and return the id the store assigned to it
    async fn create(&self, document: NewDocument) -> Result<DocumentId, StoreError>;

    /// Write `document` under `id`, replacing whatever was there
    async fn upsert(&self, id: DocumentId, document: NewDocument) -> Result<(), StoreError>;
}

/// Client-local string store that survives a reload but is never synced
pub trait EphemeralStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}
