use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;

use super::{DocumentStore, EphemeralStore, StoreError};
use crate::models::{Document, DocumentId, NewDocument, UserId};

/// Document store kept in memory, returning query results in insertion order
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RefCell<Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing documents
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            documents: RefCell::new(documents.into_iter().collect()),
        }
    }

    /// Copy of everything stored, in insertion order
    pub fn documents(&self) -> Vec<Document> {
        self.documents.borrow().clone()
    }

    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.documents.borrow().iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, owner_id: &UserId) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .documents
            .borrow()
            .iter()
            .filter(|d| &d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, document: NewDocument) -> Result<DocumentId, StoreError> {
        let id = DocumentId::new();
        self.documents.borrow_mut().push(document.with_id(id));
        Ok(id)
    }

    async fn upsert(&self, id: DocumentId, document: NewDocument) -> Result<(), StoreError> {
        let mut documents = self.documents.borrow_mut();
        let document = document.with_id(id);
        match documents.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
        Ok(())
    }
}

/// Ephemeral key/value state held in memory
#[derive(Debug, Default)]
pub struct MemoryEphemeralStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryEphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EphemeralStore for MemoryEphemeralStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}
