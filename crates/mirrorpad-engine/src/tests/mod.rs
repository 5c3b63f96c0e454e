//! Shared fixtures and store fakes for unit tests

use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

use crate::auth::LocalAuth;
use crate::editing::{PlainTextSurface, SelectionOffsetTracker, TextSurfaceController};
use crate::models::{Document, DocumentId, NewDocument, User, UserId};
use crate::store::{DocumentStore, MemoryDocumentStore, MemoryEphemeralStore, StoreError};
use crate::sync::DocumentSyncEngine;

pub fn create_test_store_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn test_user() -> User {
    User {
        id: UserId::from("u1"),
        email: "u1@example.com".to_string(),
    }
}

/// Engine over `store` with `u1` signed in and fresh ephemeral state
pub fn test_engine(store: Rc<dyn DocumentStore>) -> DocumentSyncEngine<PlainTextSurface> {
    let tracker = SelectionOffsetTracker::new(Rc::new(MemoryEphemeralStore::new()));
    DocumentSyncEngine::new(
        store,
        Rc::new(LocalAuth::signed_in(test_user())),
        TextSurfaceController::new(PlainTextSurface::new(), tracker),
    )
}

fn unreachable_error() -> StoreError {
    StoreError::Transport("store unreachable".to_string())
}

/// Memory store that counts queries and keeps every upsert
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryDocumentStore,
    queries: Cell<usize>,
    upserts: RefCell<Vec<NewDocument>>,
}

impl RecordingStore {
    pub fn queries(&self) -> usize {
        self.queries.get()
    }

    pub fn upserts(&self) -> usize {
        self.upserts.borrow().len()
    }

    pub fn last_upsert(&self) -> Option<NewDocument> {
        self.upserts.borrow().last().cloned()
    }
}

#[async_trait(?Send)]
impl DocumentStore for RecordingStore {
    async fn query(&self, owner_id: &UserId) -> Result<Vec<Document>, StoreError> {
        self.queries.set(self.queries.get() + 1);
        self.inner.query(owner_id).await
    }

    async fn create(&self, document: NewDocument) -> Result<DocumentId, StoreError> {
        self.inner.create(document).await
    }

    async fn upsert(&self, id: DocumentId, document: NewDocument) -> Result<(), StoreError> {
        self.upserts.borrow_mut().push(document.clone());
        self.inner.upsert(id, document).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Query,
    Create,
    Upsert,
}

/// Memory store where one kind of operation always fails
pub struct FailingStore {
    inner: MemoryDocumentStore,
    fail_on: FailOn,
    upserts: Cell<usize>,
}

impl FailingStore {
    pub fn new(fail_on: FailOn) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            fail_on,
            upserts: Cell::new(0),
        }
    }

    /// Upsert attempts, failed or not
    pub fn upserts(&self) -> usize {
        self.upserts.get()
    }
}

#[async_trait(?Send)]
impl DocumentStore for FailingStore {
    async fn query(&self, owner_id: &UserId) -> Result<Vec<Document>, StoreError> {
        if self.fail_on == FailOn::Query {
            return Err(unreachable_error());
        }
        self.inner.query(owner_id).await
    }

    async fn create(&self, document: NewDocument) -> Result<DocumentId, StoreError> {
        if self.fail_on == FailOn::Create {
            return Err(unreachable_error());
        }
        self.inner.create(document).await
    }

    async fn upsert(&self, id: DocumentId, document: NewDocument) -> Result<(), StoreError> {
        self.upserts.set(self.upserts.get() + 1);
        if self.fail_on == FailOn::Upsert {
            return Err(unreachable_error());
        }
        self.inner.upsert(id, document).await
    }
}

/// Memory store whose upserts can be held open until released
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryDocumentStore,
    gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
    written: RefCell<Vec<String>>,
}

impl GatedStore {
    /// Hold the next upsert until the returned sender fires
    pub fn gate_next_upsert(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }

    pub fn written_contents(&self) -> Vec<String> {
        self.written.borrow().clone()
    }
}

#[async_trait(?Send)]
impl DocumentStore for GatedStore {
    async fn query(&self, owner_id: &UserId) -> Result<Vec<Document>, StoreError> {
        self.inner.query(owner_id).await
    }

    async fn create(&self, document: NewDocument) -> Result<DocumentId, StoreError> {
        self.inner.create(document).await
    }

    async fn upsert(&self, id: DocumentId, document: NewDocument) -> Result<(), StoreError> {
        let in_flight = self.in_flight.get() + 1;
        self.in_flight.set(in_flight);
        self.max_in_flight.set(self.max_in_flight.get().max(in_flight));

        let gate = self.gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            gate.await
                .map_err(|_| StoreError::Transport("gate dropped".to_string()))?;
        }

        self.written.borrow_mut().push(document.content.clone());
        let result = self.inner.upsert(id, document).await;
        self.in_flight.set(self.in_flight.get() - 1);
        result
    }
}
