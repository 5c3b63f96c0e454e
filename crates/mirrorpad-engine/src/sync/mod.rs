//! Lifecycle of the single remote document bound to the current user.
//!
//! `DocumentSyncEngine` resolves (or creates) the user's document, loads it
//! into the [`TextSurfaceController`], and writes the buffer back on explicit
//! saves. Around each asynchronous store call it snapshots the selection and
//! puts it back afterwards, so the caret does not move when content does not.
//!
//! All methods take `&self`: the engine is shared (`Rc`) between the UI loop
//! and the save tasks it spawns on a single-threaded executor. No `RefCell`
//! borrow is held across an `.await`.

pub mod trigger;

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::auth::AuthProvider;
use crate::editing::{TextSurface, TextSurfaceController};
use crate::models::{Document, DocumentId, NewDocument, User, UserId};
use crate::store::{DocumentStore, StoreError};

pub use trigger::{KeyChord, SaveIntent, SaveTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
    Ready,
    Saving,
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed to load content: {0}")]
    Load(#[source] StoreError),
    #[error("Save failed: {0}")]
    Save(#[source] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The buffer was written (including any save queued behind it)
    Saved,
    /// Another save is in flight; this one will run when it finishes
    Queued,
    /// No bound document or no signed-in user
    Skipped,
}

pub struct DocumentSyncEngine<S> {
    store: Rc<dyn DocumentStore>,
    auth: Rc<dyn AuthProvider>,
    controller: RefCell<TextSurfaceController<S>>,
    state: Cell<SyncState>,
    bound: Cell<Option<DocumentId>>,
    saving: Cell<bool>,
    save_queued: Cell<bool>,
    banner: RefCell<Option<String>>,
}

impl<S: TextSurface> DocumentSyncEngine<S> {
    pub fn new(
        store: Rc<dyn DocumentStore>,
        auth: Rc<dyn AuthProvider>,
        controller: TextSurfaceController<S>,
    ) -> Self {
        Self {
            store,
            auth,
            controller: RefCell::new(controller),
            state: Cell::new(SyncState::Idle),
            bound: Cell::new(None),
            saving: Cell::new(false),
            save_queued: Cell::new(false),
            banner: RefCell::new(None),
        }
    }

    /// Initialize for whoever is signed in. Without a user nothing happens.
    pub async fn mount(&self) -> Option<Document> {
        let Some(user) = self.auth.current_user() else {
            log::debug!("No signed-in user, not loading");
            return None;
        };
        self.initialize(&user.id).await.ok()
    }

    /// Find or create the document owned by `user_id`, bind to it and load it.
    ///
    /// When the owner has several documents the most recently updated wins.
    /// On failure the error is surfaced and the binding and surface are left
    /// as they were.
    pub async fn initialize(&self, user_id: &UserId) -> Result<Document, SyncError> {
        self.transition(SyncState::Loading);

        let document = match self.find_or_create(user_id).await {
            Ok(document) => document,
            Err(e) => {
                let err = SyncError::Load(e);
                self.surface_error(&err);
                return Err(err);
            }
        };

        self.bound.set(Some(document.id));
        {
            let mut controller = self.controller.borrow_mut();
            controller.load(&document.content);
            controller.restore_last_known();
        }
        log::info!("Bound to document {} for {user_id}", document.id);

        self.transition(SyncState::Ready);
        Ok(document)
    }

    async fn find_or_create(&self, user_id: &UserId) -> Result<Document, StoreError> {
        let mut documents = self.store.query(user_id).await?;
        documents.sort_by(Document::newest_first);
        if documents.len() > 1 {
            log::warn!(
                "{} documents found for {user_id}, using the most recent",
                documents.len()
            );
        }

        if let Some(document) = documents.into_iter().next() {
            return Ok(document);
        }

        let new_document = NewDocument::now(user_id.clone(), "");
        let id = self.store.create(new_document.clone()).await?;
        log::info!("Created empty document {id} for {user_id}");
        Ok(new_document.with_id(id))
    }

    /// Write the buffer to the bound document.
    ///
    /// At most one write is in flight. A save requested meanwhile is queued
    /// (further requests fold into it) and runs with a fresh snapshot once
    /// the current write resolves.
    pub async fn save(&self) -> Result<SaveOutcome, SyncError> {
        if self.save_target().is_none() {
            log::debug!("Nothing to save to");
            return Ok(SaveOutcome::Skipped);
        }
        if self.saving.get() {
            self.save_queued.set(true);
            log::debug!("Save in flight, queueing");
            return Ok(SaveOutcome::Queued);
        }

        self.saving.set(true);
        let outcome = loop {
            // Sign-out may have happened while a queued save was waiting
            let Some((id, user)) = self.save_target() else {
                break Ok(SaveOutcome::Skipped);
            };

            self.transition(SyncState::Saving);
            let result = match self.write(id, &user).await {
                Ok(()) => Ok(SaveOutcome::Saved),
                Err(e) => {
                    let err = SyncError::Save(e);
                    self.surface_error(&err);
                    Err(err)
                }
            };

            if !self.save_queued.replace(false) {
                break result;
            }
            log::debug!("Running queued save");
        };

        self.saving.set(false);
        self.save_queued.set(false);
        if self.state.get() == SyncState::Saving {
            self.transition(SyncState::Ready);
        }
        outcome
    }

    /// Save in response to a user intent
    pub async fn trigger(&self, intent: SaveIntent) -> Result<SaveOutcome, SyncError> {
        log::debug!("Save requested via {intent:?}");
        self.save().await
    }

    async fn write(&self, id: DocumentId, user: &User) -> Result<(), StoreError> {
        // Snapshot before the write; the round-trip may invalidate the node
        let (selection, content) = {
            let controller = self.controller.borrow();
            (
                controller.capture_selection(),
                controller.content().to_string(),
            )
        };

        self.store
            .upsert(id, NewDocument::now(user.id.clone(), content))
            .await?;

        let mut controller = self.controller.borrow_mut();
        controller.restore_selection(selection);
        controller.surface_mut().focus();
        log::debug!("Saved document {id}, caret back at {selection:?}");
        Ok(())
    }

    fn save_target(&self) -> Option<(DocumentId, User)> {
        let id = self.bound.get()?;
        let user = self.auth.current_user()?;
        Some((id, user))
    }

    /// Sign out and drop the binding. The text stays on screen.
    pub fn sign_out(&self) {
        self.auth.sign_out();
        self.bound.set(None);
    }

    fn surface_error(&self, err: &SyncError) {
        log::error!("{err}");
        self.transition(SyncState::Error);
        *self.banner.borrow_mut() = Some(err.to_string());
        self.transition(SyncState::Ready);
    }

    fn transition(&self, next: SyncState) {
        let previous = self.state.replace(next);
        if previous != next {
            log::debug!("Sync state {previous:?} -> {next:?}");
        }
    }

    pub fn state(&self) -> SyncState {
        self.state.get()
    }

    /// A load or save is outstanding. A reload does not end a write in flight.
    pub fn is_busy(&self) -> bool {
        self.saving.get() || self.state.get() == SyncState::Loading
    }

    pub fn bound_document(&self) -> Option<DocumentId> {
        self.bound.get()
    }

    pub fn current_user(&self) -> Option<User> {
        self.auth.current_user()
    }

    /// Message of the last surfaced failure, until dismissed
    pub fn banner(&self) -> Option<String> {
        self.banner.borrow().clone()
    }

    pub fn dismiss_banner(&self) {
        self.banner.borrow_mut().take();
    }

    /// Must not be held across an await of this engine's futures
    pub fn controller(&self) -> Ref<'_, TextSurfaceController<S>> {
        self.controller.borrow()
    }

    /// Must not be held across an await of this engine's futures
    pub fn controller_mut(&self) -> RefMut<'_, TextSurfaceController<S>> {
        self.controller.borrow_mut()
    }
}
