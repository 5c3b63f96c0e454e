pub mod auth;
pub mod editing;
pub mod io;
pub mod models;
pub mod store;
pub mod sync;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use auth::{AuthProvider, LocalAuth};
pub use editing::{
    CURSOR_STATE_KEY, PlainTextSurface, SelectionOffsetTracker, TextSurface, TextSurfaceController,
};
pub use io::{FileEphemeralStore, FsDocumentStore};
pub use models::{Document, DocumentId, NewDocument, SelectionOffsets, User, UserId};
pub use store::{
    DocumentStore, EphemeralStore, MemoryDocumentStore, MemoryEphemeralStore, StoreError,
};
pub use sync::{
    DocumentSyncEngine, KeyChord, SaveIntent, SaveOutcome, SaveTrigger, SyncError, SyncState,
};
