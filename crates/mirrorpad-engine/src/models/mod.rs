pub mod document;
pub mod selection;

pub use document::{Document, DocumentId, NewDocument, User, UserId};
pub use selection::SelectionOffsets;
