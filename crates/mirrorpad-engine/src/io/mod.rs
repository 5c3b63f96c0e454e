//! Filesystem-backed collaborators: a document store that keeps one JSON
//! file per document, and ephemeral state kept as one file per key.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Document, DocumentId, NewDocument, UserId};
use crate::store::{DocumentStore, EphemeralStore, StoreError};

const DOCUMENT_EXT: &str = "json";

/// Document store rooted at a directory, one `<id>.json` file per document
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Open the store at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: DocumentId) -> PathBuf {
        self.root.join(format!("{id}.{DOCUMENT_EXT}"))
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)?;
        write_file(&self.document_path(document.id), &json)
    }
}

#[async_trait(?Send)]
impl DocumentStore for FsDocumentStore {
    async fn query(&self, owner_id: &UserId) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        for path in scan_document_files(&self.root)? {
            let content = fs::read_to_string(&path)?;
            let document: Document = serde_json::from_str(&content)?;
            if &document.owner_id == owner_id {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    async fn create(&self, document: NewDocument) -> Result<DocumentId, StoreError> {
        let document = document.with_id(DocumentId::new());
        self.write_document(&document)?;
        log::info!("Created document {} in {}", document.id, self.root.display());
        Ok(document.id)
    }

    async fn upsert(&self, id: DocumentId, document: NewDocument) -> Result<(), StoreError> {
        self.write_document(&document.with_id(id))
    }
}

/// Ephemeral state stored as one file per key under a state directory
#[derive(Debug, Clone)]
pub struct FileEphemeralStore {
    dir: PathBuf,
}

impl FileEphemeralStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl EphemeralStore for FileEphemeralStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = write_file(&self.dir.join(key), value) {
            log::warn!("Failed to persist ephemeral state '{key}': {e}");
        }
    }
}

/// Write `content` to `path` through a temporary sibling so readers never
/// observe a half-written file
fn write_file(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Document files directly under `root`, sorted by file name
fn scan_document_files(root: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_file()
            && let Some(ext) = path.extension()
            && ext == DOCUMENT_EXT
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
