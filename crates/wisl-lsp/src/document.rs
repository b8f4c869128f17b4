//! Document state management

use std::collections::HashMap;
use tower_lsp::lsp_types::Url;

/// State of a single open document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uri: Url,
    pub text: String,
    pub version: i32,
}

impl Document {
    /// Create a new document
    pub fn new(uri: Url, text: String, version: i32) -> Self {
        Self { uri, text, version }
    }

    /// Replace the document text (full sync)
    pub fn update(&mut self, text: String, version: i32) {
        self.text = text;
        self.version = version;
    }
}

/// Open documents keyed by URI
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened document, replacing any stale entry for the URI.
    pub fn open(&mut self, uri: Url, text: String, version: i32) -> Document {
        let doc = Document::new(uri.clone(), text, version);
        self.documents.insert(uri, doc.clone());
        doc
    }

    /// Apply a full-text change. Returns the updated snapshot, or `None` if
    /// the document was never opened.
    pub fn change(&mut self, uri: &Url, text: String, version: i32) -> Option<Document> {
        let doc = self.documents.get_mut(uri)?;
        doc.update(text, version);
        Some(doc.clone())
    }

    pub fn close(&mut self, uri: &Url) -> Option<Document> {
        self.documents.remove(uri)
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    /// Whether `uri` is open and still at `version`
    pub fn is_current(&self, uri: &Url, version: i32) -> bool {
        self.documents
            .get(uri)
            .is_some_and(|doc| doc.version == version)
    }

    /// Snapshot of every open document
    pub fn all(&self) -> Vec<Document> {
        self.documents.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
