// Validation Request Domain Model

use super::snippet::DocumentId;

/// One (document, snippet text, command) triple submitted for validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub document: DocumentId,
    pub content: String,
    pub command: String,
}

impl ValidationRequest {
    pub fn new(
        document: impl Into<DocumentId>,
        content: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            content: content.into(),
            command: command.into(),
        }
    }

    /// Cache identity of this request; the document is not part of it
    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            content: self.content.clone(),
            command: self.command.clone(),
        }
    }
}

/// Identity of a unit of validation work
///
/// Kept as the two full strings so distinct inputs can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content: String,
    pub command: String,
}
