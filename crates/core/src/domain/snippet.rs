// Snippet Domain Model

/// Identifier of the document a snippet was found in (e.g. a relative path)
pub type DocumentId = String;

/// Attribute that opts a snippet out of validation
pub const NOCHECK_MARKER: &str = "nocheck";

/// A fenced block handed over by the host pipeline
///
/// Immutable once built. The engine keeps only `content` and `document`
/// after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub document: DocumentId,
    pub kind: String,
    pub content: String,
    pub attributes: Vec<String>,
}

impl Snippet {
    pub fn new(
        document: impl Into<DocumentId>,
        kind: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            kind: kind.into(),
            content: content.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// True when the snippet carries the `nocheck` marker
    pub fn is_exempt(&self) -> bool {
        is_exempt(&self.attributes)
    }
}

/// Check an attribute list for the opt-out marker
pub fn is_exempt<S: AsRef<str>>(attributes: &[S]) -> bool {
    attributes.iter().any(|a| a.as_ref() == NOCHECK_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exempt_marker() {
        let snippet = Snippet::new("index.md", "py", "print(1)").with_attributes(["nocheck"]);
        assert!(snippet.is_exempt());
    }

    #[test]
    fn test_marker_must_match_exactly() {
        let snippet =
            Snippet::new("index.md", "py", "print(1)").with_attributes(["title=nocheck", "NOCHECK"]);
        assert!(!snippet.is_exempt());
        assert!(!is_exempt::<&str>(&[]));
    }
}
