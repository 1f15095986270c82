// Kind Domain Model

/// Kind identifier (the fence's info-string word, e.g. "bash")
pub type KindId = String;

/// How snippets of one kind are labelled and validated
///
/// Loaded once at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindConfig {
    /// Label used for downstream rendering
    pub language: String,
    /// Validator command templates, run in order
    pub validators: Vec<String>,
}

impl KindConfig {
    pub fn new(language: impl Into<String>, validators: Vec<String>) -> Self {
        Self {
            language: language.into(),
            validators,
        }
    }

    /// Config whose language label is the kind id itself
    pub fn for_kind(kind: &str, validators: Vec<String>) -> Self {
        Self::new(kind, validators)
    }
}
