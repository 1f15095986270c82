// Markdown document discovery

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// A document to validate and the id failures are reported under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MARKDOWN_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Expand files and directories into documents, in a stable order
///
/// Files named explicitly are always included. Directories are walked
/// recursively for Markdown files; ids are relative to the directory.
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for root in paths {
        if root.is_file() {
            documents.push(Document {
                id: root.display().to_string(),
                path: root.clone(),
            });
            continue;
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_markdown(path) {
                continue;
            }
            let id = path.strip_prefix(root).unwrap_or(path).display().to_string();
            documents.push(Document {
                id,
                path: path.to_path_buf(),
            });
        }
    }
    Ok(documents)
}
