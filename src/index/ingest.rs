//! Bulk loading of plain-text documents into a local index.

use super::memory::MemoryIndex;

use anyhow::Result;
use std::path::Path;

/// Adds every `*.txt` file in `dir` to `index`, using the file name as uri.
///
/// Returns the number of documents loaded.
pub async fn load_directory(index: &MemoryIndex, dir: &Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut loaded = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
            continue;
        }
        let Some(uri) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let title = extract_title(&text);
        index.add_document(uri, title.as_deref(), &text);
        loaded += 1;
    }

    tracing::info!("Loaded {} document(s) from {}", loaded, dir.display());
    Ok(loaded)
}

/// `Title:` header value if present, otherwise the first non-empty line.
pub fn extract_title(text: &str) -> Option<String> {
    let header = text.lines().find_map(|line| {
        line.strip_prefix("Title:")
            .map(|value| value.trim().to_string())
    });

    header
        .or_else(|| {
            text.lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
        })
        .filter(|value| !value.is_empty())
}
