//! Newline-delimited URL handoff between `discover` and `ingest`

use std::collections::HashSet;
use std::path::Path;

use crate::error::Result;

/// Write one URL per line, creating parent directories as needed
pub async fn write_url_file<I, S>(path: &Path, urls: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut body = String::new();
    let mut count = 0;
    for url in urls {
        body.push_str(url.as_ref());
        body.push('\n');
        count += 1;
    }

    tokio::fs::write(path, body).await?;
    tracing::info!(path = %path.display(), count, "Wrote URL list");
    Ok(count)
}

/// Read a URL list, skipping blank lines and `#` comments
///
/// Duplicates are dropped; first occurrence order is kept.
pub async fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_url_list(&content))
}

fn parse_url_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(String::from)
        .collect()
}
