use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Append `.{extension}` unless `name` already ends with it (case-insensitive).
pub fn ensure_extension(name: &str, extension: &str) -> String {
    let suffix = format!(".{}", extension);
    if name.to_lowercase().ends_with(&suffix.to_lowercase()) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Build the name offered in the save dialog. An empty (or fully
/// sanitized-away) filename falls back to `fallback`.
pub fn suggested_file_name(filename: &str, fallback: &str, extension: &str) -> String {
    let cleaned = sanitize_filename(filename);
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');
    let stem = if cleaned.is_empty() {
        sanitize_filename(fallback)
    } else {
        cleaned.to_string()
    };

    ensure_extension(&stem, extension)
}

fn temp_sibling(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name")
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    Ok(dir.join(format!(
        ".{}.{}-{}.part",
        file_name.to_string_lossy(),
        std::process::id(),
        n
    )))
}

/// Write `bytes` to `path` so that readers either see the previous file or
/// the complete new one: the data goes to a sibling temp file which is
/// synced and then renamed over the destination.
pub async fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = temp_sibling(path)?;

    let result = async {
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }

    result
}
