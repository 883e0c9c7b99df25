use std::path::PathBuf;

use serde::Serialize;

use super::AppError;

/// Extension every saved artifact carries.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// One user-initiated download, consumed by a single bridge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub document_id: String,
    pub suggested_filename: String,
}

impl DownloadRequest {
    pub fn new(
        document_id: impl Into<String>,
        suggested_filename: impl Into<String>,
    ) -> Result<Self, AppError> {
        let document_id = document_id.into();
        if document_id.trim().is_empty() {
            return Err(AppError::InvalidInput);
        }

        Ok(Self {
            document_id,
            suggested_filename: suggested_filename.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

/// Everything the native save dialog is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDialogOptions {
    pub title: String,
    pub directory: Option<PathBuf>,
    pub file_name: String,
    pub filters: Vec<FileFilter>,
}

impl SaveDialogOptions {
    /// Save dialog for a ZIP archive, starting in `directory` when known.
    pub fn archive(file_name: String, directory: Option<PathBuf>) -> Self {
        Self {
            title: "Save document".to_string(),
            directory,
            file_name,
            filters: vec![
                FileFilter::new("ZIP archive", &[ARCHIVE_EXTENSION]),
                FileFilter::new("All files", &["*"]),
            ],
        }
    }
}

/// Raw answer of a save dialog. Depending on the platform the primitive
/// reports nothing, one path, or a list of paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogSelection {
    None,
    Single(PathBuf),
    Multiple(Vec<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDestination {
    Chosen(PathBuf),
    Cancelled,
}

impl DialogSelection {
    /// Collapse the dialog answer into one destination. Only the first
    /// entry of a list is meaningful; empty paths count as a cancel.
    pub fn resolve(self) -> ResolvedDestination {
        let path = match self {
            DialogSelection::None => None,
            DialogSelection::Single(path) => Some(path),
            DialogSelection::Multiple(paths) => paths.into_iter().next(),
        };

        match path {
            Some(path) if !path.as_os_str().is_empty() => ResolvedDestination::Chosen(path),
            _ => ResolvedDestination::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidRequest,
    Fetch,
    BackendStatus,
    Dialog,
    Cancelled,
    Write,
}

/// Result of one bridge call, as handed back to script content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOutcome {
    pub success: bool,
    pub path: Option<String>,
    pub failure_reason: Option<FailureReason>,
}

impl DownloadOutcome {
    pub fn saved(path: &std::path::Path) -> Self {
        Self {
            success: true,
            path: Some(path.to_string_lossy().into_owned()),
            failure_reason: None,
        }
    }

    pub fn failed(reason: FailureReason) -> Self {
        Self {
            success: false,
            path: None,
            failure_reason: Some(reason),
        }
    }
}
