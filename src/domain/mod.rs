pub mod error;
pub mod host;
pub mod model;

pub use error::{AppError, HostError};
pub use host::HostWindow;
pub use model::{
    DialogSelection, DownloadOutcome, DownloadRequest, FailureReason, ResolvedDestination,
    SaveDialogOptions, ARCHIVE_EXTENSION,
};
