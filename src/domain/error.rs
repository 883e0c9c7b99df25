use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Document id must not be empty")]
    InvalidInput,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Backend API is not responding. Please start the backend services first.")]
    BackendUnavailable,

    #[error("Window error: {0}")]
    Window(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Failures raised by the native window while serving a bridge request.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    #[error("window event loop is no longer running")]
    EventLoopClosed,

    #[error("save dialog was dropped before it answered")]
    DialogDropped,
}
