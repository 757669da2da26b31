#[derive(Debug, thiserror::Error)]
pub enum RawlineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Offline mode: {0}")]
    Offline(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Curator response error: {0}")]
    AiResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Coarse failure classes callers branch on when choosing what to tell
/// the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote store rejected the caller's access.
    Permission,
    /// Transport, status or parse failure. Usually transient.
    Network,
    NotFound,
    Upload,
    AiResponse,
    Auth,
    Invalid,
}

impl RawlineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RawlineError::Http(_)
            | RawlineError::Io(_)
            | RawlineError::Json(_)
            | RawlineError::Remote { .. }
            | RawlineError::Offline(_) => ErrorKind::Network,
            RawlineError::Permission(_) => ErrorKind::Permission,
            RawlineError::NotFound(_) => ErrorKind::NotFound,
            RawlineError::Upload(_) => ErrorKind::Upload,
            RawlineError::AiResponse(_) => ErrorKind::AiResponse,
            RawlineError::Auth(_) => ErrorKind::Auth,
            RawlineError::InvalidArgument(_) => ErrorKind::Invalid,
        }
    }

    pub fn is_permission(&self) -> bool {
        self.kind() == ErrorKind::Permission
    }
}

pub type Result<T> = std::result::Result<T, RawlineError>;
