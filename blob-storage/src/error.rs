use std::io;
use thiserror::Error;

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Local I/O error on {path}: {source}")]
    LocalIo {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage service error: {0}")]
    Service(String),
}

impl BlobError {
    pub fn local_io(path: impl AsRef<std::path::Path>, source: io::Error) -> Self {
        BlobError::LocalIo {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// True for both a missing blob and a missing container.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_) | BlobError::ContainerNotFound(_))
    }
}

impl From<azure_core::Error> for BlobError {
    fn from(err: azure_core::Error) -> Self {
        use azure_core::error::ErrorKind;
        use azure_core::StatusCode;

        let message = err.to_string();
        match err.kind() {
            ErrorKind::HttpResponse { status, error_code } => {
                let code = error_code.as_deref().unwrap_or_default();
                match status {
                    StatusCode::NotFound if code == "ContainerNotFound" => {
                        BlobError::ContainerNotFound(message)
                    }
                    StatusCode::NotFound => BlobError::NotFound(message),
                    StatusCode::Conflict if code == "BlobAlreadyExists" => {
                        BlobError::AlreadyExists(message)
                    }
                    StatusCode::Unauthorized | StatusCode::Forbidden => {
                        BlobError::AuthFailure(message)
                    }
                    _ => BlobError::Service(message),
                }
            }
            ErrorKind::Io => BlobError::Network(message),
            ErrorKind::Credential => BlobError::AuthFailure(message),
            _ => BlobError::Service(message),
        }
    }
}
