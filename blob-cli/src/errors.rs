use blob_store::BlobError;
use thiserror::Error;

pub const EXIT_OK: u8 = 0;
pub const EXIT_SERVICE: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_NOT_FOUND: u8 = 3;
pub const EXIT_ALREADY_EXISTS: u8 = 4;
pub const EXIT_AUTH: u8 = 5;
pub const EXIT_NETWORK: u8 = 6;
pub const EXIT_LOCAL_IO: u8 = 7;

#[derive(Debug, Error)]
pub enum CliErr {
    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error("No connection string given, pass --connection-string or set AZURE_STORAGE_CONNECTION_STRING")]
    MissingConnectionString,
}

impl CliErr {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliErr::MissingConnectionString => EXIT_CONFIG,
            CliErr::Blob(err) => match err {
                BlobError::InvalidConfig(_) => EXIT_CONFIG,
                BlobError::NotFound(_) | BlobError::ContainerNotFound(_) => EXIT_NOT_FOUND,
                BlobError::AlreadyExists(_) => EXIT_ALREADY_EXISTS,
                BlobError::AuthFailure(_) => EXIT_AUTH,
                BlobError::Network(_) => EXIT_NETWORK,
                BlobError::LocalIo { .. } => EXIT_LOCAL_IO,
                BlobError::Service(_) => EXIT_SERVICE,
            },
        }
    }
}
