//! Upload, download and delete single blobs in one storage container.

pub mod azure_store;
pub mod config;
pub mod error;
pub mod local_store;
pub mod store;
pub mod transfer;

pub use azure_store::AzureBlobStore;
pub use config::{ConnectionConfig, ConnectionString};
pub use error::{BlobError, BlobResult};
pub use local_store::LocalFileBlobStore;
pub use store::{BlobStore, BlobStores};
pub use transfer::{BlobTransfer, TransferKind, TransferReport};
