use async_trait::async_trait;

use crate::azure_store::AzureBlobStore;
use crate::error::BlobResult;
use crate::local_store::LocalFileBlobStore;

/// Storing, fetching and deleting whole blobs inside a single container.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Name of the container every call targets.
    fn container(&self) -> &str;

    /// Stores `data` under `blob_name`, replacing any existing blob.
    async fn put_blob(&self, blob_name: &str, data: &[u8]) -> BlobResult<()>;

    /// Retrieves the full body of `blob_name`.
    async fn get_blob(&self, blob_name: &str) -> BlobResult<Vec<u8>>;

    async fn delete_blob(&self, blob_name: &str) -> BlobResult<()>;

    async fn blob_exists(&self, blob_name: &str) -> BlobResult<bool>;
}

#[derive(Debug, Clone)]
pub enum BlobStores {
    Local(LocalFileBlobStore),
    Azure(AzureBlobStore),
}

impl BlobStores {
    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn BlobStore {
        match self {
            BlobStores::Local(a) => a,
            BlobStores::Azure(b) => b,
        }
    }
}
