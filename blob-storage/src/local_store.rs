use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::validate_blob_name;
use crate::error::{BlobError, BlobResult};
use crate::store::BlobStore;

/// A `BlobStore` backed by the local filesystem: the container is a
/// directory under `base_path` and every blob is a file inside it.
#[derive(Clone, Debug)]
pub struct LocalFileBlobStore {
    base_path: PathBuf,
    container: String,
}

impl LocalFileBlobStore {
    pub fn new(base_path: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            container: container.into(),
        }
    }

    fn container_dir(&self) -> PathBuf {
        self.base_path.join(&self.container)
    }

    async fn ensure_container_exists(&self) -> BlobResult<PathBuf> {
        let dir = self.container_dir();
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(BlobError::ContainerNotFound(dir.display().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobError::ContainerNotFound(dir.display().to_string()))
            }
            Err(e) => Err(BlobError::local_io(&dir, e)),
        }
    }

    async fn blob_path(&self, blob_name: &str) -> BlobResult<PathBuf> {
        validate_blob_name(blob_name)?;
        if !Path::new(blob_name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(BlobError::InvalidConfig(format!(
                "blob name '{}' escapes the container directory",
                blob_name
            )));
        }
        let dir = self.ensure_container_exists().await?;
        Ok(dir.join(blob_name))
    }
}

fn map_missing(path: &Path, blob_name: &str, e: std::io::Error) -> BlobError {
    if e.kind() == ErrorKind::NotFound {
        BlobError::NotFound(blob_name.to_string())
    } else {
        BlobError::local_io(path, e)
    }
}

#[async_trait]
impl BlobStore for LocalFileBlobStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn put_blob(&self, blob_name: &str, data: &[u8]) -> BlobResult<()> {
        let file_path = self.blob_path(blob_name).await?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobError::local_io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .await
            .map_err(|e| BlobError::local_io(&file_path, e))?;
        file.write_all(data)
            .await
            .map_err(|e| BlobError::local_io(&file_path, e))?;
        file.flush()
            .await
            .map_err(|e| BlobError::local_io(&file_path, e))?;
        tracing::debug!("stored {} ({} bytes)", file_path.display(), data.len());
        Ok(())
    }

    async fn get_blob(&self, blob_name: &str) -> BlobResult<Vec<u8>> {
        let file_path = self.blob_path(blob_name).await?;
        fs::read(&file_path)
            .await
            .map_err(|e| map_missing(&file_path, blob_name, e))
    }

    async fn delete_blob(&self, blob_name: &str) -> BlobResult<()> {
        let file_path = self.blob_path(blob_name).await?;
        fs::remove_file(&file_path)
            .await
            .map_err(|e| map_missing(&file_path, blob_name, e))
    }

    async fn blob_exists(&self, blob_name: &str) -> BlobResult<bool> {
        let file_path = self.blob_path(blob_name).await?;
        fs::try_exists(&file_path)
            .await
            .map_err(|e| BlobError::local_io(&file_path, e))
    }
}
