//! Whole-file transfers between the local filesystem and one blob container.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::validate_blob_name;
use crate::error::{BlobError, BlobResult};
use crate::store::BlobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Upload,
    Download,
    Delete,
}

/// What a successful operation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub kind: TransferKind,
    pub container: String,
    pub blob_name: String,
    pub local_path: Option<PathBuf>,
    pub bytes: usize,
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = format!("{}/{}", self.container, self.blob_name);
        match (self.kind, &self.local_path) {
            (TransferKind::Upload, Some(path)) => {
                write!(f, "uploaded {} ({} bytes) to {}", path.display(), self.bytes, target)
            }
            (TransferKind::Download, Some(path)) => {
                write!(f, "downloaded {} ({} bytes) to {}", target, self.bytes, path.display())
            }
            _ => write!(f, "deleted {}", target),
        }
    }
}

/// Runs one upload, download or delete against a store bound to a container.
pub struct BlobTransfer<'a> {
    store: &'a dyn BlobStore,
}

impl<'a> BlobTransfer<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self { store }
    }

    /// Reads `local_path` into memory and stores it as `blob_name`.
    ///
    /// With `overwrite` false an existing blob is left alone and
    /// `BlobError::AlreadyExists` is returned.
    pub async fn upload(
        &self,
        local_path: impl AsRef<Path>,
        blob_name: &str,
        overwrite: bool,
    ) -> BlobResult<TransferReport> {
        let local_path = local_path.as_ref();
        validate_blob_name(blob_name)?;

        let data = fs::read(local_path)
            .await
            .map_err(|e| BlobError::local_io(local_path, e))?;

        if !overwrite && self.store.blob_exists(blob_name).await? {
            return Err(BlobError::AlreadyExists(format!(
                "{}/{}",
                self.store.container(),
                blob_name
            )));
        }

        self.store.put_blob(blob_name, &data).await?;
        tracing::info!(
            "uploaded {} as {}/{} ({} bytes)",
            local_path.display(),
            self.store.container(),
            blob_name,
            data.len()
        );

        Ok(self.report(TransferKind::Upload, blob_name, Some(local_path), data.len()))
    }

    /// Fetches `blob_name` and writes it to `local_path`, replacing any file there.
    ///
    /// The destination is only opened once the whole body has arrived. An
    /// existing file is truncated in place, keeping its inode and permissions,
    /// and a read-only one fails with `LocalIo` before anything is written.
    pub async fn download(
        &self,
        blob_name: &str,
        local_path: impl AsRef<Path>,
    ) -> BlobResult<TransferReport> {
        let local_path = local_path.as_ref();
        validate_blob_name(blob_name)?;

        let data = self.store.get_blob(blob_name).await?;
        let bytes = data.len();

        write_truncating(local_path, &data).await?;

        tracing::info!(
            "downloaded {}/{} to {} ({} bytes)",
            self.store.container(),
            blob_name,
            local_path.display(),
            bytes
        );

        Ok(self.report(TransferKind::Download, blob_name, Some(local_path), bytes))
    }

    pub async fn delete(&self, blob_name: &str) -> BlobResult<TransferReport> {
        validate_blob_name(blob_name)?;
        self.store.delete_blob(blob_name).await?;
        tracing::info!("deleted {}/{}", self.store.container(), blob_name);
        Ok(self.report(TransferKind::Delete, blob_name, None, 0))
    }

    fn report(
        &self,
        kind: TransferKind,
        blob_name: &str,
        local_path: Option<&Path>,
        bytes: usize,
    ) -> TransferReport {
        TransferReport {
            kind,
            container: self.store.container().to_string(),
            blob_name: blob_name.to_string(),
            local_path: local_path.map(Path::to_path_buf),
            bytes,
        }
    }
}

async fn write_truncating(path: &Path, data: &[u8]) -> BlobResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| BlobError::local_io(path, e))?;
    file.write_all(data)
        .await
        .map_err(|e| BlobError::local_io(path, e))?;
    file.flush()
        .await
        .map_err(|e| BlobError::local_io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_store::LocalFileBlobStore;
    use tempfile::{tempdir, TempDir};
    use uuid::Uuid;

    const CONTAINER: &str = "lvtlvtcontainer";

    fn setup() -> (TempDir, LocalFileBlobStore) {
        let temp_dir = tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("remote").join(CONTAINER)).unwrap();
        let store = LocalFileBlobStore::new(temp_dir.path().join("remote"), CONTAINER);
        (temp_dir, store)
    }

    fn write_local(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_then_download_is_identical() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let original: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let source = write_local(temp_dir.path(), "generated-image.png", &original);
        let dest = temp_dir.path().join("generated-image_down.png");

        let report = transfer
            .upload(&source, "generated-image.png", true)
            .await
            .unwrap();
        assert_eq!(report.kind, TransferKind::Upload);
        assert_eq!(report.bytes, original.len());
        assert_eq!(report.container, CONTAINER);

        let report = transfer.download("generated-image.png", &dest).await.unwrap();
        assert_eq!(report.bytes, original.len());
        assert_eq!(std::fs::read(&dest).unwrap(), original);
    }

    #[tokio::test]
    async fn test_delete_after_upload_makes_download_fail() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);
        let blob_name = Uuid::new_v4().to_string();

        let source = write_local(temp_dir.path(), "source.bin", b"payload");
        transfer.upload(&source, &blob_name, true).await.unwrap();

        let report = transfer.delete(&blob_name).await.unwrap();
        assert_eq!(report.kind, TransferKind::Delete);
        assert_eq!(report.to_string(), format!("deleted {}/{}", CONTAINER, blob_name));

        let err = transfer
            .download(&blob_name, temp_dir.path().join("out.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
        assert!(!temp_dir.path().join("out.bin").exists());

        let err = transfer.delete(&blob_name).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let first = write_local(temp_dir.path(), "first.txt", b"the first, longer version");
        let second = write_local(temp_dir.path(), "second.txt", b"v2");
        transfer.upload(&first, "doc.txt", true).await.unwrap();
        transfer.upload(&second, "doc.txt", true).await.unwrap();

        let dest = temp_dir.path().join("doc_down.txt");
        transfer.download("doc.txt", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_upload_without_overwrite_keeps_existing_blob() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let first = write_local(temp_dir.path(), "first.txt", b"original");
        let second = write_local(temp_dir.path(), "second.txt", b"replacement");
        transfer.upload(&first, "doc.txt", false).await.unwrap();

        let err = transfer.upload(&second, "doc.txt", false).await.unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists(_)));
        assert_eq!(store.get_blob("doc.txt").await.unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_upload_missing_local_file() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let err = transfer
            .upload(temp_dir.path().join("does-not-exist.png"), "x.png", true)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::LocalIo { .. }));
        assert!(!store.blob_exists("x.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_container_reports_failure() {
        let temp_dir = tempdir().unwrap();
        let store = LocalFileBlobStore::new(temp_dir.path(), "missing-container");
        let transfer = BlobTransfer::new(&store);

        let source = write_local(temp_dir.path(), "source.bin", b"payload");
        let err = transfer.upload(&source, "source.bin", true).await.unwrap_err();
        assert!(matches!(err, BlobError::ContainerNotFound(_)));

        let err = transfer.delete("source.bin").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_download_keeps_existing_destination() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let dest = write_local(temp_dir.path(), "keep.bin", b"precious");
        let err = transfer.download("never-uploaded.bin", &dest).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
        assert_eq!(std::fs::read(&dest).unwrap(), b"precious");
    }

    #[tokio::test]
    async fn test_download_to_unwritable_path() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let source = write_local(temp_dir.path(), "source.bin", b"payload");
        transfer.upload(&source, "source.bin", true).await.unwrap();

        // A directory cannot be replaced by a file.
        let dest = temp_dir.path().join("occupied");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("inner.txt"), b"untouched").unwrap();

        let err = transfer.download("source.bin", &dest).await.unwrap_err();
        assert!(matches!(err, BlobError::LocalIo { .. }));
        assert_eq!(std::fs::read(dest.join("inner.txt")).unwrap(), b"untouched");

        let err = transfer
            .download("source.bin", temp_dir.path().join("no-such-dir").join("out.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::LocalIo { .. }));
    }

    #[cfg(unix)]
    fn can_bypass_permissions(path: &Path) -> bool {
        // Root (or CAP_DAC_OVERRIDE) writes through read-only modes.
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(path)
            .is_ok()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_to_read_only_file_keeps_it() {
        use std::os::unix::fs::PermissionsExt;

        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let source = write_local(temp_dir.path(), "source.bin", b"new");
        transfer.upload(&source, "b.bin", true).await.unwrap();

        let dest = write_local(temp_dir.path(), "ro.bin", b"precious");
        std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o444)).unwrap();
        if can_bypass_permissions(&dest) {
            return;
        }

        let err = transfer.download("b.bin", &dest).await.unwrap_err();
        assert!(matches!(err, BlobError::LocalIo { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"precious");
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_into_read_only_directory() {
        use std::os::unix::fs::PermissionsExt;

        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let source = write_local(temp_dir.path(), "source.bin", b"new");
        transfer.upload(&source, "b.bin", true).await.unwrap();

        let locked = temp_dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();
        let writable = can_bypass_permissions(&locked.join("check.tmp"));
        if !writable {
            let err = transfer
                .download("b.bin", locked.join("out.bin"))
                .await
                .unwrap_err();
            assert!(matches!(err, BlobError::LocalIo { .. }));
            assert!(!locked.join("out.bin").exists());
        }
        // Let the temp dir clean itself up.
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_download_truncates_existing_writable_file() {
        let (temp_dir, store) = setup();
        let transfer = BlobTransfer::new(&store);

        let source = write_local(temp_dir.path(), "source.bin", b"v2");
        transfer.upload(&source, "doc.bin", true).await.unwrap();

        let dest = write_local(temp_dir.path(), "doc_down.bin", b"a much longer previous body");
        transfer.download("doc.bin", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"v2");
    }

    #[test]
    fn test_report_display() {
        let report = TransferReport {
            kind: TransferKind::Upload,
            container: CONTAINER.to_string(),
            blob_name: "generated-image.png".to_string(),
            local_path: Some(PathBuf::from("generated-image.png")),
            bytes: 42,
        };
        assert_eq!(
            report.to_string(),
            "uploaded generated-image.png (42 bytes) to lvtlvtcontainer/generated-image.png"
        );
    }
}
