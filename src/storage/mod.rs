use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use object_store::path::{Path as ObjectPath, PathPart};
use object_store::{ObjectStore, PutPayload, WriteMultipart};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::StorageTarget;
use crate::error::UploadError;
use crate::progress::UploadProgress;

mod bucket;
mod providers;

pub use bucket::{BucketAdmin, BucketStatus};

/// Part size for multipart uploads. Files up to twice this size go in one put.
pub const PART_SIZE: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub files: usize,
    pub bytes: u64,
}

struct LocalFile {
    path: PathBuf,
    key: ObjectPath,
    size: u64,
}

/// Uploads a dump directory to one bucket of one provider.
#[derive(Debug, Clone)]
pub struct Uploader {
    provider: &'static str,
    bucket: String,
    store: Arc<dyn ObjectStore>,
    admin: Option<BucketAdmin>,
    part_size: usize,
}

impl Uploader {
    pub fn from_target(target: &StorageTarget, bucket: &str) -> Result<Self, UploadError> {
        let client =
            providers::build_client(target, bucket).map_err(|source| UploadError::Client {
                provider: target.provider(),
                source,
            })?;
        Ok(Self::with_store(target.provider(), bucket, client.store).with_admin(client.admin))
    }

    pub fn with_store(provider: &'static str, bucket: &str, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            provider,
            bucket: bucket.to_string(),
            store,
            admin: None,
            part_size: PART_SIZE,
        }
    }

    /// Checks for the bucket, and creates it, before anything is uploaded.
    pub fn with_admin(mut self, admin: BucketAdmin) -> Self {
        self.admin = Some(admin);
        self
    }

    #[cfg(test)]
    fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size;
        self
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Creates the bucket when it is missing. Stores without an admin are
    /// taken as ready.
    pub async fn ensure_bucket(&self) -> Result<(), UploadError> {
        let Some(admin) = &self.admin else {
            return Ok(());
        };

        match admin.ensure(self.provider, &self.bucket).await? {
            BucketStatus::Existing => info!(
                "{} bucket '{}' already exists and is owned by you",
                self.provider, self.bucket
            ),
            BucketStatus::Created => info!("{} bucket '{}' created", self.provider, self.bucket),
        }
        Ok(())
    }

    /// Uploads every regular file below `dir`. Keys are the `/`-joined paths
    /// relative to `dir`, placed under `prefix` when one is given.
    pub async fn upload_dir(
        &self,
        dir: &Path,
        prefix: Option<&str>,
        progress: &UploadProgress,
    ) -> Result<UploadSummary, UploadError> {
        let files = collect_files(dir, prefix)?;
        let mut summary = UploadSummary::default();

        info!(
            "Uploading {} files from {} to {} bucket '{}'",
            files.len(),
            dir.display(),
            self.provider,
            self.bucket
        );

        for file in &files {
            progress.set_file(self.provider, file.key.as_ref());
            self.put_file(file, progress).await?;
            debug!(
                "{} stored as {} on {} bucket '{}'",
                file.path.display(),
                file.key,
                self.provider,
                self.bucket
            );
            summary.files += 1;
            summary.bytes += file.size;
        }

        info!(
            "{} files ({} bytes) uploaded to {} bucket '{}'",
            summary.files, summary.bytes, self.provider, self.bucket
        );
        Ok(summary)
    }

    async fn put_file(&self, file: &LocalFile, progress: &UploadProgress) -> Result<(), UploadError> {
        let read_error = |source| UploadError::Read {
            path: file.path.clone(),
            source,
        };
        let store_error = |source| UploadError::Store {
            provider: self.provider,
            key: file.key.to_string(),
            source,
        };

        if file.size <= 2 * self.part_size as u64 {
            let data = tokio::fs::read(&file.path).await.map_err(read_error)?;
            self.store
                .put(&file.key, PutPayload::from(data))
                .await
                .map_err(store_error)?;
            progress.advance(file.size);
            return Ok(());
        }

        let mut reader = tokio::fs::File::open(&file.path).await.map_err(read_error)?;
        let upload = self.store.put_multipart(&file.key).await.map_err(store_error)?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, self.part_size);
        let mut buf = vec![0u8; self.part_size];
        // Bytes handed to the writer but not yet confirmed as uploaded.
        let mut pending = 0u64;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(read_error(e));
                }
            };
            // One part in flight at a time.
            if let Err(e) = writer.wait_for_capacity(1).await {
                let _ = writer.abort().await;
                return Err(store_error(e));
            }
            progress.advance(pending);
            writer.write(&buf[..n]);
            pending = n as u64;
        }

        writer.finish().await.map_err(store_error)?;
        progress.advance(pending);
        Ok(())
    }
}

fn collect_files(dir: &Path, prefix: Option<&str>) -> Result<Vec<LocalFile>, UploadError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| UploadError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        let size = entry
            .metadata()
            .map_err(|source| UploadError::Walk {
                path: path.clone(),
                source,
            })?
            .len();
        let key = object_key(dir, &path, prefix)?;
        files.push(LocalFile { path, key, size });
    }

    Ok(files)
}

fn object_key(dir: &Path, path: &Path, prefix: Option<&str>) -> Result<ObjectPath, UploadError> {
    let key_error = |reason: String| UploadError::Key {
        path: path.to_path_buf(),
        reason,
    };

    let relative = path
        .strip_prefix(dir)
        .map_err(|_| key_error("outside of the dump directory".to_string()))?;

    let mut parts: Vec<&str> = prefix
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // mongodump escapes names itself (`%2F`), so file names are kept verbatim.
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name
                    .to_str()
                    .ok_or_else(|| key_error("file name is not UTF-8".to_string()))?;
                PathPart::parse(name).map_err(|e| key_error(e.to_string()))?;
                parts.push(name);
            }
            _ => return Err(key_error("unexpected path component".to_string())),
        }
    }

    ObjectPath::parse(parts.join("/")).map_err(|e| key_error(e.to_string()))
}
