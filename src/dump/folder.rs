use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::DumpError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderStats {
    pub files: usize,
    pub bytes: u64,
}

/// Counts regular files below `dir` and sums their sizes.
pub fn folder_stats(dir: &Path) -> Result<FolderStats, DumpError> {
    let mut stats = FolderStats::default();

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| DumpError::Filesystem {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(|e| DumpError::Filesystem {
                path: entry.path().to_path_buf(),
                source: e.into(),
            })?;
            stats.files += 1;
            stats.bytes += metadata.len();
        }
    }

    Ok(stats)
}

/// `/backups/dump` stamped with 2024-03-01 becomes `/backups/dump-2024-03-01`.
pub fn stamped_path(dir: &Path, date: NaiveDate) -> PathBuf {
    let mut name = dir
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("dump"));
    name.push(format!("-{}", date.format("%Y-%m-%d")));
    dir.with_file_name(name)
}

/// Renames the dump directory to its dated name, replacing a leftover
/// directory from an earlier run on the same day.
pub async fn stamp(dir: &Path, date: NaiveDate) -> Result<PathBuf, DumpError> {
    let target = stamped_path(dir, date);
    let fs_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| DumpError::Filesystem { path, source }
    };

    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        warn!("Dump folder {} already exists, removing it", target.display());
        tokio::fs::remove_dir_all(&target)
            .await
            .map_err(fs_error(&target))?;
    }

    tokio::fs::rename(dir, &target).await.map_err(fs_error(dir))?;
    info!("Dump folder renamed to {}", target.display());
    Ok(target)
}

/// Best-effort removal of local dump directories.
pub async fn cleanup(paths: &[&Path]) {
    for path in paths {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            continue;
        }
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => info!("Cleanup: removed {}", path.display()),
            Err(e) => warn!("Cleanup: failed to remove {}: {e}", path.display()),
        }
    }
}
