//! Filesystem-backed storage and buffer materialization.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use super::{BoxFuture, BufferMaterializer, EditorBuffer, MemoryBuffer, Storage};
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::ChangeRecord;
use crate::text::{LineEnding, apply_change, normalize_line_endings};

const LOG_TARGET: &str = "editbridge::fs";

/// Storage that reads and writes files directly with `tokio::fs`.
///
/// `change` applies positions against `\n`-normalized content and keeps the
/// file's own line ending style when writing it back.
#[derive(Debug, Default, Clone)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

async fn ensure_parent(path: &Path) -> BridgeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BridgeError::storage(parent, e.to_string()))?;
    }
    Ok(())
}

impl Storage for FsStorage {
    fn change<'a>(
        &'a self,
        path: &'a Path,
        change: &'a ChangeRecord,
    ) -> BoxFuture<'a, BridgeResult<()>> {
        Box::pin(async move {
            let current = match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
                Err(e) => return Err(BridgeError::storage(path, e.to_string())),
            };
            let ending = LineEnding::detect(&current);
            let updated = apply_change(&normalize_line_endings(&current), change);
            ensure_parent(path).await?;
            tokio::fs::write(path, ending.restore(&updated).as_bytes())
                .await
                .map_err(|e| BridgeError::storage(path, e.to_string()))?;
            debug!(
                target: LOG_TARGET,
                "Applied change at {} to {}",
                change.from,
                path.display()
            );
            Ok(())
        })
    }

    fn create_file<'a>(
        &'a self,
        path: &'a Path,
        content: &'a str,
    ) -> BoxFuture<'a, BridgeResult<()>> {
        Box::pin(async move {
            ensure_parent(path).await?;
            tokio::fs::write(path, content)
                .await
                .map_err(|e| BridgeError::storage(path, e.to_string()))?;
            debug!(target: LOG_TARGET, "Created file {}", path.display());
            Ok(())
        })
    }

    fn create_directory<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, BridgeResult<()>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| BridgeError::storage(path, e.to_string()))?;
            debug!(target: LOG_TARGET, "Created directory {}", path.display());
            Ok(())
        })
    }

    fn delete_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, BridgeResult<()>> {
        Box::pin(async move {
            let metadata = tokio::fs::symlink_metadata(path)
                .await
                .map_err(|e| BridgeError::storage(path, e.to_string()))?;
            let result = if metadata.is_dir() {
                tokio::fs::remove_dir_all(path).await
            } else {
                tokio::fs::remove_file(path).await
            };
            result.map_err(|e| BridgeError::storage(path, e.to_string()))?;
            debug!(target: LOG_TARGET, "Deleted {}", path.display());
            Ok(())
        })
    }
}

/// Materializes non-active files as in-memory buffers read from disk.
///
/// Line endings are normalized to `\n`. A file that does not exist yet
/// materializes as an empty buffer.
#[derive(Debug, Default, Clone)]
pub struct FsMaterializer;

impl FsMaterializer {
    pub fn new() -> Self {
        Self
    }
}

impl BufferMaterializer for FsMaterializer {
    fn materialize<'a>(
        &'a self,
        path: &'a Path,
    ) -> BoxFuture<'a, BridgeResult<Arc<dyn EditorBuffer>>> {
        Box::pin(async move {
            let content = match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(
                        target: LOG_TARGET,
                        "{} does not exist; materializing empty buffer",
                        path.display()
                    );
                    String::new()
                }
                Err(e) => return Err(BridgeError::materialize(path, e.to_string())),
            };
            let content = normalize_line_endings(&content).into_owned();
            let buffer: Arc<dyn EditorBuffer> =
                Arc::new(MemoryBuffer::with_path(PathBuf::from(path), content));
            Ok(buffer)
        })
    }
}
