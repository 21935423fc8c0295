//! Position/offset conversion for any file in the session.
//!
//! The active file is answered directly against its live buffer. Any other
//! file is materialized on every call so the answer reflects its content at
//! call time.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::BridgeResult;
use crate::host::{BufferMaterializer, EditorBuffer};
use crate::protocol::{BufferPosition, LinearOffset};

/// Where an operation on a project file lands.
#[derive(Clone)]
pub enum BufferTarget {
    /// The file is the active buffer.
    Live(Arc<dyn EditorBuffer>),
    /// The file is not open; absolute path for the storage collaborator.
    Stored(PathBuf),
}

impl std::fmt::Debug for BufferTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferTarget::Live(buffer) => f
                .debug_tuple("Live")
                .field(&buffer.absolute_path())
                .finish(),
            BufferTarget::Stored(path) => f.debug_tuple("Stored").field(path).finish(),
        }
    }
}

pub struct Translator {
    materializer: Arc<dyn BufferMaterializer>,
}

impl Translator {
    pub fn new(materializer: Arc<dyn BufferMaterializer>) -> Self {
        Self { materializer }
    }

    /// Convert without suspending. Returns None unless `target` is live.
    pub fn position_from_offset_now(
        target: &BufferTarget,
        offset: LinearOffset,
    ) -> Option<BufferPosition> {
        match target {
            BufferTarget::Live(buffer) => Some(buffer.position_from_offset(offset)),
            BufferTarget::Stored(_) => None,
        }
    }

    /// Convert without suspending. Returns None unless `target` is live.
    pub fn offset_from_position_now(
        target: &BufferTarget,
        position: BufferPosition,
    ) -> Option<LinearOffset> {
        match target {
            BufferTarget::Live(buffer) => Some(buffer.offset_from_position(position)),
            BufferTarget::Stored(_) => None,
        }
    }

    pub async fn position_from_offset(
        &self,
        target: &BufferTarget,
        offset: LinearOffset,
    ) -> BridgeResult<BufferPosition> {
        if let Some(position) = Self::position_from_offset_now(target, offset) {
            return Ok(position);
        }
        let buffer = self.buffer_for(target).await?;
        Ok(buffer.position_from_offset(offset))
    }

    pub async fn offset_from_position(
        &self,
        target: &BufferTarget,
        position: BufferPosition,
    ) -> BridgeResult<LinearOffset> {
        if let Some(offset) = Self::offset_from_position_now(target, position) {
            return Ok(offset);
        }
        let buffer = self.buffer_for(target).await?;
        Ok(buffer.offset_from_position(position))
    }

    async fn buffer_for(&self, target: &BufferTarget) -> BridgeResult<Arc<dyn EditorBuffer>> {
        match target {
            BufferTarget::Live(buffer) => Ok(Arc::clone(buffer)),
            BufferTarget::Stored(path) => self.materializer.materialize(path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BoxFuture, MemoryBuffer};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMaterializer {
        content: String,
        calls: AtomicUsize,
    }

    impl BufferMaterializer for CountingMaterializer {
        fn materialize<'a>(
            &'a self,
            path: &'a Path,
        ) -> BoxFuture<'a, BridgeResult<Arc<dyn EditorBuffer>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let buffer: Arc<dyn EditorBuffer> =
                Arc::new(MemoryBuffer::with_path(path, self.content.clone()));
            Box::pin(async move { Ok(buffer) })
        }
    }

    fn translator(content: &str) -> (Translator, Arc<CountingMaterializer>) {
        let materializer = Arc::new(CountingMaterializer {
            content: content.to_string(),
            calls: AtomicUsize::new(0),
        });
        (Translator::new(materializer.clone()), materializer)
    }

    #[tokio::test]
    async fn test_live_target_never_materializes() {
        let (translator, materializer) = translator("unused");
        let target = BufferTarget::Live(Arc::new(MemoryBuffer::scratch("ab\ncd")));

        let position = translator.position_from_offset(&target, 4).await.unwrap();
        let offset = translator
            .offset_from_position(&target, BufferPosition::new(1, 2))
            .await
            .unwrap();

        assert_eq!(position, BufferPosition::new(1, 1));
        assert_eq!(offset, 5);
        assert_eq!(materializer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stored_target_materializes_on_every_call() {
        let (translator, materializer) = translator("x\ny\nz");
        let target = BufferTarget::Stored(PathBuf::from("/project/b.txt"));

        assert_eq!(
            translator.position_from_offset(&target, 4).await.unwrap(),
            BufferPosition::new(2, 0)
        );
        assert_eq!(
            translator
                .offset_from_position(&target, BufferPosition::new(1, 1))
                .await
                .unwrap(),
            3
        );
        assert_eq!(materializer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fast_path_only_answers_live_targets() {
        let live = BufferTarget::Live(Arc::new(MemoryBuffer::scratch("abc")));
        let stored = BufferTarget::Stored(PathBuf::from("/project/c.txt"));

        assert_eq!(
            Translator::offset_from_position_now(&live, BufferPosition::new(0, 2)),
            Some(2)
        );
        assert_eq!(Translator::position_from_offset_now(&stored, 0), None);
    }
}
