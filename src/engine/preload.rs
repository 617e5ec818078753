//! Frame sources and the bounded load pool.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::FrameError;
use crate::types::Bitmap;

/// Anything that can turn a frame path into a decoded bitmap.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn load(&self, path: &str) -> Result<Bitmap, FrameError>;
}

/// Reads frames from disk and decodes them off the async workers.
#[derive(Debug, Clone)]
pub struct FsFrameSource {
    root: PathBuf,
}

impl FsFrameSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsFrameSource { root: root.into() }
    }
}

#[async_trait]
impl FrameSource for FsFrameSource {
    async fn load(&self, path: &str) -> Result<Bitmap, FrameError> {
        let full = self.root.join(path);
        let bytes = tokio::fs::read(&full).await.map_err(|source| FrameError::Io {
            path: full.clone(),
            source,
        })?;
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| FrameError::Task(e.to_string()))?
            .map_err(|source| FrameError::Decode { path: full, source })?;
        Ok(Bitmap::new(decoded.into_rgba8()))
    }
}

/// Result of one pooled load, tagged with its zero-based index.
pub type LoadResult = (usize, Result<Bitmap, FrameError>);

/// Start loading `jobs` with at most `concurrency` loads in flight.
///
/// Each task waits for a permit before touching the source, so the pool
/// never has more than `concurrency` outstanding requests. Completion order
/// is whatever the scheduler produces.
pub fn spawn_pool(
    source: Arc<dyn FrameSource>,
    jobs: Vec<(usize, String)>,
    concurrency: usize,
) -> JoinSet<LoadResult> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for (index, path) in jobs {
        let permits = Arc::clone(&permits);
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (index, Err(FrameError::Task(e.to_string()))),
            };
            debug!(index, path = %path, "loading frame");
            (index, source.load(&path).await)
        });
    }
    tasks
}
