//! Error types for the engine and its frame sources.

use std::path::PathBuf;

use thiserror::Error;

use crate::surface::Mount;

/// Failure to produce a single frame. Always recoverable.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("frame {0} is not available")]
    Unavailable(String),

    #[error("load task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// A required mount point is absent; nothing was attached.
    #[error("missing mount point: {0:?}")]
    MissingMount(Mount),

    /// The surface could not provide a 2D drawing context.
    #[error("2D drawing context unavailable")]
    NoDrawingContext,

    /// One or more load tasks died before reporting a result.
    #[error("preload interrupted: {0} load task(s) did not complete")]
    PreloadInterrupted(usize),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
