//! Error handling types for editbridge
//!
//! The bridge core itself is quiet about most failures (no active buffer, path
//! mismatch). These errors cover what does surface: collaborator I/O, session
//! lifecycle misuse and wire decoding.

use std::path::{Path, PathBuf};
use std::sync::PoisonError;
use thiserror::Error;

/// Error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The persistent-storage collaborator failed
    #[error("Storage error at {}: {message}", path.display())]
    Storage { path: PathBuf, message: String },

    /// A non-active buffer could not be materialized
    #[error("Could not materialize buffer for {}: {message}", path.display())]
    Materialize { path: PathBuf, message: String },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Wire message could not be decoded or encoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Operation requires `start()` to have been called
    #[error("Session bridge is not started")]
    NotStarted,

    /// `start()` called twice without `stop()`
    #[error("Session bridge is already started")]
    AlreadyStarted,

    /// No tokio runtime is available to schedule deferred work
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A peer-supplied path does not name a file inside the project
    #[error("Invalid project path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Helper trait to convert PoisonError into a recovered guard
pub trait LockResultExt<T> {
    /// Recover the guard from a poisoned lock, logging which operation hit it.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "editbridge::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}

impl BridgeError {
    /// Create a storage error for the given absolute path
    pub fn storage(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        BridgeError::Storage {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a materialization error for the given absolute path
    pub fn materialize(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        BridgeError::Materialize {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BridgeError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid path error for a rejected wire path
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        BridgeError::InvalidPath {
            path: path.into(),
            reason,
        }
    }
}
