//! VFS error types.
//!
//! Only genuine backend failures surface as errors. Missing files, missing
//! directories and unresolved mappings are reported through soft defaults
//! (empty content, `false`, `None`) by the operations themselves.

use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Expected a file, got a directory path.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Path cannot be used for this operation.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// File content is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Directory enumeration failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Mount manifest could not be parsed.
    #[error("manifest parse error: {0}")]
    Manifest(#[from] ron::error::SpannedError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::Utf8(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            VfsError::Walk(e) => e.into(),
            VfsError::Manifest(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            VfsError::Io(e) => e,
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
