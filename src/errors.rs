use std::path::PathBuf;

/// Error taxonomy for repository operations.
///
/// Errors are raised inside `anyhow::Result` chains but carried as this
/// concrete enum so callers can downcast on the named conditions.
#[derive(Debug, thiserror::Error)]
pub enum KitError {
    #[error("not a kit repository (or any of the parent directories): {0}")]
    RepositoryNotFound(PathBuf),

    #[error("unsupported repository format version: {0}")]
    UnsupportedFormatVersion(u32),

    #[error("path outside worktree: {0}")]
    PathOutsideWorktree(PathBuf),

    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("path not in the index: {0}")]
    PathNotInIndex(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("malformed object {oid}: {reason}")]
    MalformedObject { oid: String, reason: String },

    #[error("invalid tree entry mode: {0}")]
    InvalidTreeMode(String),

    #[error("checkout target is not empty: {0}")]
    TargetNotEmpty(PathBuf),

    #[error("corrupt index: {0}")]
    IndexCorrupt(String),
}
