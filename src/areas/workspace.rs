//! Working tree access: enumerating, reading and stat-ing files relative
//! to the repository root, with the metadata directory filtered out.

use crate::errors::KitError;
use crate::objects::blob::Blob;
use crate::objects::index_entry::EntryMetadata;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".kit", ".", ".."];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse_blob(&self, path: &Path) -> anyhow::Result<Blob> {
        let data = self.read_file(path)?;
        Ok(Blob::new(data))
    }

    /// Turn a user-supplied path into a worktree-relative one.
    ///
    /// Relative inputs are resolved against the repository root. A path
    /// escaping the worktree is rejected.
    pub fn relativize(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path.join(path)
        };
        let absolute = std::path::absolute(&absolute)?;

        // collapse `.` and `..` lexically; absolute() leaves them in place
        let mut normalized = PathBuf::new();
        for component in absolute.components() {
            match component {
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other.as_os_str()),
            }
        }

        normalized
            .strip_prefix(self.path.as_ref())
            .map(PathBuf::from)
            .map_err(|_| KitError::PathOutsideWorktree(path.to_path_buf()).into())
    }

    /// All regular files under `root` (the whole worktree when `None`), as
    /// worktree-relative paths. A file path lists just itself.
    pub fn list_files(&self, root: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root = match root {
            Some(path) => self.path.join(self.relativize(path)?),
            None => self.path.to_path_buf(),
        };

        if root.is_dir() {
            Ok(WalkDir::new(&root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| self.check_if_not_ignored_file_path(entry.path()))
                .collect())
        } else if root.is_file() {
            Ok(vec![
                root.strip_prefix(self.path.as_ref())
                    .map(PathBuf::from)
                    .unwrap_or_default(),
            ])
        } else {
            Err(KitError::NotAFile(root).into())
        }
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                IGNORED_PATHS.contains(&name.to_string_lossy().as_ref())
            } else {
                false
            }
        })
    }

    fn check_if_not_ignored_file_path(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() && !Self::is_ignored(path) {
            Some(path.strip_prefix(self.path.as_ref()).ok()?.to_path_buf())
        } else {
            None
        }
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let full_path = self.path.join(file_path);

        if full_path.is_dir() {
            return Err(KitError::NotAFile(file_path.to_path_buf()).into());
        }

        let content = std::fs::read(&full_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                anyhow::Error::from(KitError::NotAFile(file_path.to_path_buf()))
            } else {
                anyhow::Error::from(err)
            }
        })?;

        Ok(Bytes::from(content))
    }

    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let metadata = std::fs::metadata(self.path.join(file_path))?;

        metadata.try_into()
    }
}
