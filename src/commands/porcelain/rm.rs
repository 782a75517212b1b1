use crate::areas::repository::Repository;
use crate::errors::KitError;
use std::io::Write;
use std::path::PathBuf;

impl Repository {
    /// Unstage paths, removing the working tree copies as well unless
    /// `cached` is set.
    ///
    /// Every path must be tracked; one unknown path aborts the whole batch
    /// with the index unchanged. Only the unstaged files themselves are
    /// deleted, so untracked files under a removed directory survive.
    pub fn rm(&self, paths: &[PathBuf], cached: bool) -> anyhow::Result<()> {
        let mut index = self.index();
        index.rehydrate()?;

        let mut relatives = Vec::new();
        for path in paths {
            let relative = self.workspace().relativize(path)?;

            if !index.is_tracked(&relative) {
                return Err(KitError::PathNotInIndex(path.clone()).into());
            }

            relatives.push(relative);
        }

        for relative in relatives {
            for removed in index.remove(&relative) {
                if !cached {
                    let full_path = self.path().join(&removed);
                    if full_path.exists() {
                        std::fs::remove_file(&full_path)?;
                    }
                }

                writeln!(self.writer(), "rm '{}'", removed.display())?;
            }
        }

        index.write_updates()
    }
}
