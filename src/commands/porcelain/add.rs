use crate::areas::repository::Repository;
use crate::objects::index_entry::IndexEntry;
use crate::objects::object::Object;
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage files for the next commit.
    ///
    /// Directory paths are expanded to every file beneath them. The whole
    /// batch is validated before the index is touched: if any path is
    /// missing, unreadable or escapes the worktree, nothing is staged.
    pub fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let mut index = self.index();
        index.rehydrate()?;

        let mut staged = Vec::new();
        for path in paths {
            let relative = self.workspace().relativize(path)?;
            for file_path in self.workspace().list_files(Some(&relative))? {
                let blob = self.workspace().parse_blob(&file_path)?;
                let stat = self.workspace().stat_file(&file_path)?;

                staged.push((file_path, blob, stat));
            }
        }

        for (file_path, blob, stat) in staged {
            let blob_id = blob.object_id()?;
            self.database().store(blob)?;

            // drop any stale entry for this path (or a staged directory
            // of the same name) before inserting the fresh one
            index.remove(Path::new(&file_path));
            index.add(IndexEntry::new(file_path, blob_id, stat));
        }

        index.write_updates()
    }
}
