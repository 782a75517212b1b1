use crate::areas::repository::Repository;
use crate::errors::KitError;
use crate::objects::entry_mode::EntryMode;
use crate::objects::object_id::ObjectId;
use crate::objects::object_type::ObjectType;
use anyhow::Context;
use std::path::{Path, PathBuf};

impl Repository {
    /// Materialize the tree of a commit (or a bare tree) into `target`.
    ///
    /// The target must not exist yet or be an empty directory; an occupied
    /// target aborts before any file is written. Symlink entries are
    /// written as plain files holding the link text, submodule entries are
    /// skipped.
    pub fn checkout(&self, revision: &str, target: &Path) -> anyhow::Result<()> {
        let tree_oid = self.resolve_object(revision, Some(ObjectType::Tree))?;

        if target.exists() {
            if !target.is_dir() {
                return Err(KitError::NotADirectory(target.to_path_buf()).into());
            }
            if target.read_dir()?.next().is_some() {
                return Err(KitError::TargetNotEmpty(target.to_path_buf()).into());
            }
        } else {
            std::fs::create_dir_all(target)
                .context(format!("Unable to create {}", target.display()))?;
        }
        let target = target.canonicalize()?;

        // depth-first with an explicit stack; nesting depth is data, not
        // call stack
        let mut pending: Vec<(ObjectId, PathBuf)> = vec![(tree_oid, target)];

        while let Some((oid, dir)) = pending.pop() {
            let tree = self
                .database()
                .parse_object_as_tree(&oid)?
                .with_context(|| format!("Object {oid} is not a tree"))?;

            for entry in tree.sorted_entries() {
                let destination = dir.join(&entry.name);

                match entry.mode {
                    EntryMode::Directory => {
                        std::fs::create_dir(&destination)?;
                        pending.push((entry.oid.clone(), destination));
                    }
                    EntryMode::Submodule => continue,
                    EntryMode::File(_) | EntryMode::Symlink => {
                        let blob = self
                            .database()
                            .parse_object_as_blob(&entry.oid)?
                            .with_context(|| format!("Object {} is not a blob", entry.oid))?;

                        std::fs::write(&destination, blob.content())?;

                        #[cfg(unix)]
                        if entry.mode == EntryMode::File(crate::objects::entry_mode::FileMode::Executable)
                        {
                            use std::os::unix::fs::PermissionsExt;
                            std::fs::set_permissions(
                                &destination,
                                std::fs::Permissions::from_mode(0o755),
                            )?;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
