use crate::areas::repository::Repository;
use crate::objects::object_id::ObjectId;
use crate::objects::object_type::ObjectType;
use crate::objects::tree::TreeEntry;
use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;

enum WorkItem {
    Subtree(ObjectId, PathBuf),
    Entry(TreeEntry, PathBuf),
}

impl Repository {
    /// List the entries of a tree (resolving commits and tags down to
    /// their tree first). With `recursive`, subtrees are expanded in place
    /// and only leaves print.
    pub fn ls_tree(&self, revision: &str, recursive: bool) -> anyhow::Result<()> {
        let tree_oid = self.resolve_object(revision, Some(ObjectType::Tree))?;

        // entries are pushed in reverse so they pop in canonical order
        let mut pending = vec![WorkItem::Subtree(tree_oid, PathBuf::new())];

        while let Some(item) = pending.pop() {
            match item {
                WorkItem::Subtree(oid, prefix) => {
                    let tree = self
                        .database()
                        .parse_object_as_tree(&oid)?
                        .with_context(|| format!("Object {oid} is not a tree"))?;

                    for entry in tree.sorted_entries().into_iter().rev() {
                        pending.push(WorkItem::Entry(entry.clone(), prefix.clone()));
                    }
                }
                WorkItem::Entry(entry, prefix) => {
                    let path = prefix.join(&entry.name);

                    if recursive && entry.mode.is_directory() {
                        pending.push(WorkItem::Subtree(entry.oid.clone(), path));
                    } else {
                        writeln!(
                            self.writer(),
                            "{} {} {}\t{}",
                            entry.mode.as_tree_str(),
                            entry.mode.object_type().as_str(),
                            entry.oid,
                            path.display()
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}
