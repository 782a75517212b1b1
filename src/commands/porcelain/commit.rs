use crate::areas::repository::Repository;
use crate::objects::commit::{Author, Commit};
use crate::objects::index_entry::IndexEntry;
use crate::objects::object::Object;
use crate::objects::tree::TreeBuilder;
use std::io::Write;

impl Repository {
    /// Snapshot the staged index as a commit and advance HEAD to it.
    ///
    /// The current HEAD commit, if any, becomes the single parent. Author
    /// identity comes from the environment.
    pub fn commit(&self, message: &str) -> anyhow::Result<()> {
        let mut index = self.index();
        index.rehydrate()?;

        let entries: Vec<IndexEntry> = index.entries().cloned().collect();
        drop(index);

        let tree_oid = TreeBuilder::new(self.database()).build(&entries)?;

        let parents: Vec<_> = self.refs().read_head()?.into_iter().collect();
        let author = Author::load_from_env()?;

        let commit = Commit::new(&tree_oid, &parents, &author, message.trim());
        let commit_oid = commit.object_id()?;
        let short_message = commit.short_message();

        self.database().store(commit)?;
        self.refs().update_head(&commit_oid)?;

        let location = self
            .refs()
            .current_branch()?
            .unwrap_or_else(|| "detached HEAD".to_string());
        let root_marker = if parents.is_empty() {
            "(root-commit) "
        } else {
            ""
        };

        writeln!(
            self.writer(),
            "[{location} {root_marker}{}] {short_message}",
            commit_oid.short()
        )?;

        Ok(())
    }
}
