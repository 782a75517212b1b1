use crate::areas::repository::Repository;
use crate::objects::object_type::ObjectType;
use anyhow::Context;
use colored::Colorize;
use std::collections::HashSet;
use std::io::Write;

impl Repository {
    /// Print the history reachable from `revision`, newest-first along
    /// each branch of ancestry.
    ///
    /// The walk is an explicit depth-first traversal over parent edges.
    /// A seen-set guarantees every commit prints exactly once, so merge
    /// ancestries shared through multiple paths do not repeat.
    pub fn log(&self, revision: &str) -> anyhow::Result<()> {
        let start = self.resolve_object(revision, Some(ObjectType::Commit))?;

        let mut seen = HashSet::new();
        let mut pending = vec![start];

        while let Some(oid) = pending.pop() {
            if !seen.insert(oid.clone()) {
                continue;
            }

            let commit = self
                .database()
                .parse_object_as_commit(&oid)?
                .with_context(|| format!("Commit object not found: {oid}"))?;

            writeln!(self.writer(), "{}", format!("commit {oid}").yellow())?;
            if let Some(author) = commit.author_line() {
                writeln!(self.writer(), "Author: {author}")?;
            }
            writeln!(self.writer())?;
            for line in String::from_utf8_lossy(commit.message()).lines() {
                writeln!(self.writer(), "    {line}")?;
            }
            writeln!(self.writer())?;

            for parent in commit.parent_oids()? {
                pending.push(parent);
            }
        }

        Ok(())
    }
}
