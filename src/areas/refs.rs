//! References: HEAD, branches under `refs/heads/` and tags under
//! `refs/tags/`.
//!
//! A ref file holds either a 40-hex object id (direct) or `ref: <path>`
//! (symbolic). Resolution follows symbolic chains iteratively.

use crate::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Symbolic chains longer than this are treated as cycles.
const MAX_SYMREF_DEPTH: usize = 10;

#[derive(Debug, Clone)]
enum RefContent {
    SymRef(String),
    Oid(ObjectId),
}

impl RefContent {
    fn read(path: &Path) -> anyhow::Result<Option<RefContent>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        match regex::Regex::new(SYMREF_REGEX)?.captures(content) {
            Some(captures) => Ok(Some(RefContent::SymRef(captures[1].to_string()))),
            None => Ok(Some(RefContent::Oid(ObjectId::try_parse(
                content.to_string(),
            )?))),
        }
    }
}

/// Reads and writes the ref files under the metadata directory.
#[derive(Debug, new)]
pub struct Refs {
    /// Metadata directory root (the `.kit` directory).
    path: Box<Path>,
}

impl Refs {
    /// Resolve a ref name to the object id it ultimately points at,
    /// following symbolic indirection. A missing or empty ref yields
    /// `None`, which is how HEAD looks before the first commit.
    pub fn resolve(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        let mut current = name.to_string();

        for _ in 0..MAX_SYMREF_DEPTH {
            match RefContent::read(&self.path.join(&current))? {
                Some(RefContent::SymRef(target)) => current = target,
                Some(RefContent::Oid(oid)) => return Ok(Some(oid)),
                None => return Ok(None),
            }
        }

        anyhow::bail!("Symbolic ref chain starting at {name} is too deep")
    }

    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.resolve("HEAD")
    }

    /// The branch HEAD points at, or `None` when HEAD is detached.
    pub fn current_branch(&self) -> anyhow::Result<Option<String>> {
        match RefContent::read(&self.head_path())? {
            Some(RefContent::SymRef(target)) => Ok(target
                .strip_prefix("refs/heads/")
                .map(|branch| branch.to_string())),
            _ => Ok(None),
        }
    }

    /// Advance whatever HEAD designates to a new commit.
    ///
    /// On a branch this moves the branch tip. With HEAD detached, or
    /// pointing at a branch that does not exist yet, the id lands in the
    /// file HEAD names directly, so a detached HEAD stays detached.
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        match RefContent::read(&self.head_path())? {
            Some(RefContent::SymRef(target)) => self.update_ref(&target, oid),
            _ => self.update_ref("HEAD", oid),
        }
    }

    /// Point HEAD at a branch without touching the branch file.
    pub fn set_head_symbolic(&self, branch: &str) -> anyhow::Result<()> {
        self.write_ref_file(&self.head_path(), &format!("ref: refs/heads/{branch}\n"))
    }

    /// Detach HEAD at an exact commit.
    pub fn set_head_detached(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&self.head_path(), &format!("{oid}\n"))
    }

    pub fn update_ref(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&self.path.join(name), &format!("{oid}\n"))
    }

    pub fn create_tag_ref(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.update_ref(&format!("refs/tags/{name}"), oid)
    }

    pub fn create_branch(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.update_ref(&format!("refs/heads/{name}"), oid)
    }

    fn write_ref_file(&self, path: &Path, content: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(
            path.parent()
                .with_context(|| format!("Invalid ref path {}", path.display()))?,
        )?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Unable to open ref file {}", path.display()))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(content.as_bytes())?;

        Ok(())
    }

    /// Every ref under `refs/`, as `(name, resolved id)` pairs sorted by
    /// name. Refs that fail to resolve are skipped.
    pub fn list_refs(&self) -> anyhow::Result<Vec<(String, ObjectId)>> {
        let mut refs = Vec::new();

        for entry in WalkDir::new(self.refs_path())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if !entry.path().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(self.path.as_ref()) else {
                continue;
            };
            let name = relative.to_string_lossy().to_string();

            if let Some(oid) = self.resolve(&name)? {
                refs.push((name, oid));
            }
        }

        refs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(refs)
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join("HEAD").into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        ObjectId::try_parse("29ff16c9c14e2652b22f8b78bb08a5a07930c147".into()).unwrap()
    }

    fn refs_in(dir: &assert_fs::TempDir) -> Refs {
        Refs::new(dir.path().to_path_buf().into_boxed_path())
    }

    #[rstest]
    fn head_resolves_through_its_branch(oid: ObjectId) {
        let dir = assert_fs::TempDir::new().unwrap();
        let refs = refs_in(&dir);

        refs.set_head_symbolic("master").unwrap();
        refs.create_branch("master", &oid).unwrap();

        assert_eq!(refs.read_head().unwrap(), Some(oid));
        assert_eq!(refs.current_branch().unwrap(), Some("master".into()));
    }

    #[rstest]
    fn unborn_branch_resolves_to_none() {
        let dir = assert_fs::TempDir::new().unwrap();
        let refs = refs_in(&dir);

        refs.set_head_symbolic("master").unwrap();

        assert_eq!(refs.read_head().unwrap(), None);
        assert_eq!(refs.current_branch().unwrap(), Some("master".into()));
    }

    #[rstest]
    fn detached_head_updates_in_place(oid: ObjectId) {
        let dir = assert_fs::TempDir::new().unwrap();
        let refs = refs_in(&dir);

        refs.set_head_detached(&oid).unwrap();
        assert_eq!(refs.current_branch().unwrap(), None);

        let new_oid =
            ObjectId::try_parse("206941306e8a8af65b66eaaaea388a7ae24d49a0".into()).unwrap();
        refs.update_head(&new_oid).unwrap();

        assert_eq!(refs.read_head().unwrap(), Some(new_oid));
        assert_eq!(refs.current_branch().unwrap(), None);
    }

    #[rstest]
    fn listed_refs_are_sorted_by_name(oid: ObjectId) {
        let dir = assert_fs::TempDir::new().unwrap();
        let refs = refs_in(&dir);

        refs.create_tag_ref("v1", &oid).unwrap();
        refs.create_branch("master", &oid).unwrap();

        let names: Vec<_> = refs
            .list_refs()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["refs/heads/master", "refs/tags/v1"]);
    }
}
