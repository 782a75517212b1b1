use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::errors::KitError;
use crate::objects::object_id::ObjectId;
use crate::objects::object_type::ObjectType;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::io::Write;
use std::path::Path;

/// Name of the metadata directory at the worktree root.
pub const KIT_DIR: &str = ".kit";

pub const DEFAULT_BRANCH: &str = "master";

/// The only on-disk format this implementation reads and writes.
const FORMAT_VERSION: u32 = 0;

const HEX_PREFIX_REGEX: &str = r"^[0-9a-fA-F]{4,40}$";

/// One opened repository: worktree root plus the object database, staging
/// index and refs living under its metadata directory.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn Write>>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    /// Create a fresh repository at `path`, building the metadata layout
    /// and pointing HEAD at the unborn default branch.
    pub fn init(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path)
            .context(format!("Unable to create {}", path.display()))?;
        let path = path.canonicalize()?;
        let kit_path = path.join(KIT_DIR);

        if kit_path.exists() {
            anyhow::bail!("{} is already a repository", path.display());
        }

        std::fs::create_dir_all(kit_path.join("objects"))?;
        std::fs::create_dir_all(kit_path.join("refs").join("heads"))?;
        std::fs::create_dir_all(kit_path.join("refs").join("tags"))?;

        std::fs::write(
            kit_path.join("HEAD"),
            format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
        )?;
        std::fs::write(
            kit_path.join("config"),
            format!(
                "[core]\n\trepositoryformatversion = {FORMAT_VERSION}\n\tfilemode = false\n\tbare = false\n"
            ),
        )?;
        std::fs::write(
            kit_path.join("description"),
            "Unnamed repository; edit this file to name the repository.\n",
        )?;

        Self::open_unchecked(path.as_path(), writer)
    }

    /// Open the repository rooted exactly at `path`.
    pub fn open(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let path = path.canonicalize()?;
        let kit_path = path.join(KIT_DIR);

        if !kit_path.is_dir() {
            return Err(KitError::RepositoryNotFound(path).into());
        }

        Self::check_format_version(&kit_path)?;
        Self::open_unchecked(path.as_path(), writer)
    }

    /// Walk upward from `start` until a directory containing the metadata
    /// directory is found and open it.
    pub fn discover(start: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let start = start.canonicalize()?;
        let mut current = start.as_path();

        loop {
            if current.join(KIT_DIR).is_dir() {
                return Self::open(current, writer);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return Err(KitError::RepositoryNotFound(start).into()),
            }
        }
    }

    fn open_unchecked(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let kit_path = path.join(KIT_DIR);

        let index = Index::new(kit_path.join("index").into_boxed_path());
        let database = Database::new(kit_path.join("objects").into_boxed_path());
        let workspace = Workspace::new(path.to_path_buf().into_boxed_path());
        let refs = Refs::new(kit_path.into_boxed_path());

        Ok(Repository {
            path: path.to_path_buf().into_boxed_path(),
            writer: RefCell::new(writer),
            index: RefCell::new(index),
            database,
            workspace,
            refs,
        })
    }

    /// The config file is not parsed beyond the one key that gates
    /// compatibility.
    fn check_format_version(kit_path: &Path) -> anyhow::Result<()> {
        let config_path = kit_path.join("config");
        if !config_path.exists() {
            return Ok(());
        }

        let config = std::fs::read_to_string(&config_path)
            .context(format!("Unable to read {}", config_path.display()))?;

        for line in config.lines() {
            let line = line.trim();
            if let Some(value) = line.strip_prefix("repositoryformatversion") {
                let version: u32 = value
                    .trim_start_matches([' ', '='])
                    .trim()
                    .parse()
                    .context("Malformed repositoryformatversion in config")?;

                if version != FORMAT_VERSION {
                    return Err(KitError::UnsupportedFormatVersion(version).into());
                }
            }
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kit_path(&self) -> std::path::PathBuf {
        self.path.join(KIT_DIR)
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&'_ self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Resolve a revision name to exactly one object id.
    ///
    /// Accepts `HEAD`, a full or abbreviated (4+) hex id, a tag name or a
    /// branch name, in that candidate order. Zero candidates is a missing
    /// object; more than one distinct candidate is ambiguous.
    pub fn resolve_revision(&self, name: &str) -> anyhow::Result<ObjectId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(KitError::ObjectNotFound(name.to_string()).into());
        }

        if name == "HEAD" {
            return self
                .refs
                .read_head()?
                .ok_or_else(|| KitError::ObjectNotFound("HEAD".to_string()).into());
        }

        let mut candidates = Vec::new();

        if regex::Regex::new(HEX_PREFIX_REGEX)?.is_match(name) {
            candidates.extend(
                self.database
                    .find_objects_by_prefix(&name.to_lowercase())?,
            );
        }

        if let Some(oid) = self.refs.resolve(&format!("refs/tags/{name}"))? {
            candidates.push(oid);
        }
        if let Some(oid) = self.refs.resolve(&format!("refs/heads/{name}"))? {
            candidates.push(oid);
        }

        candidates.sort();
        candidates.dedup();

        match candidates.len() {
            0 => Err(KitError::ObjectNotFound(name.to_string()).into()),
            1 => Ok(candidates.remove(0)),
            _ => anyhow::bail!(
                "Ambiguous revision {name}, candidates are:\n{}",
                candidates
                    .iter()
                    .map(|oid| format!(" - {oid}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    /// Resolve a revision and, when a target type is given, peel until an
    /// object of that type is reached. Tags peel to their target, commits
    /// peel to their tree when a tree is wanted.
    pub fn resolve_object(
        &self,
        name: &str,
        target: Option<ObjectType>,
    ) -> anyhow::Result<ObjectId> {
        let mut oid = self.resolve_revision(name)?;

        let Some(target) = target else {
            return Ok(oid);
        };

        loop {
            let object_type = self.database.get_object_type(&oid)?;

            if object_type == target {
                return Ok(oid);
            }

            match object_type {
                ObjectType::Tag => {
                    oid = self
                        .database
                        .parse_object_as_tag(&oid)?
                        .context("Tag object changed type mid-resolution")?
                        .target_oid()?;
                }
                ObjectType::Commit if target == ObjectType::Tree => {
                    oid = self
                        .database
                        .parse_object_as_commit(&oid)?
                        .context("Commit object changed type mid-resolution")?
                        .tree_oid()?;
                }
                _ => anyhow::bail!(
                    "Object {oid} is a {object_type}, cannot resolve it to a {target}"
                ),
            }
        }
    }
}
