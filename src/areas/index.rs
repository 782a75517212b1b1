//! Staging index.
//!
//! Tracks the set of paths that will make up the next commit, together
//! with the blob hash and cached filesystem metadata of each. Persisted
//! as a binary file: 12-byte header, sorted entries, optional extension
//! payloads, trailing SHA-1 checksum over everything before it.
//!
//! Extension payloads written by other tools are consumed when reading
//! (they count towards the checksum) but are not carried over on write.

use crate::errors::KitError;
use crate::objects::checksum::Checksum;
use crate::objects::index_entry::{ENTRY_BLOCK, ENTRY_MIN_SIZE, IndexEntry};
use crate::objects::index_header::IndexHeader;
use crate::objects::{CHECKSUM_SIZE, HEADER_SIZE, SIGNATURE, VERSION};
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::Read;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Index {
    path: Box<Path>,
    /// Staged entries keyed by worktree-relative path, kept in sorted order.
    entries: BTreeMap<Box<Path>, IndexEntry>,
    header: IndexHeader,
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            header: IndexHeader::empty(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// True when the path is staged itself or is a directory prefix of a
    /// staged entry.
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
            || self
                .entries
                .keys()
                .any(|entry_path| entry_path.starts_with(path))
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.header = IndexHeader::empty();
        self.changed = false;
    }

    /// Load the index from disk, replacing any in-memory state.
    ///
    /// Holds a shared lock on the index file while reading and verifies the
    /// trailing checksum. A missing or empty file yields an empty index.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        if !self.path().exists() {
            self.clear();
            std::fs::File::create(self.path())?;
        }

        let mut index_file = std::fs::OpenOptions::new().read(true).open(self.path())?;
        let file_len = index_file.metadata()?.len() as usize;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        self.clear();

        if file_len == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock.deref_mut());
        let entries_count = Self::parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        // whatever sits between the last entry and the checksum is
        // extension data; it still has to feed the digest
        let extensions_len = file_len
            .checked_sub(reader.bytes_seen() + CHECKSUM_SIZE)
            .ok_or_else(|| KitError::IndexCorrupt("Index file is truncated".into()))?;
        if extensions_len > 0 {
            reader.read(extensions_len)?;
        }

        reader.verify()
    }

    fn parse_header(reader: &mut Checksum<impl Read>) -> anyhow::Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(header_bytes)?;

        if header.marker != SIGNATURE {
            return Err(KitError::IndexCorrupt(format!(
                "Invalid index signature {:?}",
                header.marker
            ))
            .into());
        }

        if header.version != VERSION {
            return Err(KitError::IndexCorrupt(format!(
                "Unsupported index version {}",
                header.version
            ))
            .into());
        }

        Ok(header.entries_count)
    }

    fn parse_entries(
        &mut self,
        entries_count: u32,
        reader: &mut Checksum<impl Read>,
    ) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            // entries are padded to 8-byte blocks and always end in NUL
            while entry_bytes[entry_bytes.len() - 1] != 0 {
                entry_bytes = [entry_bytes, reader.read(ENTRY_BLOCK)?.to_vec()].concat();
            }

            let entry = IndexEntry::deserialize(Bytes::from(entry_bytes))?;
            self.entries
                .insert(entry.name.clone().into_boxed_path(), entry);
        }

        self.header.entries_count = entries_count;

        Ok(())
    }

    /// Stage an entry, replacing any previous entry for the same path.
    pub fn add(&mut self, entry: IndexEntry) {
        self.entries
            .insert(entry.name.clone().into_boxed_path(), entry);

        self.header.entries_count = self.entries.len() as u32;
        self.changed = true;
    }

    /// Unstage a path. A directory path removes every entry beneath it.
    /// Returns the removed paths in index order.
    pub fn remove(&mut self, path: &Path) -> Vec<Box<Path>> {
        let removed: Vec<Box<Path>> = self
            .entries
            .keys()
            .filter(|entry_path| entry_path.as_ref() == path || entry_path.starts_with(path))
            .cloned()
            .collect();

        for entry_path in &removed {
            self.entries.remove(entry_path);
        }

        if !removed.is_empty() {
            self.header.entries_count = self.entries.len() as u32;
            self.changed = true;
        }

        removed
    }

    /// Persist the in-memory state, replacing the on-disk index atomically.
    /// A no-op when nothing changed since the last load or write.
    ///
    /// Serializes into a sibling temp file and renames it over the index
    /// while holding an exclusive lock, so concurrent readers either see
    /// the old complete index or the new one.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        if !self.has_changed() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(self.path())?;
        let _lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let temp_path = self.path.with_extension("lock");
        let temp_file = std::fs::File::create(&temp_path)
            .context(format!("Unable to create {}", temp_path.display()))?;

        let mut writer = Checksum::new(temp_file);

        self.header = IndexHeader {
            entries_count: self.entries.len() as u32,
            ..self.header.clone()
        };
        writer.write(&self.header.serialize()?)?;

        for entry in self.entries() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;

        std::fs::rename(&temp_path, self.path())
            .context(format!("Unable to replace {}", self.path.display()))?;
        self.changed = false;

        Ok(())
    }

    /// Staged entries in ascending path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::entry_mode::{EntryMode, FileMode};
    use crate::objects::index_entry::EntryMetadata;
    use crate::objects::object_id::ObjectId;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn entry(name: &str) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(name),
            ObjectId::try_parse("29ff16c9c14e2652b22f8b78bb08a5a07930c147".into()).unwrap(),
            EntryMetadata {
                mode: EntryMode::File(FileMode::Regular),
                size: 4,
                ..Default::default()
            },
        )
    }

    #[rstest]
    fn round_trips_through_disk() {
        let dir = assert_fs::TempDir::new().unwrap();
        let index_path = dir.path().join("index");

        let mut index = Index::new(index_path.clone().into_boxed_path());
        index.add(entry("b.txt"));
        index.add(entry("a/nested.txt"));
        index.write_updates().unwrap();

        let mut reloaded = Index::new(index_path.into_boxed_path());
        reloaded.rehydrate().unwrap();

        let names: Vec<_> = reloaded.entries().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec![PathBuf::from("a/nested.txt"), PathBuf::from("b.txt")]);
    }

    #[rstest]
    fn adding_same_path_twice_keeps_last_entry() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut index = Index::new(dir.path().join("index").into_boxed_path());

        let mut first = entry("file.txt");
        first.metadata.size = 1;
        let mut second = entry("file.txt");
        second.metadata.size = 2;

        index.add(first);
        index.add(second);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index
                .entry_by_path(Path::new("file.txt"))
                .unwrap()
                .metadata
                .size,
            2
        );
    }

    #[rstest]
    fn removing_a_directory_drops_everything_beneath_it() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut index = Index::new(dir.path().join("index").into_boxed_path());

        index.add(entry("dir/a.txt"));
        index.add(entry("dir/sub/b.txt"));
        index.add(entry("other.txt"));

        let removed = index.remove(Path::new("dir"));
        assert_eq!(
            removed,
            vec![
                PathBuf::from("dir/a.txt").into_boxed_path(),
                PathBuf::from("dir/sub/b.txt").into_boxed_path(),
            ]
        );
        assert_eq!(index.len(), 1);
        assert!(index.entry_by_path(Path::new("other.txt")).is_some());
    }

    #[rstest]
    fn removing_a_missing_path_is_reported() {
        let dir = assert_fs::TempDir::new().unwrap();
        let mut index = Index::new(dir.path().join("index").into_boxed_path());
        index.add(entry("present.txt"));

        assert!(index.remove(Path::new("absent.txt")).is_empty());
        assert_eq!(index.len(), 1);
    }

    #[rstest]
    fn untouched_index_is_not_written_back() {
        let dir = assert_fs::TempDir::new().unwrap();
        let index_path = dir.path().join("index");

        let mut index = Index::new(index_path.clone().into_boxed_path());
        index.write_updates().unwrap();
        assert!(!index_path.exists());

        index.add(entry("file.txt"));
        index.write_updates().unwrap();
        assert!(index_path.exists());
        assert!(!index.has_changed());
    }

    #[rstest]
    fn corrupted_index_fails_to_rehydrate() {
        let dir = assert_fs::TempDir::new().unwrap();
        let index_path = dir.path().join("index");

        let mut index = Index::new(index_path.clone().into_boxed_path());
        index.add(entry("file.txt"));
        index.write_updates().unwrap();

        let mut bytes = std::fs::read(&index_path).unwrap();
        let len = bytes.len();
        bytes[len / 2] ^= 0xFF;
        std::fs::write(&index_path, bytes).unwrap();

        let mut reloaded = Index::new(index_path.into_boxed_path());
        assert!(reloaded.rehydrate().is_err());
    }
}
