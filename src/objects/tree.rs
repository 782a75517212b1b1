//! Tree object: one directory snapshot.
//!
//! On disk: `tree <size>\0` followed by one record per entry,
//! `<mode> <name>\0<20-byte-sha1>`. Entries are serialized in a canonical
//! order (see [`TreeEntry::sort_key`]), so a tree's hash is a pure function
//! of its entry set regardless of insertion order.

use crate::areas::database::Database;
use crate::objects::entry_mode::EntryMode;
use crate::objects::index_entry::IndexEntry;
use crate::objects::object::Unpackable;
use crate::objects::object::{Object, Packable};
use crate::objects::object_id::ObjectId;
use crate::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};
use std::path::Path;

/// One (mode, name, id) triple pointing at a blob, a subtree or a
/// submodule commit.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub oid: ObjectId,
}

impl TreeEntry {
    /// Canonical sort key: a directory compares as though its name carried a
    /// trailing `/`, a non-directory by its bare name. The comparison is
    /// plain byte-lexicographic. This ordering determines the serialized
    /// byte stream and therefore the tree's hash.
    fn sort_key(&self) -> String {
        if self.mode.is_directory() {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Default, new)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Entries in canonical order.
    pub fn sorted_entries(&self) -> Vec<&TreeEntry> {
        let mut sorted: Vec<&TreeEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.sort_key());
        sorted
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        for entry in self.sorted_entries() {
            content_bytes.write_all(entry.mode.as_tree_str().as_bytes())?;
            content_bytes.push(b' ');
            content_bytes.write_all(entry.name.as_bytes())?;
            content_bytes.push(0);
            entry.oid.write_h40_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = Vec::new();

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in tree entry mode"));
            }
            let mode = EntryMode::from_tree_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || name_bytes.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in tree entry name"));
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            let oid = ObjectId::read_h40_from(&mut reader)
                .context("unexpected EOF in tree entry object id")?;

            entries.push(TreeEntry::new(mode, name, oid));
        }

        Ok(Tree::new(entries))
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.sorted_entries()
            .iter()
            .map(|entry| {
                format!(
                    "{} {} {}\t{}",
                    entry.mode.as_tree_str(),
                    entry.mode.object_type().as_str(),
                    entry.oid.as_ref(),
                    entry.name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

/// Folds the flat, path-sorted staging index into a hierarchy of tree
/// objects, writing every directory's tree through the database.
///
/// Identical directory contents anywhere in the hierarchy collapse to the
/// same stored object.
#[derive(Debug, new)]
pub struct TreeBuilder<'d> {
    database: &'d Database,
}

impl TreeBuilder<'_> {
    /// Build and store the tree hierarchy for `entries`, returning the root
    /// tree's id. Entries must be sorted by path, which is how the index
    /// hands them out.
    pub fn build(&self, entries: &[IndexEntry]) -> anyhow::Result<ObjectId> {
        let entries: Vec<&IndexEntry> = entries.iter().collect();
        self.build_prefix(Path::new(""), &entries)
    }

    fn build_prefix(&self, prefix: &Path, entries: &[&IndexEntry]) -> anyhow::Result<ObjectId> {
        let mut tree_entries = Vec::new();
        let mut position = 0;

        while position < entries.len() {
            let entry = entries[position];
            let relative = entry.name.strip_prefix(prefix).with_context(|| {
                format!(
                    "Index entry {} does not live under {}",
                    entry.name.display(),
                    prefix.display()
                )
            })?;

            let mut components = relative.components();
            let first = components
                .next()
                .context("Empty path in index entry")?
                .as_os_str()
                .to_str()
                .context("Non-UTF-8 path in index entry")?
                .to_owned();

            if components.next().is_none() {
                // direct child: a file leaf pointing at its stored blob
                tree_entries.push(TreeEntry::new(
                    entry.metadata.mode.clone(),
                    first,
                    entry.oid.clone(),
                ));
                position += 1;
            } else {
                // subdirectory: its entries are contiguous in sorted order
                let sub_prefix = prefix.join(&first);
                let start = position;
                while position < entries.len() && entries[position].name.starts_with(&sub_prefix) {
                    position += 1;
                }

                let sub_oid = self.build_prefix(&sub_prefix, &entries[start..position])?;
                tree_entries.push(TreeEntry::new(EntryMode::Directory, first, sub_oid));
            }
        }

        let tree = Tree::new(tree_entries);
        let oid = tree.object_id()?;
        self.database.store(tree)?;

        Ok(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::entry_mode::FileMode;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use sha1::Digest;

    fn oid_of(data: &str) -> ObjectId {
        let mut hasher = sha1::Sha1::new();
        hasher.update(data);
        ObjectId::try_parse(format!("{:x}", hasher.finalize())).unwrap()
    }

    #[fixture]
    fn entries() -> Vec<TreeEntry> {
        vec![
            TreeEntry::new(EntryMode::Directory, "dir".into(), oid_of("dir")),
            TreeEntry::new(EntryMode::File(FileMode::Regular), "a.txt".into(), oid_of("a")),
            TreeEntry::new(EntryMode::File(FileMode::Regular), "dir.txt".into(), oid_of("d")),
        ]
    }

    #[rstest]
    fn serialization_is_permutation_invariant(entries: Vec<TreeEntry>) {
        let tree = Tree::new(entries.clone());

        let mut reversed = entries;
        reversed.reverse();
        let permuted = Tree::new(reversed);

        assert_eq!(
            tree.serialize().unwrap(),
            permuted.serialize().unwrap()
        );
        assert_eq!(tree.object_id().unwrap(), permuted.object_id().unwrap());
    }

    #[rstest]
    fn directories_sort_with_trailing_slash(entries: Vec<TreeEntry>) {
        let tree = Tree::new(entries);
        let names: Vec<&str> = tree
            .sorted_entries()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();

        // "a.txt" < "dir.txt" < "dir/" under byte comparison
        assert_eq!(names, vec!["a.txt", "dir.txt", "dir"]);
    }

    #[rstest]
    fn parse_inverts_serialize(entries: Vec<TreeEntry>) {
        let tree = Tree::new(entries);
        let serialized = tree.serialize().unwrap();

        // skip the "tree <len>\0" header the way the database does
        let mut reader = std::io::Cursor::new(serialized);
        ObjectType::parse_header(&mut reader).unwrap();

        let parsed = Tree::deserialize(reader).unwrap();
        assert_eq!(parsed.entries(), tree.sorted_entries().into_iter().cloned().collect::<Vec<_>>());
    }
}
