//! Binary index record codec.
//!
//! Each staged path persists as a 62-byte fixed section (timestamps,
//! device/inode, mode, ownership, size, content hash, flags) followed by
//! the NUL-terminated path, padded with NULs to an 8-byte boundary.

use crate::objects::entry_mode::{EntryMode, FileMode};
use crate::objects::object_id::ObjectId;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::cmp::min;
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::prelude::MetadataExt;
use std::path::PathBuf;

const MAX_PATH_SIZE: usize = 0xFFF;
pub const ENTRY_BLOCK: usize = 8;
/// Smallest possible on-disk entry (fixed section + one path byte + padding).
pub const ENTRY_MIN_SIZE: usize = 64;

const FLAG_ASSUME_VALID: u16 = 0x8000;
const FLAG_STAGE_MASK: u16 = 0x3000;

/// One staged path: worktree-relative name, content hash, cached metadata.
#[derive(Debug, Clone, Default, new)]
pub struct IndexEntry {
    pub name: PathBuf,
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for IndexEntry {}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Filesystem metadata cached alongside the content hash.
///
/// Timestamps keep seconds and nanoseconds separately to match filesystem
/// resolution.
#[derive(Debug, Clone, Default)]
pub struct EntryMetadata {
    pub ctime: i64,
    pub ctime_nsec: i64,
    pub mtime: i64,
    pub mtime_nsec: i64,
    pub dev: u64,
    pub ino: u64,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub assume_valid: bool,
    pub stage: bool,
}

impl IndexEntry {
    pub fn serialize(&self) -> anyhow::Result<Bytes> {
        let entry_name = self
            .name
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid entry name"))?;

        let mut flags = min(entry_name.len(), MAX_PATH_SIZE) as u16;
        if self.metadata.assume_valid {
            flags |= FLAG_ASSUME_VALID;
        }
        if self.metadata.stage {
            flags |= 0x1000;
        }

        let mut entry_bytes = Vec::new();
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.dev as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ino as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mode.as_u32())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size as u32)?;
        self.oid.write_h40_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(flags)?;
        entry_bytes.write_all(entry_name.as_bytes())?;

        // at least one NUL terminator, then pad to the block boundary
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }

    pub fn deserialize(bytes: Bytes) -> anyhow::Result<Self> {
        if bytes.len() < ENTRY_MIN_SIZE {
            return Err(anyhow::anyhow!("Invalid index entry size"));
        }

        let ctime = byteorder::NetworkEndian::read_u32(&bytes[0..4]) as i64;
        let ctime_nsec = byteorder::NetworkEndian::read_u32(&bytes[4..8]) as i64;
        let mtime = byteorder::NetworkEndian::read_u32(&bytes[8..12]) as i64;
        let mtime_nsec = byteorder::NetworkEndian::read_u32(&bytes[12..16]) as i64;
        let dev = byteorder::NetworkEndian::read_u32(&bytes[16..20]) as u64;
        let ino = byteorder::NetworkEndian::read_u32(&bytes[20..24]) as u64;
        let mode = EntryMode::from_index_u32(byteorder::NetworkEndian::read_u32(&bytes[24..28]))?;
        let uid = byteorder::NetworkEndian::read_u32(&bytes[28..32]);
        let gid = byteorder::NetworkEndian::read_u32(&bytes[32..36]);
        let size = byteorder::NetworkEndian::read_u32(&bytes[36..40]) as u64;
        let mut oid_bytes = std::io::Cursor::new(&bytes[40..60]);
        let oid = ObjectId::read_h40_from(&mut oid_bytes)?;
        let flags = byteorder::NetworkEndian::read_u16(&bytes[60..62]);

        let name_end = bytes[62..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| anyhow::anyhow!("Missing NUL terminator in entry name"))?;
        let name = PathBuf::from(
            std::str::from_utf8(&bytes[62..62 + name_end])
                .map_err(|_| anyhow::anyhow!("Invalid UTF-8 in entry name"))?,
        );

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                dev,
                ino,
                mode,
                uid,
                gid,
                size,
                assume_valid: flags & FLAG_ASSUME_VALID != 0,
                stage: flags & FLAG_STAGE_MASK != 0,
            },
        })
    }
}

impl TryFrom<Metadata> for EntryMetadata {
    type Error = anyhow::Error;

    fn try_from(metadata: Metadata) -> Result<Self, Self::Error> {
        // staged files always record the default regular-file mode
        Ok(Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode: EntryMode::File(FileMode::Regular),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            assume_valid: false,
            stage: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use sha1::Digest;

    #[fixture]
    fn oid() -> ObjectId {
        let mut hasher = sha1::Sha1::new();
        hasher.update("test data");
        ObjectId::try_parse(format!("{:x}", hasher.finalize())).unwrap()
    }

    #[fixture]
    fn metadata() -> EntryMetadata {
        EntryMetadata {
            ctime: 1_700_000_000,
            ctime_nsec: 123_456_789,
            mtime: 1_700_000_001,
            mtime_nsec: 42,
            dev: 66306,
            ino: 9441,
            mode: EntryMode::File(FileMode::Regular),
            uid: 1000,
            gid: 1000,
            size: 11,
            assume_valid: false,
            stage: false,
        }
    }

    #[rstest]
    fn entry_round_trips(oid: ObjectId, metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("src/lib.rs"), oid.clone(), metadata);
        let bytes = entry.serialize().unwrap();

        let parsed = IndexEntry::deserialize(bytes).unwrap();
        assert_eq!(parsed.name, PathBuf::from("src/lib.rs"));
        assert_eq!(parsed.oid, oid);
        assert_eq!(parsed.metadata.mtime, 1_700_000_001);
        assert_eq!(parsed.metadata.mode, EntryMode::File(FileMode::Regular));
        assert!(!parsed.metadata.assume_valid);
    }

    #[rstest]
    fn serialized_entries_are_block_padded(oid: ObjectId, metadata: EntryMetadata) {
        for name in ["a", "ab", "abcdefg", "a/very/long/nested/path.txt"] {
            let entry = IndexEntry::new(PathBuf::from(name), oid.clone(), metadata.clone());
            let bytes = entry.serialize().unwrap();

            assert_eq!(bytes.len() % ENTRY_BLOCK, 0);
            assert_eq!(bytes[bytes.len() - 1], 0);
        }
    }

    #[rstest]
    fn flags_carry_assume_valid_and_stage(oid: ObjectId, mut metadata: EntryMetadata) {
        metadata.assume_valid = true;
        metadata.stage = true;

        let entry = IndexEntry::new(PathBuf::from("flagged"), oid, metadata);
        let parsed = IndexEntry::deserialize(entry.serialize().unwrap()).unwrap();

        assert!(parsed.metadata.assume_valid);
        assert!(parsed.metadata.stage);
    }
}
