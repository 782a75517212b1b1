pub mod blob;
pub mod checksum;
pub mod commit;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;
pub mod kvlm;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;

/// Magic bytes at the start of the persisted index file.
pub const SIGNATURE: &str = "DIRC";
/// Only index format version we read or write.
pub const VERSION: u32 = 2;
/// Size of the persisted index header (signature + version + entry count).
pub const HEADER_SIZE: usize = 12;
/// Size of the SHA-1 checksum trailing the index file.
pub const CHECKSUM_SIZE: usize = 20;
