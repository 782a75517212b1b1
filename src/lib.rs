//! A small content-addressed version control engine.
//!
//! Objects (blobs, trees, commits, tags) live in a zlib-compressed loose
//! store keyed by SHA-1; the staging index is a checksummed binary file;
//! refs are plain files under the `.kit` metadata directory.

pub mod areas;
pub mod commands;
pub mod errors;
pub mod objects;
