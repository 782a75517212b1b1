//! Core repository areas:
//!
//! - `database`: content-addressed object store
//! - `index`: staging area persisted as a checksummed binary file
//! - `refs`: HEAD, branches and tags
//! - `repository`: coordination of the above around one worktree
//! - `workspace`: working tree file access

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
