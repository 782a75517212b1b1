//! Command implementations, split the way git splits them:
//!
//! - `plumbing`: direct object and ref inspection (cat-file, hash-object,
//!   ls-tree, ls-files, rev-parse, show-ref)
//! - `porcelain`: user-facing workflows (init, add, rm, commit, checkout,
//!   log, tag)

pub mod plumbing;
pub mod porcelain;
