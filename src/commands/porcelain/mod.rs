//! Porcelain commands, the user-facing workflows.
//!
//! - `init`: create the repository layout
//! - `add` / `rm`: stage and unstage files
//! - `commit`: snapshot the index
//! - `checkout`: materialize a commit into an empty directory
//! - `log`: walk history from a starting commit
//! - `tag`: create lightweight or annotated tags

pub mod add;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod rm;
pub mod tag;
