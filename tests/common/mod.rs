#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;

pub const AUTHOR_NAME: &str = "Ada Lovelace";
pub const AUTHOR_EMAIL: &str = "ada@example.com";
// Fixed so object ids stay stable across runs.
pub const AUTHOR_DATE: &str = "Tue, 22 May 2018 22:17:03 +0200";

/// A `kit` invocation rooted in the given directory, with a pinned author
/// identity and timestamp.
pub fn kit(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kit").expect("kit binary is built");
    cmd.current_dir(dir.path())
        .env("KIT_AUTHOR_NAME", AUTHOR_NAME)
        .env("KIT_AUTHOR_EMAIL", AUTHOR_EMAIL)
        .env("KIT_AUTHOR_DATE", AUTHOR_DATE);
    cmd
}

pub fn init_repository(dir: &TempDir) {
    kit(dir).arg("init").assert().success();
}

pub fn write_file(dir: &TempDir, path: &str, content: &str) {
    dir.child(path).write_str(content).unwrap();
}

/// stdout of a successful invocation, as a string.
pub fn stdout_of(mut cmd: Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}
