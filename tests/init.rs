use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::predicate;

mod common;

#[test]
fn init_creates_the_metadata_layout() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    common::kit(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Initialized empty kit repository in",
        ));

    dir.child(".kit/objects").assert(predicate::path::is_dir());
    dir.child(".kit/refs/heads")
        .assert(predicate::path::is_dir());
    dir.child(".kit/refs/tags").assert(predicate::path::is_dir());
    dir.child(".kit/HEAD")
        .assert(predicate::str::contains("ref: refs/heads/master"));
    dir.child(".kit/config")
        .assert(predicate::str::contains("repositoryformatversion = 0"));

    Ok(())
}

#[test]
fn init_accepts_an_explicit_path() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    common::kit(&dir).arg("init").arg("nested/repo").assert().success();

    dir.child("nested/repo/.kit/HEAD")
        .assert(predicate::path::is_file());

    Ok(())
}

#[test]
fn init_refuses_an_existing_repository() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    common::init_repository(&dir);

    common::kit(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already a repository"));

    Ok(())
}

#[test]
fn commands_fail_outside_a_repository() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    let mut cmd = Command::cargo_bin("kit")?;

    cmd.current_dir(dir.path())
        .arg("ls-files")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a kit repository"));

    Ok(())
}
