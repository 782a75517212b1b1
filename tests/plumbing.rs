use assert_fs::TempDir;
use predicates::prelude::predicate;

mod common;

// git's well-known id for a blob holding "hello world\n"
const HELLO_BLOB_OID: &str = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";

#[test]
fn hash_object_computes_the_canonical_blob_id() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    common::init_repository(&dir);
    common::write_file(&dir, "hello.txt", "hello world\n");

    common::kit(&dir)
        .args(["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO_BLOB_OID}\n"));

    // without --write nothing lands in the object store
    common::kit(&dir)
        .args(["cat-file", HELLO_BLOB_OID])
        .assert()
        .failure()
        .stderr(predicate::str::contains("object not found"));

    Ok(())
}

#[test]
fn hash_object_write_then_cat_file_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    common::init_repository(&dir);
    common::write_file(&dir, "hello.txt", "hello world\n");

    common::kit(&dir)
        .args(["hash-object", "--write", "hello.txt"])
        .assert()
        .success();

    common::kit(&dir)
        .args(["cat-file", HELLO_BLOB_OID])
        .assert()
        .success()
        .stdout("hello world\n");

    Ok(())
}

#[test]
fn objects_resolve_from_abbreviated_ids() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    common::init_repository(&dir);
    common::write_file(&dir, "hello.txt", "hello world\n");

    common::kit(&dir)
        .args(["hash-object", "--write", "hello.txt"])
        .assert()
        .success();

    common::kit(&dir)
        .args(["rev-parse", &HELLO_BLOB_OID[..7]])
        .assert()
        .success()
        .stdout(format!("{HELLO_BLOB_OID}\n"));

    common::kit(&dir)
        .args(["cat-file", &HELLO_BLOB_OID[..7]])
        .assert()
        .success()
        .stdout("hello world\n");

    Ok(())
}

#[test]
fn rev_parse_peels_a_commit_to_its_tree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    common::init_repository(&dir);
    common::write_file(&dir, "a.txt", "a\n");
    common::kit(&dir).args(["add", "a.txt"]).assert().success();
    common::kit(&dir)
        .args(["commit", "--message", "first"])
        .assert()
        .success();

    let tree_oid = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.args(["rev-parse", "--type", "tree", "HEAD"]);
        cmd
    });

    let body = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.args(["cat-file", "HEAD"]);
        cmd
    });
    assert!(body.contains(&format!("tree {}", tree_oid.trim())));

    Ok(())
}

#[test]
fn show_ref_lists_branches_and_tags() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    common::init_repository(&dir);
    common::write_file(&dir, "a.txt", "a\n");
    common::kit(&dir).args(["add", "a.txt"]).assert().success();
    common::kit(&dir)
        .args(["commit", "--message", "first"])
        .assert()
        .success();
    common::kit(&dir).args(["tag", "v1.0"]).assert().success();

    let head_oid = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.args(["rev-parse", "HEAD"]);
        cmd
    });

    let refs = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.arg("show-ref");
        cmd
    });
    assert_eq!(
        refs,
        format!(
            "{oid} refs/heads/master\n{oid} refs/tags/v1.0\n",
            oid = head_oid.trim()
        )
    );

    Ok(())
}

#[test]
fn annotated_tags_peel_to_their_target() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    common::init_repository(&dir);
    common::write_file(&dir, "a.txt", "a\n");
    common::kit(&dir).args(["add", "a.txt"]).assert().success();
    common::kit(&dir)
        .args(["commit", "--message", "first"])
        .assert()
        .success();

    common::kit(&dir)
        .args(["tag", "--annotate", "--message", "release one", "v1.0"])
        .assert()
        .success();

    let head_oid = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.args(["rev-parse", "HEAD"]);
        cmd
    });
    let tag_oid = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.args(["rev-parse", "v1.0"]);
        cmd
    });
    let peeled = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.args(["rev-parse", "--type", "commit", "v1.0"]);
        cmd
    });

    // the tag ref names the tag object, which peels to the commit
    assert_ne!(tag_oid, head_oid);
    assert_eq!(peeled, head_oid);

    let listing = common::stdout_of({
        let mut cmd = common::kit(&dir);
        cmd.arg("tag");
        cmd
    });
    assert_eq!(listing, "v1.0\n");

    Ok(())
}

#[test]
fn cat_file_prints_a_tree_listing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    common::init_repository(&dir);
    common::write_file(&dir, "a.txt", "a\n");
    common::kit(&dir).args(["add", "a.txt"]).assert().success();
    common::kit(&dir)
        .args(["commit", "--message", "first"])
        .assert()
        .success();

    common::kit(&dir)
        .args(["cat-file", "--type", "tree", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"^100644 blob [0-9a-f]{40}\ta\.txt\n$",
        )?);

    Ok(())
}
