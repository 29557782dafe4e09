//! End-to-end tests for the `sks` binary.
//!
//! A project manifest points at an upstream repository by filesystem
//! path, so install runs entirely offline: clone into the project store,
//! resolve the tag, write the lock, and link the skills tree.

use std::fs;
use std::path::Path;
use std::process::Command as GitCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn run_git(dir: &Path, args: &[&str]) {
    let output = GitCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Build an upstream repository holding `skills/alpha` and
/// `skills/author/beta`, tagged `v1.0.0`.
fn make_upstream() -> TempDir {
    let dir = TempDir::new().unwrap();
    run_git(dir.path(), &["init", "-b", "main"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["config", "user.name", "Test User"]);

    for skill in ["skills/alpha", "skills/author/beta"] {
        let skill_dir = dir.path().join(skill);
        fs::create_dir_all(&skill_dir).unwrap();
        fs::write(skill_dir.join("SKILL.md"), format!("# {skill}\n")).unwrap();
    }
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-m", "add skills"]);
    run_git(dir.path(), &["tag", "v1.0.0"]);

    dir
}

fn write_manifest(project: &Path, origin: &Path, with_beta: bool) {
    let origin = origin.display();
    let beta = if with_beta {
        format!(
            r#",
    {{"name": "author/beta", "type": "git", "origin": "{origin}", "subdir": "skills/author/beta", "version": "v1.0.0"}}"#
        )
    } else {
        String::new()
    };
    let manifest = format!(
        r#"{{
  "skills": [
    {{"name": "alpha", "type": "git", "origin": "{origin}", "subdir": "skills/alpha", "version": "v1.0.0"}}{beta}
  ]
}}
"#
    );
    fs::write(project.join("skills.json"), manifest).unwrap();
}

fn sks(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sks").unwrap();
    cmd.current_dir(project);
    cmd
}

#[test]
fn install_links_skills_and_writes_the_lock() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), upstream.path(), true);

    sks(project.path())
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("linked 2"));

    let skills = project.path().join("skills");
    assert!(skills.join("alpha").is_symlink());
    assert!(skills.join("author/beta").is_symlink());
    assert!(fs::read_to_string(skills.join("alpha/SKILL.md"))
        .unwrap()
        .contains("alpha"));

    let lock = fs::read_to_string(project.path().join("skills-lock.json")).unwrap();
    assert!(lock.contains("v1.0.0"));

    // A second install finds nothing to do.
    sks(project.path())
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("linked 0, removed 0"));
}

#[test]
fn install_prunes_skills_dropped_from_the_manifest() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), upstream.path(), true);

    sks(project.path()).arg("install").assert().success();

    write_manifest(project.path(), upstream.path(), false);
    sks(project.path()).arg("install").assert().success();

    let skills = project.path().join("skills");
    assert!(skills.join("alpha").is_symlink());
    assert!(!skills.join("author").exists());
}

#[test]
fn sync_relinks_offline_from_the_lock() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), upstream.path(), false);

    sks(project.path()).arg("install").assert().success();

    // Blow away the link tree; sync restores it from local state alone.
    fs::remove_dir_all(project.path().join("skills")).unwrap();
    sks(project.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("linked 1"));

    assert!(project.path().join("skills/alpha").is_symlink());
}

#[test]
fn sync_without_a_lock_points_at_install() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), upstream.path(), false);

    sks(project.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run sks install"));
}

#[test]
fn add_registers_installs_and_pins() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();

    // No manifest yet; add initializes the project.
    sks(project.path())
        .args(["add", &format!("{}@v1.0.0", upstream.path().display())])
        .args(["--path", "skills/alpha", "--name", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linked 1"));

    assert!(project.path().join("skills/alpha").is_symlink());

    let manifest = fs::read_to_string(project.path().join("skills.json")).unwrap();
    assert!(manifest.contains("\"alpha\""));
    assert!(manifest.contains("v1.0.0"));

    let lock = fs::read_to_string(project.path().join("skills-lock.json")).unwrap();
    assert!(lock.contains("v1.0.0"));
}

#[test]
fn add_without_a_ref_resolves_the_remote_head() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();

    sks(project.path())
        .args(["add", &upstream.path().display().to_string()])
        .args(["--path", "skills/alpha"])
        .assert()
        .success();

    // The name defaults to the subdirectory's last segment, and HEAD
    // carries the v1.0.0 tag.
    assert!(project.path().join("skills/alpha").is_symlink());
    let lock = fs::read_to_string(project.path().join("skills-lock.json")).unwrap();
    assert!(lock.contains("v1.0.0"));
}

#[test]
fn add_links_a_plain_directory_as_a_path_skill() {
    let vendor = TempDir::new().unwrap();
    fs::write(vendor.path().join("SKILL.md"), "# local\n").unwrap();
    let project = TempDir::new().unwrap();

    sks(project.path())
        .args(["add", &vendor.path().display().to_string()])
        .args(["--name", "local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linked 1"));

    assert!(project.path().join("skills/local").is_symlink());
    // Path skills never touch the lock.
    assert!(!project.path().join("skills-lock.json").exists());
}

#[test]
fn remove_prunes_lock_and_store_with_the_last_reference() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), upstream.path(), true);

    sks(project.path()).arg("install").assert().success();

    // The origin is still used by alpha, so only the link goes.
    sks(project.path())
        .args(["remove", "author/beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed author/beta"));

    let skills = project.path().join("skills");
    assert!(skills.join("alpha").is_symlink());
    assert!(!skills.join("author").exists());
    assert!(project.path().join("skills-lock.json").is_file());

    // Dropping the last reference clears the lock and the mirror.
    sks(project.path())
        .args(["remove", "alpha"])
        .assert()
        .success();

    assert!(!skills.join("alpha").exists());
    assert!(!project.path().join("skills-lock.json").exists());

    let store_dir = project.path().join(".skillsync/store");
    let mirrors = fs::read_dir(&store_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .count();
    assert_eq!(mirrors, 0);
}

#[test]
fn remove_unknown_skill_fails() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), upstream.path(), false);

    sks(project.path())
        .args(["remove", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn strict_install_fails_when_a_tag_moves() {
    let upstream = make_upstream();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), upstream.path(), false);

    sks(project.path()).arg("install").assert().success();

    fs::write(upstream.path().join("extra.txt"), "more").unwrap();
    run_git(upstream.path(), &["add", "extra.txt"]);
    run_git(upstream.path(), &["commit", "-m", "more"]);
    run_git(upstream.path(), &["tag", "-f", "v1.0.0"]);

    sks(project.path())
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("moved"));

    // update accepts the move and re-pins.
    sks(project.path())
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("linked"));
}
