//! Integration tests for version and pseudo-version resolution.
//!
//! These tests build real git repositories via the git CLI and verify
//! resolution against actual histories: exact tags, nearest-ancestor
//! search, branches, and commit prefixes.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use skillsync::git::Repo;
use skillsync::version::pseudo::{is_pseudo_version, pseudo_version_rev};
use skillsync::version::resolve::{resolve_for_ref, resolve_for_version, ResolveError};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn repo(&self) -> Repo {
        Repo::open(self.path()).expect("failed to open test repo")
    }

    /// Create a file and commit it, returning the new commit hash.
    fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        std::fs::write(self.dir.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
        self.head_rev()
    }

    fn tag(&self, name: &str) {
        run_git(self.path(), &["tag", name]);
    }

    fn branch(&self, name: &str) {
        run_git(self.path(), &["checkout", "-b", name]);
    }

    fn checkout(&self, name: &str) {
        run_git(self.path(), &["checkout", name]);
    }

    fn merge(&self, branch: &str) -> String {
        run_git(self.path(), &["merge", "--no-ff", branch, "-m", "merge"]);
        self.head_rev()
    }

    fn head_rev(&self) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
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

// =============================================================================
// Exact tags
// =============================================================================

#[test]
fn exact_tag_resolves_to_its_commit() {
    let repo = TestRepo::new();
    let rev = repo.head_rev();
    repo.tag("v1.0.0");

    let resolved = resolve_for_ref(&repo.repo(), "v1.0.0").unwrap();
    assert_eq!(resolved.version, "v1.0.0");
    assert_eq!(resolved.rev, rev);

    assert_eq!(resolve_for_version(&repo.repo(), "v1.0.0").unwrap(), rev);
}

#[test]
fn head_at_tagged_commit_reports_the_tag() {
    let repo = TestRepo::new();
    let rev = repo.head_rev();
    repo.tag("v2.3.4");

    let resolved = resolve_for_ref(&repo.repo(), "").unwrap();
    assert_eq!(resolved.version, "v2.3.4");
    assert_eq!(resolved.rev, rev);
}

#[test]
fn missing_tag_is_an_error() {
    let repo = TestRepo::new();
    let result = resolve_for_version(&repo.repo(), "v9.9.9");
    assert!(matches!(result, Err(ResolveError::TagNotFound { .. })));
}

// =============================================================================
// Nearest-ancestor search
// =============================================================================

#[test]
fn linear_history_bumps_patch_of_nearest_tag() {
    let repo = TestRepo::new();
    repo.tag("v1.0.0");
    repo.commit_file("a.txt", "a", "second");
    let head = repo.commit_file("b.txt", "b", "third");

    let resolved = resolve_for_ref(&repo.repo(), "").unwrap();
    assert_eq!(resolved.rev, head);
    assert!(is_pseudo_version(&resolved.version), "{}", resolved.version);
    assert!(
        resolved.version.starts_with("v1.0.1-0."),
        "{}",
        resolved.version
    );
    assert_eq!(pseudo_version_rev(&resolved.version), Some(&head[..12]));
}

#[test]
fn diamond_history_takes_max_tag_at_minimal_depth() {
    let repo = TestRepo::new();

    repo.branch("left");
    repo.commit_file("left.txt", "l", "left work");
    repo.tag("v1.0.0");

    repo.checkout("main");
    repo.branch("right");
    repo.commit_file("right.txt", "r", "right work");
    repo.tag("v1.1.0");

    repo.checkout("left");
    let merge = repo.merge("right");

    // Both tagged tips are parents of the merge; the greater wins.
    let resolved = resolve_for_ref(&repo.repo(), "").unwrap();
    assert_eq!(resolved.rev, merge);
    assert!(
        resolved.version.starts_with("v1.1.1-0."),
        "{}",
        resolved.version
    );
}

#[test]
fn nearer_tag_beats_greater_deeper_tag() {
    let repo = TestRepo::new();
    repo.tag("v5.0.0");
    repo.commit_file("a.txt", "a", "second");
    repo.tag("v1.0.0");
    repo.commit_file("b.txt", "b", "third");

    // v1.0.0 is one level up, v5.0.0 two; depth wins over magnitude.
    let resolved = resolve_for_ref(&repo.repo(), "").unwrap();
    assert!(
        resolved.version.starts_with("v1.0.1-0."),
        "{}",
        resolved.version
    );
}

#[test]
fn untagged_history_yields_v0_pseudo_version() {
    let repo = TestRepo::new();
    let head = repo.commit_file("a.txt", "a", "second");

    let resolved = resolve_for_ref(&repo.repo(), "").unwrap();
    assert!(
        resolved.version.starts_with("v0.0.0-"),
        "{}",
        resolved.version
    );
    assert_eq!(pseudo_version_rev(&resolved.version), Some(&head[..12]));
}

#[test]
fn prerelease_tag_extends_its_prerelease() {
    let repo = TestRepo::new();
    repo.tag("v1.2.3-rc.1");
    repo.commit_file("a.txt", "a", "second");

    let resolved = resolve_for_ref(&repo.repo(), "").unwrap();
    assert!(
        resolved.version.starts_with("v1.2.3-rc.1.0."),
        "{}",
        resolved.version
    );
}

// =============================================================================
// Free-form refs
// =============================================================================

#[test]
fn branch_name_resolves_to_its_tip() {
    let repo = TestRepo::new();
    repo.branch("feature");
    let tip = repo.commit_file("f.txt", "f", "feature work");
    repo.checkout("main");

    let resolved = resolve_for_ref(&repo.repo(), "feature").unwrap();
    assert_eq!(resolved.rev, tip);
    assert!(is_pseudo_version(&resolved.version));
}

#[test]
fn commit_prefix_resolves_to_the_commit() {
    let repo = TestRepo::new();
    let head = repo.commit_file("a.txt", "a", "second");

    let resolved = resolve_for_ref(&repo.repo(), &head[..12]).unwrap();
    assert_eq!(resolved.rev, head);
}

#[test]
fn unknown_ref_is_an_error() {
    let repo = TestRepo::new();
    let result = resolve_for_ref(&repo.repo(), "no-such-branch");
    assert!(matches!(result, Err(ResolveError::RefNotFound { .. })));
}

// =============================================================================
// Pseudo-version round trips
// =============================================================================

#[test]
fn pseudo_versions_are_deterministic() {
    let repo = TestRepo::new();
    repo.tag("v0.1.0");
    repo.commit_file("a.txt", "a", "second");

    let first = resolve_for_ref(&repo.repo(), "").unwrap();
    let second = resolve_for_ref(&repo.repo(), "").unwrap();
    assert_eq!(first, second);
}

#[test]
fn pseudo_version_round_trips_to_its_commit() {
    let repo = TestRepo::new();
    repo.tag("v0.1.0");
    let head = repo.commit_file("a.txt", "a", "second");

    let resolved = resolve_for_ref(&repo.repo(), "").unwrap();
    let rev = resolve_for_version(&repo.repo(), &resolved.version).unwrap();
    assert_eq!(rev, head);

    // Resolving the pseudo-version as a ref reports it verbatim.
    let reresolved = resolve_for_ref(&repo.repo(), &resolved.version).unwrap();
    assert_eq!(reresolved.version, resolved.version);
    assert_eq!(reresolved.rev, head);
}
