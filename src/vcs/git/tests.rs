// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::process::Command;

use regex::Regex;
use tempfile::TempDir;

use super::{GitBackend, RELEASE_NOTE_PATTERN, extract_release_note, parse_remote_distance};
use crate::config::types::GitConfig;
use crate::error::{RemoteDistance, ValidationError, VcsError};
use crate::vcs::VcsBackend;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initializes a repository on `main` with one commit.
fn init_repo(path: &Path) {
    git(path, &["init", "-q", "-b", "main"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    std::fs::write(path.join("README"), "hello\n").expect("write");
    git(path, &["add", "."]);
    git(path, &["commit", "-q", "-m", "Initial commit"]);
}

fn commit_file(path: &Path, name: &str, message: &str) {
    std::fs::write(path.join(name), message).expect("write");
    git(path, &["add", name]);
    git(path, &["commit", "-q", "-m", message]);
}

fn no_upstream_settings() -> GitConfig {
    GitConfig {
        allow_no_upstream: true,
        ..GitConfig::default()
    }
}

#[test]
fn test_probe_rejects_plain_directory() {
    let temp = temp_dir();
    let err = GitBackend::probe(temp.path(), GitConfig::default()).expect_err("not a repo");
    assert!(err.is_unsupported(), "{err}");
}

#[test]
fn test_probe_rejects_invalid_branch_pattern() {
    let temp = temp_dir();
    init_repo(temp.path());
    let settings = GitConfig {
        releasable_branches: vec!["(unclosed".to_string()],
        ..GitConfig::default()
    };
    let err = GitBackend::probe(temp.path(), settings).expect_err("bad pattern");
    assert!(matches!(err, VcsError::InvalidPattern { .. }), "{err}");
}

#[test]
fn test_local_branch_and_head() {
    let temp = temp_dir();
    init_repo(temp.path());
    let backend = GitBackend::probe(temp.path(), GitConfig::default()).expect("probe");

    assert_eq!(backend.local_branch().expect("branch"), "main");
    assert_eq!(
        backend.head_commit().expect("head"),
        git(temp.path(), &["rev-parse", "HEAD"])
    );
}

#[test]
fn test_uncommitted_change_is_rejected() {
    let temp = temp_dir();
    init_repo(temp.path());
    std::fs::write(temp.path().join("README"), "changed\n").expect("write");

    let backend = GitBackend::probe(temp.path(), no_upstream_settings()).expect("probe");
    let err = backend.validate_clean().expect_err("dirty tree");
    assert!(
        matches!(
            err,
            VcsError::Validation(ValidationError::UncommittedChanges { .. })
        ),
        "{err}"
    );
}

#[test]
fn test_branch_allow_list() {
    let temp = temp_dir();
    init_repo(temp.path());

    let settings = GitConfig {
        allow_no_upstream: true,
        releasable_branches: vec!["^release/".to_string()],
        ..GitConfig::default()
    };
    let backend = GitBackend::probe(temp.path(), settings.clone()).expect("probe");
    let err = backend.validate_clean().expect_err("main is not releasable");
    insta::assert_snapshot!(err.to_string(), @"could not release: current branch is main, must match one of: ^release/");

    git(temp.path(), &["checkout", "-q", "-b", "release/1.x"]);
    let backend = GitBackend::probe(temp.path(), settings).expect("probe");
    backend.validate_clean().expect("release branch is releasable");
}

#[test]
fn test_ahead_of_upstream_is_rejected() {
    let temp = temp_dir();
    let origin = temp.path().join("origin.git");
    let work = temp.path().join("work");
    std::fs::create_dir_all(&work).expect("mkdir");
    git(temp.path(), &["init", "-q", "--bare", "-b", "main", "origin.git"]);
    init_repo(&work);
    git(&work, &["remote", "add", "origin", &origin.display().to_string()]);
    git(&work, &["push", "-q", "-u", "origin", "main"]);
    commit_file(&work, "local.txt", "unpushed work");

    let backend = GitBackend::probe(&work, GitConfig::default()).expect("probe");
    let err = backend.validate_clean().expect_err("ahead of origin");
    assert!(
        matches!(
            err,
            VcsError::Validation(ValidationError::Diverged {
                distance: RemoteDistance::Ahead(1),
                ..
            })
        ),
        "{err}"
    );
}

#[test]
fn test_tags_and_revision_for_tag() {
    let temp = temp_dir();
    init_repo(temp.path());
    git(temp.path(), &["tag", "-a", "1.0.0", "-m", "first"]);
    let tagged = git(temp.path(), &["rev-parse", "HEAD"]);
    commit_file(temp.path(), "feature.txt", "Add feature");

    let backend = GitBackend::probe(temp.path(), no_upstream_settings()).expect("probe");
    assert_eq!(backend.list_tags().expect("tags"), vec!["1.0.0".to_string()]);

    let handle = backend
        .revision_for_tag("1.0.0")
        .expect("rev-list")
        .expect("tag resolves");
    assert_eq!(handle.id, tagged);

    let changelog = backend.changelog(Some(&handle)).expect("changelog");
    assert!(changelog.contains("Add feature"), "{changelog}");
    assert!(!changelog.contains("Initial commit"), "{changelog}");

    let full = backend.changelog(None).expect("full changelog");
    assert!(full.contains("Initial commit"), "{full}");
}

#[test]
fn test_changelog_excludes_merges() {
    let temp = temp_dir();
    init_repo(temp.path());
    git(temp.path(), &["checkout", "-q", "-b", "topic"]);
    commit_file(temp.path(), "topic.txt", "Topic work");
    git(temp.path(), &["checkout", "-q", "main"]);
    commit_file(temp.path(), "main.txt", "Main work");
    git(
        temp.path(),
        &["merge", "-q", "--no-ff", "-m", "Merge branch topic", "topic"],
    );

    let backend = GitBackend::probe(temp.path(), no_upstream_settings()).expect("probe");
    let changelog = backend.changelog(None).expect("changelog");
    assert!(changelog.contains("Topic work"));
    assert!(!changelog.contains("Merge branch topic"), "{changelog}");
}

#[test]
fn test_export_source_drops_hidden_entries() {
    let temp = temp_dir();
    let repo = temp.path().join("repo");
    std::fs::create_dir_all(repo.join("pkg/.config")).expect("mkdir");
    init_repo(&repo);
    std::fs::write(repo.join("pkg/package.yaml"), "name: foo\n").expect("write");
    std::fs::write(repo.join("pkg/.hidden"), "secret\n").expect("write");
    std::fs::write(repo.join("pkg/.config/settings"), "x\n").expect("write");
    std::fs::create_dir_all(repo.join("pkg/src")).expect("mkdir");
    std::fs::write(repo.join("pkg/src/lib.py"), "pass\n").expect("write");
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-q", "-m", "Add package"]);
    std::fs::write(repo.join("pkg/uncommitted.txt"), "not in HEAD\n").expect("write");

    let backend = GitBackend::probe(&repo.join("pkg"), no_upstream_settings()).expect("probe");
    let dest = temp.path().join("export");
    backend.export_source(&dest).expect("export");

    assert!(dest.join("package.yaml").is_file());
    assert!(dest.join("src/lib.py").is_file());
    assert!(!dest.join(".hidden").exists());
    assert!(!dest.join(".config").exists());
    assert!(!dest.join("uncommitted.txt").exists());
    assert!(!dest.join("README").exists(), "export is scoped to the package");
}

#[test]
fn test_current_revision_records_remote_urls() {
    let temp = temp_dir();
    let origin = temp.path().join("origin.git");
    let work = temp.path().join("work");
    std::fs::create_dir_all(&work).expect("mkdir");
    git(temp.path(), &["init", "-q", "--bare", "-b", "main", "origin.git"]);
    init_repo(&work);
    let url = origin.display().to_string();
    git(&work, &["remote", "add", "origin", &url]);
    git(&work, &["push", "-q", "-u", "origin", "main"]);

    let backend = GitBackend::probe(&work, GitConfig::default()).expect("probe");
    let revision = backend.current_revision().expect("revision");

    assert_eq!(revision.id, git(&work, &["rev-parse", "HEAD"]));
    assert_eq!(revision.details["branch"], "main");
    assert_eq!(revision.details["tracking_branch"], "origin/main");
    assert_eq!(revision.details["fetch_url"], url);
    assert_eq!(revision.details["push_url"], url);
}

#[test]
fn test_commit_details_and_release_notes() {
    let temp = temp_dir();
    init_repo(temp.path());
    let previous = git(temp.path(), &["rev-parse", "HEAD"]);
    commit_file(temp.path(), "a.txt", "Fix crash <release>Fixed the crash on load</release>");
    commit_file(temp.path(), "b.txt", "Refactor internals");

    let backend = GitBackend::probe(temp.path(), no_upstream_settings()).expect("probe");
    let handle = crate::vcs::RevisionHandle::new(previous);

    let details = backend.commit_details(Some(&handle)).expect("details");
    assert_eq!(details.len(), 2);
    assert!(details[0].contains("Test User: Fix crash"), "{}", details[0]);
    assert!(details[0].contains("a.txt"), "{}", details[0]);

    let notes = backend.release_notes(Some(&handle)).expect("notes");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].author, "Test User");
    assert_eq!(notes[0].message, "Fixed the crash on load");

    assert!(backend.commit_details(None).expect("no range").is_empty());
}

#[test]
fn test_parse_remote_distance() {
    assert_eq!(parse_remote_distance("## main...origin/main"), Some(None));
    assert_eq!(parse_remote_distance("## main"), Some(None));
    assert_eq!(
        parse_remote_distance("## main...origin/main [behind 2]"),
        Some(Some(RemoteDistance::Behind(2)))
    );
    assert_eq!(
        parse_remote_distance("## main...origin/main [ahead 3, behind 1]"),
        Some(Some(RemoteDistance::Ahead(3)))
    );
    assert_eq!(parse_remote_distance("## main...origin/main [gone]"), None);
}

#[test]
fn test_extract_release_note() {
    let marker = Regex::new(RELEASE_NOTE_PATTERN).expect("pattern");
    let note = extract_release_note(
        &marker,
        "Jane Doe: Tweak <release>line one\nline two</release> and <release>more</release>",
    )
    .expect("note");
    assert_eq!(note.author, "Jane Doe");
    assert_eq!(note.message, "line one\nline two\nmore");

    assert!(extract_release_note(&marker, "Jane Doe: nothing to see").is_none());
}
