// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use tokio::net::TcpListener;

use super::build::{BuildInvocation, BuildTool, ExternalBuildTool, parse_install_path};
use super::central::{CentralStore, seal_installed};
use super::changelog::{self, MessageSeed};
use super::message::{CommitMessageProvider, EditorPrompt, FixedMessage, MessageOutcome};
use super::metadata::{MetadataSource, YamlMetadata};
use super::notify::{Notification, Notifier, SmtpNotifier, release_body, render_message};
use super::{Phase, ReleasePipeline, ReleaseRequest};
use crate::error::{ProcessError, ReleaseError, ValidationError};
use crate::vcs::ReleaseNote;
use crate::vcs::baseline::BaselineBackend;

const PACKAGE_YAML: &str = "\
name: foo
version: 1.2.0
uuid: 5d9e3ba4-7c36-4f2e-a7ab-0a3c2e3b6a11
description: Foo tools
authors:
  - alice
";

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

// --- metadata ---

#[test]
fn test_metadata_parse_with_variants() {
    let content = format!("{PACKAGE_YAML}variants:\n  - [python-2.7]\n  - [python-3.9, qt-5]\n");
    let metadata = YamlMetadata::parse(Path::new("package.yaml"), &content).expect("parse");

    assert_eq!(metadata.name, "foo");
    assert_eq!(metadata.version.as_str(), "1.2.0");
    assert_eq!(metadata.authors, vec!["alice"]);
    assert_eq!(metadata.qualified_name(), "foo-1.2.0");

    let variants = metadata.resolved_variants();
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[1].index, 1);
    assert_eq!(variants[1].args, vec!["python-3.9", "qt-5"]);
    assert_eq!(variants[1].build_index(), Some(1));
    assert_eq!(variants[0].label(), "variant #0");
}

#[test]
fn test_metadata_without_variants_is_implicit() {
    let metadata = YamlMetadata::parse(Path::new("package.yaml"), PACKAGE_YAML).expect("parse");
    let variants = metadata.resolved_variants();
    assert_eq!(variants.len(), 1);
    assert!(variants[0].implicit);
    assert_eq!(variants[0].build_index(), None);
    assert_eq!(variants[0].label(), "project");
}

#[test]
fn test_metadata_numeric_version_and_single_author() {
    let content = "name: bar\nversion: 2\nuuid: u\ndescription: d\nauthors: carol\n";
    let metadata = YamlMetadata::parse(Path::new("package.yaml"), content).expect("parse");
    assert_eq!(metadata.version.as_str(), "2");
    assert_eq!(metadata.authors, vec!["carol"]);
}

#[test]
fn test_metadata_missing_fields() {
    let cases = [
        ("version", "name: foo\nuuid: u\ndescription: d\nauthors: [a]\n"),
        ("name", "version: 1.0\nuuid: u\ndescription: d\nauthors: [a]\n"),
        ("uuid", "name: foo\nversion: 1.0\ndescription: d\nauthors: [a]\n"),
        ("description", "name: foo\nversion: 1.0\nuuid: u\ndescription: ''\nauthors: [a]\n"),
        ("authors", "name: foo\nversion: 1.0\nuuid: u\ndescription: d\nauthors: []\n"),
    ];
    for (field, content) in cases {
        let err = YamlMetadata::parse(Path::new("package.yaml"), content).expect_err(field);
        assert!(
            matches!(
                err,
                ReleaseError::Validation(ValidationError::MissingField { field: f, .. }) if f == field
            ),
            "{field}: {err}"
        );
    }
}

#[test]
fn test_metadata_invalid_version() {
    let content = PACKAGE_YAML.replace("1.2.0", "1..2");
    let err = YamlMetadata::parse(Path::new("package.yaml"), &content).expect_err("invalid");
    assert!(matches!(
        err,
        ReleaseError::Validation(ValidationError::InvalidVersion { .. })
    ));
}

#[test]
fn test_metadata_file_not_found() {
    let temp = temp_dir();
    let err = YamlMetadata.load(temp.path()).expect_err("no file");
    assert!(matches!(
        err,
        ReleaseError::Validation(ValidationError::MetadataNotFound { .. })
    ));
}

// --- central store ---

#[test]
fn test_uuid_first_release_then_match() {
    let temp = temp_dir();
    let store = CentralStore::new(temp.path(), "foo");

    assert!(!store.check_uuid("abc").expect("no file yet"));
    let path = store.write_uuid("abc").expect("write");
    assert_eq!(path, temp.path().join("foo/package.uuid"));
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "abc\n");
    assert!(store.check_uuid("abc").expect("matches"));

    assert!(store.write_uuid("abc").is_err(), "uuid is never overwritten");
}

#[test]
fn test_uuid_mismatch() {
    let temp = temp_dir();
    let store = CentralStore::new(temp.path(), "foo");
    store.write_uuid("abc").expect("write");

    let err = store.check_uuid("xyz").expect_err("clash");
    let ReleaseError::Validation(ValidationError::UuidMismatch {
        expected, found, ..
    }) = &err
    else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(expected, "xyz");
    assert_eq!(found, "abc");
    assert!(err.to_string().contains("package name clash"));
}

#[test]
fn test_release_time_written_once() {
    let temp = temp_dir();
    let store = CentralStore::new(temp.path(), "foo");

    let path = store.write_release_time("1.2.0", 1_700_000_000).expect("write");
    assert_eq!(
        path,
        temp.path().join("foo/1.2.0/.metadata/release_time.txt")
    );
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "1700000000\n");
    assert!(store.write_release_time("1.2.0", 1).is_err());
}

#[cfg(unix)]
#[test]
fn test_seal_installed_purges_and_strips_write_bits() {
    use std::os::unix::fs::PermissionsExt as _;

    let temp = temp_dir();
    let root = temp.path().join("install");
    std::fs::create_dir_all(root.join("python/__pycache__")).expect("mkdir");
    std::fs::write(root.join("python/foo.py"), "x = 1\n").expect("write");
    std::fs::write(root.join("python/foo.pyc"), "bytecode").expect("write");
    std::fs::write(root.join("python/__pycache__/foo.cpython-39.pyc"), "bytecode").expect("write");
    std::fs::create_dir_all(root.join(".metadata")).expect("mkdir");
    std::fs::write(root.join(".metadata/info.txt"), "meta").expect("write");

    seal_installed(&root).expect("seal");

    assert!(!root.join("python/foo.pyc").exists());
    assert!(!root.join("python/__pycache__").exists());
    for file in ["python/foo.py", ".metadata/info.txt"] {
        let mode = std::fs::metadata(root.join(file)).expect("meta").permissions().mode();
        assert_eq!(mode & 0o222, 0, "{file} still writable");
    }
    let dir_mode = std::fs::metadata(root.join("python"))
        .expect("meta")
        .permissions()
        .mode();
    assert_ne!(dir_mode & 0o200, 0, "directories stay writable");
}

// --- changelog ---

#[test]
fn test_fold_changelog_into_message() {
    assert_eq!(
        changelog::fold(Some("Fix crash"), "abc fixed\n"),
        MessageSeed::Final("Fix crash\nabc fixed\n".to_string())
    );
    assert_eq!(
        changelog::fold(Some("Fix crash"), ""),
        MessageSeed::Final("Fix crash".to_string())
    );
    assert_eq!(
        changelog::fold(None, "abc fixed"),
        MessageSeed::Prompt("\n\nabc fixed".to_string())
    );
    assert_eq!(changelog::fold(None, ""), MessageSeed::Prompt(String::new()));
}

#[test]
fn test_changelog_side_file_only_when_non_empty() {
    let temp = temp_dir();
    assert_eq!(changelog::write_side_file(temp.path(), "").expect("skip"), None);

    let path = changelog::write_side_file(temp.path(), "commit one")
        .expect("write")
        .expect("path");
    assert_eq!(path, temp.path().join("changelog.txt"));
    assert_eq!(std::fs::read_to_string(path).expect("read"), "commit one");
}

// --- build tool ---

#[test]
fn test_build_invocation_args() {
    let invocation = BuildInvocation::builder()
        .with_source_dir("/scratch/1")
        .with_build_time(1_700_000_000)
        .with_variant(1)
        .with_jobs(8)
        .with_tag_locator("abc123".to_string())
        .with_changelog_file(PathBuf::from("/scratch/changelog.txt"))
        .build();
    insta::assert_snapshot!(invocation.to_args().join(" "), @"--time 1700000000 --variant 1 --jobs 8 --vcs-tag abc123 --changelog /scratch/changelog.txt");

    let implicit = BuildInvocation::builder()
        .with_source_dir("/scratch/0")
        .with_build_time(5)
        .build();
    insta::assert_snapshot!(implicit.to_args().join(" "), @"--time 5 --jobs 1");
}

#[test]
fn test_parse_install_path() {
    assert_eq!(
        parse_install_path("installing...\n/central/foo/1.2.0/0\n\n"),
        Some(PathBuf::from("/central/foo/1.2.0/0"))
    );
    assert_eq!(parse_install_path("  \n"), None);
}

#[tokio::test]
async fn test_missing_build_tool_is_reported_by_name() {
    let source = temp_dir();
    let invocation = BuildInvocation::builder()
        .with_source_dir(source.path())
        .with_build_time(5)
        .build();
    let tool = ExternalBuildTool::new("shelf-no-such-build-tool");

    let err = tool.build(&invocation).await.expect_err("tool is missing");
    let process_err = err
        .downcast_ref::<ProcessError>()
        .expect("should be a ProcessError");
    assert!(matches!(process_err, ProcessError::ExecutableNotFound { .. }));
    insta::assert_snapshot!(process_err.to_string(), @"executable not found: 'shelf-no-such-build-tool' (not in PATH)");
}

#[cfg(unix)]
fn write_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt as _;

    let path = dir.join("fake-build");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write tool");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

#[cfg(unix)]
#[tokio::test]
async fn test_external_build_tool_runs_in_source_dir() {
    let bin = temp_dir();
    let source = temp_dir();
    let tool = write_tool(
        bin.path(),
        r#"echo "$*" >> calls.log
case "$*" in
  *--install*) echo "installing"; echo "/central/foo/1.2.0/1" ;;
esac"#,
    );
    let invocation = BuildInvocation::builder()
        .with_source_dir(source.path())
        .with_build_time(5)
        .with_variant(1)
        .build();
    let tool = ExternalBuildTool::new(tool.display().to_string());

    tool.build(&invocation).await.expect("build");
    let installed = tool.install(&invocation).await.expect("install");

    assert_eq!(installed, PathBuf::from("/central/foo/1.2.0/1"));
    let calls = std::fs::read_to_string(source.path().join("calls.log")).expect("log");
    insta::assert_snapshot!(calls, @r"
    --time 5 --variant 1 --jobs 1
    --time 5 --variant 1 --jobs 1 --install
    ");
}

#[cfg(unix)]
#[tokio::test]
async fn test_external_build_tool_failure_carries_stderr() {
    let bin = temp_dir();
    let source = temp_dir();
    let tool = write_tool(bin.path(), "echo 'compiler exploded' >&2\nexit 2");
    let invocation = BuildInvocation::builder()
        .with_source_dir(source.path())
        .with_build_time(5)
        .build();

    let err = ExternalBuildTool::new(tool.display().to_string())
        .build(&invocation)
        .await
        .expect_err("build should fail");
    insta::assert_snapshot!(err.to_string(), @r"
    process 'build' exited with code 2:
    compiler exploded
    ");
}

// --- notification ---

#[test]
fn test_notification_subject() {
    let single = Notification::for_release("alice", "foo-1.2.0", 1, String::new());
    insta::assert_snapshot!(single.subject, @"[release] alice released foo-1.2.0");
    let multi = Notification::for_release("alice", "foo-1.2.0", 3, String::new());
    insta::assert_snapshot!(multi.subject, @"[release] alice released foo-1.2.0 (3 variants)");
}

#[test]
fn test_release_body_lists_details_then_notes() {
    let details = vec!["abc123 Fix crash".to_string(), "def456 Tidy".to_string()];
    let notes = vec![ReleaseNote {
        author: "Test User".to_string(),
        message: "Fixed the crash on load".to_string(),
    }];
    insta::assert_snapshot!(release_body("Second release\n", &details, &notes), @r"
    Second release

    abc123 Fix crash
    def456 Tidy

    Release notes:
    - Test User: Fixed the crash on load
    ");
    assert_eq!(release_body("Only message", &[], &[]), "Only message");
}

#[test]
fn test_render_message_dot_stuffs_body() {
    let notification = Notification {
        subject: "s".to_string(),
        body: "first\n.hidden line\nlast".to_string(),
    };
    let rendered = render_message("shelf", &["a@x.org".to_string()], &notification);
    assert!(rendered.starts_with("From: shelf\r\nTo: a@x.org\r\nSubject: s\r\n"));
    assert!(rendered.ends_with("first\r\n..hidden line\r\nlast\r\n.\r\n"));
}

#[tokio::test]
async fn test_smtp_notifier_dialogue() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut transcript = Vec::new();

        writer.write_all(b"220 test ESMTP\r\n").await.expect("greet");
        let mut in_data = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.expect("read") == 0 {
                break;
            }
            let line = line.trim_end().to_string();
            if in_data {
                if line == "." {
                    in_data = false;
                    writer.write_all(b"250 queued\r\n").await.expect("reply");
                }
                transcript.push(line);
                continue;
            }
            let reply: &[u8] = if line.starts_with("DATA") {
                in_data = true;
                b"354 go ahead\r\n"
            } else if line.starts_with("QUIT") {
                b"221 bye\r\n"
            } else if line.starts_with("HELO") {
                b"250-test\r\n250 ok\r\n"
            } else {
                b"250 ok\r\n"
            };
            let quit = line.starts_with("QUIT");
            if !line.starts_with("HELO") {
                transcript.push(line);
            }
            writer.write_all(reply).await.expect("reply");
            if quit {
                break;
            }
        }
        transcript
    });

    let notifier = SmtpNotifier::new(
        "shelf".to_string(),
        vec!["a@x.org".to_string(), "b@x.org".to_string()],
        "127.0.0.1".to_string(),
        port,
    );
    let notification = Notification::for_release("alice", "foo-1.2.0", 2, "body".to_string());
    notifier.notify(&notification).await.expect("send");

    let transcript = server.await.expect("server");
    insta::assert_debug_snapshot!(transcript, @r#"
    [
        "MAIL FROM:<shelf>",
        "RCPT TO:<a@x.org>",
        "RCPT TO:<b@x.org>",
        "DATA",
        "From: shelf",
        "To: a@x.org,b@x.org",
        "Subject: [release] alice released foo-1.2.0 (2 variants)",
        "Content-Type: text/plain; charset=utf-8",
        "",
        "body",
        ".",
        "QUIT",
    ]
    "#);
}

/// Serves one SMTP session with canned replies, one per client line
/// outside DATA. Returns the client lines it saw.
async fn scripted_smtp_server(listener: TcpListener, replies: Vec<&'static str>) -> Vec<String> {
    let (stream, _) = listener.accept().await.expect("accept");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut seen = Vec::new();

    writer.write_all(b"220 test\r\n").await.expect("greet");
    let mut replies = replies.into_iter();
    let mut in_data = false;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.expect("read") == 0 {
            break;
        }
        let line = line.trim_end().to_string();
        if in_data && line != "." {
            continue;
        }
        in_data = line == "DATA";
        seen.push(line);
        let Some(reply) = replies.next() else {
            break;
        };
        writer
            .write_all(format!("{reply}\r\n").as_bytes())
            .await
            .expect("reply");
    }
    seen
}

#[tokio::test]
async fn test_smtp_hangup_after_queued_message_still_succeeds() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    // HELO, MAIL, RCPT, DATA, "." answered; QUIT gets no reply.
    let server = tokio::spawn(scripted_smtp_server(
        listener,
        vec!["250 ok", "250 ok", "250 ok", "354 go", "250 queued"],
    ));

    let notifier = SmtpNotifier::new(
        "shelf".to_string(),
        vec!["a@x.org".to_string()],
        "127.0.0.1".to_string(),
        port,
    );
    let notification = Notification::for_release("alice", "foo-1.2.0", 1, "body".to_string());
    notifier.notify(&notification).await.expect("queued mail counts as sent");

    let seen = server.await.expect("server");
    assert_eq!(seen.last().map(String::as_str), Some("QUIT"));
}

#[tokio::test]
async fn test_smtp_rejected_recipient_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let server = tokio::spawn(scripted_smtp_server(
        listener,
        vec!["250 ok", "250 ok", "550 no such user"],
    ));

    let notifier = SmtpNotifier::new(
        "shelf".to_string(),
        vec!["nobody@x.org".to_string()],
        "127.0.0.1".to_string(),
        port,
    );
    let notification = Notification::for_release("alice", "foo-1.2.0", 1, String::new());
    let err = notifier.notify(&notification).await.expect_err("rejected");
    insta::assert_snapshot!(err.to_string(), @"SMTP server replied '550 no such user', expected 250");
    server.await.expect("server");
}

#[tokio::test]
async fn test_smtp_notifier_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let notifier = SmtpNotifier::new(
        "shelf".to_string(),
        vec!["a@x.org".to_string()],
        "127.0.0.1".to_string(),
        port,
    );
    let notification = Notification::for_release("alice", "foo-1.2.0", 1, String::new());
    assert!(notifier.notify(&notification).await.is_err());
}

// --- message providers ---

#[tokio::test]
async fn test_fixed_message_ignores_default() {
    let temp = temp_dir();
    let outcome = FixedMessage::new("Release it")
        .provide("\n\nchangelog", temp.path())
        .await
        .expect("provide");
    assert_eq!(outcome, MessageOutcome::Accepted("Release it".to_string()));
}

#[tokio::test]
async fn test_editor_prompt_returns_edited_text() {
    let temp = temp_dir();
    let editor = EditorPrompt::new(r#"sh -c 'printf "Fix shading\n" > "$1"' editor"#);
    let outcome = editor
        .provide("\n\nchangelog", temp.path())
        .await
        .expect("provide");
    assert_eq!(outcome, MessageOutcome::Accepted("Fix shading\n".to_string()));
}

#[tokio::test]
async fn test_editor_failure_is_an_error() {
    let temp = temp_dir();
    let err = EditorPrompt::new("false")
        .provide("default", temp.path())
        .await
        .expect_err("editor exits non-zero");
    insta::assert_snapshot!(err.to_string(), @"error getting commit message");
}

// --- pipeline ---

#[derive(Default)]
struct RecordingTool {
    central: PathBuf,
    calls: Arc<Mutex<Vec<String>>>,
}

impl BuildTool for RecordingTool {
    fn build<'a>(&'a self, invocation: &'a BuildInvocation) -> BoxFuture<'a, crate::error::Result<()>> {
        Box::pin(async move {
            assert!(invocation.source_dir().join("package.yaml").is_file());
            self.calls
                .lock()
                .expect("lock")
                .push(format!("build {}", invocation.to_args().join(" ")));
            Ok(())
        })
    }

    fn install<'a>(
        &'a self,
        invocation: &'a BuildInvocation,
    ) -> BoxFuture<'a, crate::error::Result<PathBuf>> {
        Box::pin(async move {
            let path = self.central.join("foo/1.2.0");
            std::fs::create_dir_all(&path)?;
            std::fs::write(path.join("foo.py"), "x = 1\n")?;
            self.calls
                .lock()
                .expect("lock")
                .push(format!("install {}", invocation.to_args().join(" ")));
            Ok(path)
        })
    }
}

#[tokio::test]
async fn test_baseline_pipeline_implicit_variant() {
    let package = temp_dir();
    let central = temp_dir();
    std::fs::write(package.path().join("package.yaml"), PACKAGE_YAML).expect("write");

    let calls = Arc::new(Mutex::new(Vec::new()));
    let tool = RecordingTool {
        central: central.path().to_path_buf(),
        calls: Arc::clone(&calls),
    };
    let mut pipeline = ReleasePipeline::builder()
        .with_backend(Box::new(BaselineBackend::probe(package.path()).expect("probe")))
        .with_build_tool(Box::new(tool))
        .with_packages_path(central.path())
        .with_user("alice")
        .build();
    assert_eq!(pipeline.phase(), Phase::Created);

    let request = ReleaseRequest::builder()
        .with_path(package.path())
        .with_message("First release")
        .with_build_time(1_700_000_000)
        .build();
    let summary = pipeline.run(&request).await.expect("release");

    assert_eq!(pipeline.phase(), Phase::Done);
    assert_eq!(summary.backend, "base");
    assert_eq!(summary.tag, "1.2.0");
    assert!(package.path().join("build/release/0/package.yaml").is_file());
    assert!(central.path().join("foo/package.uuid").is_file());
    assert!(central.path().join("foo/1.2.0/.metadata/release_time.txt").is_file());

    let calls = calls.lock().expect("lock").clone();
    insta::assert_debug_snapshot!(calls, @r#"
    [
        "build --time 1700000000 --jobs 1",
        "install --time 1700000000 --jobs 1",
    ]
    "#);
}

#[tokio::test]
async fn test_pipeline_requires_packages_path() {
    let package = temp_dir();
    std::fs::write(package.path().join("package.yaml"), PACKAGE_YAML).expect("write");

    let mut pipeline = ReleasePipeline::builder()
        .with_backend(Box::new(BaselineBackend::probe(package.path()).expect("probe")))
        .with_build_tool(Box::new(RecordingTool::default()))
        .build();
    let request = ReleaseRequest::builder()
        .with_path(package.path())
        .with_message("msg")
        .build();

    let err = pipeline.run(&request).await.expect_err("no central root");
    assert!(matches!(
        err,
        ReleaseError::Validation(ValidationError::MissingConfig { ref key }) if key == "release.packages_path"
    ));
    assert_eq!(pipeline.phase(), Phase::Failed);
}

#[tokio::test]
async fn test_pipeline_requires_editor_without_message() {
    let package = temp_dir();
    let central = temp_dir();
    std::fs::write(package.path().join("package.yaml"), PACKAGE_YAML).expect("write");

    let mut pipeline = ReleasePipeline::builder()
        .with_backend(Box::new(BaselineBackend::probe(package.path()).expect("probe")))
        .with_build_tool(Box::new(RecordingTool::default()))
        .with_packages_path(central.path())
        .build();
    let request = ReleaseRequest::builder().with_path(package.path()).build();

    let err = pipeline.run(&request).await.expect_err("no editor");
    insta::assert_snapshot!(err.to_string(), @"missing required config key 'release.editor'");
}

struct Cancelling;

impl CommitMessageProvider for Cancelling {
    fn provide<'a>(
        &'a self,
        _default_text: &'a str,
        _scratch_root: &'a Path,
    ) -> BoxFuture<'a, crate::error::Result<MessageOutcome>> {
        Box::pin(async { Ok(MessageOutcome::Cancelled) })
    }
}

#[tokio::test]
async fn test_cancelled_message_aborts_before_build() {
    let package = temp_dir();
    let central = temp_dir();
    std::fs::write(package.path().join("package.yaml"), PACKAGE_YAML).expect("write");

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = ReleasePipeline::builder()
        .with_backend(Box::new(BaselineBackend::probe(package.path()).expect("probe")))
        .with_build_tool(Box::new(RecordingTool {
            central: central.path().to_path_buf(),
            calls: Arc::clone(&calls),
        }))
        .with_message_provider(Box::new(Cancelling))
        .with_packages_path(central.path())
        .build();
    let request = ReleaseRequest::builder().with_path(package.path()).build();

    let err = pipeline.run(&request).await.expect_err("cancelled");
    assert!(matches!(err, ReleaseError::Cancelled));
    assert!(calls.lock().expect("lock").is_empty());
    assert!(!central.path().join("foo").exists());
}
