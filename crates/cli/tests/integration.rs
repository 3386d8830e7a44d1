//! Integration tests against a live S3-compatible server
//!
//! These tests drive the built binary with one-shot commands.
//!
//! Run with:
//! ```bash
//! docker run -d --name minio -p 9000:9000 \
//!     -e MINIO_ROOT_USER=accesskey \
//!     -e MINIO_ROOT_PASSWORD=secretkey \
//!     minio/minio server /data
//!
//! TEST_S3_ENDPOINT=http://localhost:9000 \
//! TEST_S3_ACCESS_KEY=accesskey \
//! TEST_S3_SECRET_KEY=secretkey \
//!     cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

struct Server {
    endpoint: String,
    access_key: String,
    secret_key: String,
    config_dir: TempDir,
}

impl Server {
    /// Connection settings from the environment, `None` when unset
    fn from_env() -> Option<Self> {
        Some(Self {
            endpoint: std::env::var("TEST_S3_ENDPOINT").ok()?,
            access_key: std::env::var("TEST_S3_ACCESS_KEY").ok()?,
            secret_key: std::env::var("TEST_S3_SECRET_KEY").ok()?,
            config_dir: tempfile::tempdir().ok()?,
        })
    }

    fn command(&self, bucket: Option<&str>, line: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_s3client"));
        cmd.env("S3CLIENT_CONFIG_DIR", self.config_dir.path())
            .args(["--no-color", "--no-progress"])
            .args(["--url", &self.endpoint])
            .args(["--access-key", &self.access_key])
            .args(["--secret-key", &self.secret_key]);
        if let Some(bucket) = bucket {
            cmd.args(["--bucket-name", bucket]);
        }
        cmd.args(line);
        cmd
    }

    fn run(&self, bucket: Option<&str>, line: &[&str]) -> Output {
        self.command(bucket, line)
            .stdin(Stdio::null())
            .output()
            .expect("Failed to execute s3client")
    }

    /// Run with `answers` written to stdin, one per line
    fn run_answering(&self, bucket: Option<&str>, line: &[&str], answers: &[&str]) -> Output {
        let mut child = self
            .command(bucket, line)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn s3client");
        {
            let mut stdin = child.stdin.take().expect("stdin is piped");
            for answer in answers {
                writeln!(stdin, "{answer}").expect("Failed to write answer");
            }
        }
        child.wait_with_output().expect("Failed to wait for s3client")
    }
}

fn unique_bucket(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("s3client-{tag}-{}", nanos % 1_000_000_000)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed\nstdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}

/// Create a bucket and remove it with all content when dropped
struct TestBucket<'a> {
    server: &'a Server,
    name: String,
}

impl<'a> TestBucket<'a> {
    fn create(server: &'a Server, tag: &str) -> Self {
        let name = unique_bucket(tag);
        assert_success(&server.run(None, &["mkbucket", &name]));
        Self { server, name }
    }

    fn run(&self, line: &[&str]) -> Output {
        self.server.run(Some(&self.name), line)
    }
}

impl Drop for TestBucket<'_> {
    fn drop(&mut self) {
        let _ = self.server.run_answering(
            None,
            &["rmbucket", &self.name],
            &[&self.name, "DELETE"],
        );
    }
}

macro_rules! server_or_skip {
    () => {
        match Server::from_env() {
            Some(server) => server,
            None => {
                eprintln!("Skipping: TEST_S3_ENDPOINT, TEST_S3_ACCESS_KEY or TEST_S3_SECRET_KEY not set");
                return;
            }
        }
    };
}

#[test]
fn test_bucket_lifecycle() {
    let server = server_or_skip!();
    let name = unique_bucket("life");

    assert_success(&server.run(None, &["mkbucket", &name]));
    let output = server.run(None, &["mkbucket", &name]);
    assert_eq!(output.status.code(), Some(6), "{}", stderr(&output));

    let output = server.run(None, &["list", "bucket"]);
    assert_success(&output);
    assert!(stdout(&output).contains(&format!("  B  {name}")));

    let output = server.run_answering(None, &["rmbucket", &name], &["wrong"]);
    assert_eq!(output.status.code(), Some(130));
    assert!(stdout(&output).contains("Input mismatch. Bucket was NOT deleted"));

    let output = server.run_answering(None, &["rmbucket", &name], &[&name, "DELETE"]);
    assert_success(&output);
    assert!(stdout(&output).contains("has been deleted"));

    let output = server.run(None, &["enter", &name]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_objects_and_directories() {
    let server = server_or_skip!();
    let bucket = TestBucket::create(&server, "objects");

    assert_success(&bucket.run(&["touch", "docs/"]));
    assert_success(&bucket.run(&["touch", "docs/empty.txt"]));
    let output = bucket.run(&["touch", "docs/empty.txt"]);
    assert_eq!(output.status.code(), Some(6));

    let output = bucket.run(&["ls", "docs"]);
    assert_success(&output);
    let listing = stdout(&output);
    assert!(listing.starts_with("Found 1 object:"), "{listing}");
    assert!(listing.contains("empty.txt"));

    let output = bucket.run(&["cat", "docs"]);
    assert_eq!(output.status.code(), Some(6));
    let output = bucket.run(&["cat", "missing"]);
    assert_eq!(output.status.code(), Some(5));

    let output = bucket.run(&["rm", "docs"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("rm docs -r"));

    assert_success(&bucket.run(&["rm", "docs", "-r"]));
    let output = bucket.run(&["ls"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "No objects found.\n");
}

#[test]
fn test_upload_copy_move_download() {
    let server = server_or_skip!();
    let bucket = TestBucket::create(&server, "transfer");
    let local = tempfile::tempdir().expect("tempdir");

    let src = local.path().join("src");
    std::fs::create_dir_all(src.join("nested")).expect("create dirs");
    std::fs::write(src.join("a.txt"), "alpha").expect("write a");
    std::fs::write(src.join("nested/b.txt"), "beta").expect("write b");
    let src_arg = src.to_string_lossy().into_owned();

    let output = bucket.run(&["ul", &src_arg, "up"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Completed: 9 B (2 files)"));

    let output = bucket.run(&["cat", "up/nested/b.txt"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "beta\n");

    assert_success(&bucket.run(&["cp", "up", "copy"]));
    assert_success(&bucket.run(&["mv", "copy", "moved"]));
    let output = bucket.run(&["ls", "copy"]);
    assert_eq!(output.status.code(), Some(5));

    let output = bucket.run(&["cp", "up", "up/inner"]);
    assert_eq!(output.status.code(), Some(2));

    let output = bucket.run(&["find", "B.TXT"]);
    assert_success(&output);
    let found = stdout(&output);
    assert!(found.starts_with("Found 2 objects:"), "{found}");
    assert!(found.contains("moved/nested/b.txt"));

    let dest = local.path().join("dest");
    let dest_arg = dest.to_string_lossy().into_owned();
    assert_success(&bucket.run(&["dl", "moved", &dest_arg]));
    assert_eq!(
        std::fs::read_to_string(dest.join("nested/b.txt")).expect("downloaded"),
        "beta"
    );
}

#[test]
fn test_argument_errors_exit_with_usage_code() {
    let server = server_or_skip!();

    let output = server.run(None, &["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown command"));

    let output = server.run(None, &["cat", "x"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("No bucket entered yet"));
}
