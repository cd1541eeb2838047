use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{Value, json};
use tempfile::TempDir;

struct Run {
	success: bool,
	stdout: String,
	stderr: String,
}

impl Run {
	fn json(&self) -> Value {
		serde_json::from_str(&self.stdout).unwrap_or_else(|_| json!({ "raw": self.stdout }))
	}
}

/// URL of a local port nothing listens on.
fn dead_url() -> String {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
	let addr = listener.local_addr().expect("local addr");
	drop(listener);
	format!("http://{addr}")
}

fn session_file(workdir: &Path) -> PathBuf {
	workdir.join("state").join("session.json")
}

fn write_marker(workdir: &Path, content: &str) {
	let path = session_file(workdir);
	std::fs::create_dir_all(path.parent().expect("marker dir")).expect("marker dir should be created");
	std::fs::write(path, content).expect("marker should be written");
}

fn run_zombload(workdir: &Path, url: &str, args: &[&str]) -> Run {
	let output = Command::new(env!("CARGO_BIN_EXE_zombload"))
		.current_dir(workdir)
		.env_remove("ZOMBLOAD_URL")
		.env_remove("ZOMBLOAD_SESSION_FILE")
		.env_remove("ZOMBLOAD_PASSWORD")
		.env_remove("RUST_LOG")
		.env("NO_COLOR", "1")
		.env("XDG_CONFIG_HOME", workdir.join("config"))
		.arg("--url")
		.arg(url)
		.arg("--session-file")
		.arg(session_file(workdir))
		.args(args)
		.output()
		.expect("failed to execute zombload");

	Run {
		success: output.status.success(),
		stdout: String::from_utf8_lossy(&output.stdout).to_string(),
		stderr: String::from_utf8_lossy(&output.stderr).to_string(),
	}
}

#[test]
fn status_reports_logged_out_without_marker() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let url = dead_url();
	let run = run_zombload(tmp.path(), &url, &["-f", "json", "status"]);
	assert!(run.success, "status failed: {}", run.stderr);

	let json = run.json();
	assert_eq!(json["authenticated"], false);
	assert_eq!(json["url"], url);
	assert_eq!(json["channel"], Value::Null);
}

#[test]
fn status_trusts_existing_marker() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_marker(tmp.path(), r#"{"authenticated":true,"cookie":"session=abc"}"#);

	let run = run_zombload(tmp.path(), &dead_url(), &["status"]);
	assert!(run.success, "status failed: {}", run.stderr);
	assert!(run.stdout.contains("logged in"), "stdout: {}", run.stdout);
}

#[test]
fn corrupt_marker_counts_as_logged_out() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_marker(tmp.path(), "{ not json");

	let run = run_zombload(tmp.path(), &dead_url(), &["-f", "json", "status"]);
	assert!(run.success, "status failed: {}", run.stderr);
	assert_eq!(run.json()["authenticated"], false);
}

#[test]
fn logout_clears_marker_when_backend_is_unreachable() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_marker(tmp.path(), r#"{"authenticated":true,"cookie":"session=abc"}"#);

	let run = run_zombload(tmp.path(), &dead_url(), &["-f", "json", "logout"]);
	assert!(run.success, "logout failed: {}", run.stderr);
	assert_eq!(run.json()["authenticated"], false);
	assert!(!session_file(tmp.path()).exists());

	// Idempotent.
	let run = run_zombload(tmp.path(), &dead_url(), &["logout"]);
	assert!(run.success, "second logout failed: {}", run.stderr);
	assert!(run.stdout.contains("Not logged in"));
}

#[test]
fn login_against_unreachable_backend_fails_without_marker() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let run = run_zombload(tmp.path(), &dead_url(), &["login", "-u", "admin", "-p", "admin"]);
	assert!(!run.success);
	assert!(run.stderr.contains("Login failed"), "stderr: {}", run.stderr);
	assert!(!session_file(tmp.path()).exists());
}

#[test]
fn api_commands_require_login() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let run = run_zombload(tmp.path(), &dead_url(), &["files", "list", "main"]);
	assert!(!run.success);
	assert!(run.stderr.contains("Not logged in"), "stderr: {}", run.stderr);

	let run = run_zombload(tmp.path(), &dead_url(), &["start", "--timeout", "1"]);
	assert!(!run.success);
	assert!(run.stderr.contains("Not logged in"), "stderr: {}", run.stderr);
}

#[test]
fn profile_auth_prints_encoded_url() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_marker(tmp.path(), r#"{"authenticated":true,"cookie":"session=abc"}"#);
	let url = dead_url();

	let run = run_zombload(tmp.path(), &url, &["-f", "json", "profile", "auth", "Contoh Profil"]);
	assert!(run.success, "profile auth failed: {}", run.stderr);
	assert_eq!(run.json()["authUrl"], format!("{url}/auth/Contoh%20Profil"));
}

#[test]
fn upload_of_unknown_file_type_fails_locally() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_marker(tmp.path(), r#"{"authenticated":true,"cookie":"session=abc"}"#);
	std::fs::write(tmp.path().join("notes.txt"), "hello").expect("file should be written");

	let run = run_zombload(tmp.path(), &dead_url(), &["files", "upload", "main", "notes.txt"]);
	assert!(!run.success);
	assert!(run.stderr.contains("cannot tell the media kind"), "stderr: {}", run.stderr);
}

#[test]
fn channel_commands_time_out_without_backend() {
	let tmp = TempDir::new().expect("temp dir should be created");
	write_marker(tmp.path(), r#"{"authenticated":true,"cookie":"session=abc"}"#);

	let run = run_zombload(tmp.path(), &dead_url(), &["stop", "--timeout", "1"]);
	assert!(!run.success);
	assert!(run.stderr.contains("Timed out"), "stderr: {}", run.stderr);
	// A failed channel attempt does not end the session.
	assert!(session_file(tmp.path()).exists());
}
