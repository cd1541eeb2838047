//! Client configuration.
//!
//! Layering, lowest to highest precedence: built-in defaults, an optional JSON
//! file, `ZOMBLOAD_*` environment variables, and finally whatever the caller
//! (usually CLI flags) sets on the loaded value.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::Backoff;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const ENV_URL: &str = "ZOMBLOAD_URL";
pub const ENV_SESSION_FILE: &str = "ZOMBLOAD_SESSION_FILE";

/// Socket.IO client defaults: `reconnectionDelay` and `reconnectionDelayMax`.
const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1_000;
const DEFAULT_RECONNECT_MAX_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
	/// Backend origin serving both the REST API and the Socket.IO endpoint.
	pub base_url: String,
	/// Location of the durable session marker.
	pub marker_path: Option<PathBuf>,
	pub reconnect_initial_ms: u64,
	pub reconnect_max_ms: u64,
}

impl Default for PanelConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			marker_path: None,
			reconnect_initial_ms: DEFAULT_RECONNECT_INITIAL_MS,
			reconnect_max_ms: DEFAULT_RECONNECT_MAX_MS,
		}
	}
}

impl PanelConfig {
	/// Loads defaults, then `path` when given, then environment overrides.
	///
	/// A missing file is an error only when it was named explicitly.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let mut config = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		config.apply_overrides(|key| std::env::var(key).ok());
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path).map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
		serde_json::from_str(&content).map_err(|err| Error::Config(format!("cannot parse {}: {err}", path.display())))
	}

	/// Applies `ZOMBLOAD_*` overrides read through `lookup`.
	pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
		if let Some(url) = lookup(ENV_URL).filter(|value| !value.trim().is_empty()) {
			self.base_url = url;
		}
		if let Some(path) = lookup(ENV_SESSION_FILE).filter(|value| !value.trim().is_empty()) {
			self.marker_path = Some(PathBuf::from(path));
		}
	}

	/// Parsed backend origin. Only `http` and `https` are accepted.
	pub fn base_url(&self) -> Result<Url> {
		let url = Url::parse(&self.base_url)?;
		match url.scheme() {
			"http" | "https" => Ok(url),
			other => Err(Error::Config(format!("unsupported URL scheme '{other}' in {}", self.base_url))),
		}
	}

	pub fn marker_path(&self) -> PathBuf {
		self.marker_path.clone().unwrap_or_else(default_marker_path)
	}

	pub fn backoff(&self) -> Backoff {
		let initial = Duration::from_millis(self.reconnect_initial_ms.max(1));
		let max = Duration::from_millis(self.reconnect_max_ms).max(initial);
		Backoff::new(initial, max)
	}
}

fn default_marker_path() -> PathBuf {
	dirs::config_dir()
		.unwrap_or_else(|| PathBuf::from("."))
		.join("zombload")
		.join("session.json")
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn defaults_match_backend() {
		let config = PanelConfig::default();
		assert_eq!(config.base_url().unwrap().as_str(), "http://localhost:5000/");
		assert_eq!(config.backoff(), Backoff::new(Duration::from_secs(1), Duration::from_secs(5)));
		assert!(config.marker_path().ends_with("zombload/session.json"));
	}

	#[test]
	fn env_overrides_file_values() {
		let mut config: PanelConfig = serde_json::from_str(r#"{"baseUrl":"http://panel.lan:5000","reconnectMaxMs":9000}"#).unwrap();
		assert_eq!(config.reconnect_initial_ms, 1_000);
		assert_eq!(config.reconnect_max_ms, 9_000);

		let env: HashMap<&str, &str> = HashMap::from([(ENV_URL, "https://panel.example"), (ENV_SESSION_FILE, "/tmp/zl.json")]);
		config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));
		assert_eq!(config.base_url, "https://panel.example");
		assert_eq!(config.marker_path(), PathBuf::from("/tmp/zl.json"));
	}

	#[test]
	fn blank_env_values_are_ignored() {
		let mut config = PanelConfig::default();
		config.apply_overrides(|_| Some("  ".to_string()));
		assert_eq!(config, PanelConfig::default());
	}

	#[test]
	fn rejects_non_http_scheme() {
		let config = PanelConfig {
			base_url: "ftp://localhost".to_string(),
			..Default::default()
		};
		assert!(matches!(config.base_url(), Err(Error::Config(_))));
	}

	#[test]
	fn load_reads_explicit_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("panel.json");
		fs::write(&path, r#"{"reconnectInitialMs":250}"#).unwrap();
		let config = PanelConfig::from_file(&path).unwrap();
		assert_eq!(config.reconnect_initial_ms, 250);
		assert!(PanelConfig::from_file(&dir.path().join("missing.json")).is_err());
	}
}
