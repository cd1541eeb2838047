//! Durable session marker.
//!
//! The marker records that the operator logged in, together with the session
//! cookie the channel must present. Its presence alone is trusted on restore;
//! validity is only checked when the channel or an API call is attempted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::Credentials;
use crate::error::Result;

/// Persisted form of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarker {
	pub authenticated: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cookie: Option<String>,
}

impl SessionMarker {
	pub fn authenticated(credentials: &Credentials) -> Self {
		Self {
			authenticated: true,
			cookie: credentials.cookie.clone(),
		}
	}

	pub fn credentials(&self) -> Credentials {
		Credentials {
			cookie: self.cookie.clone(),
		}
	}
}

/// Storage backend for the session marker.
pub trait MarkerStore: Send + Sync {
	/// Returns the stored marker; unreadable markers count as absent.
	fn load(&self) -> Option<SessionMarker>;
	fn save(&self, marker: &SessionMarker) -> Result<()>;
	/// Removes the marker. Returns whether one existed.
	fn clear(&self) -> Result<bool>;
}

/// Marker persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileMarker {
	path: PathBuf,
}

impl FileMarker {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl MarkerStore for FileMarker {
	fn load(&self) -> Option<SessionMarker> {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
			Err(err) => {
				warn!(target = "zombload.session", path = %self.path.display(), error = %err, "cannot read session marker");
				return None;
			}
		};
		match serde_json::from_str(&content) {
			Ok(marker) => Some(marker),
			Err(err) => {
				warn!(target = "zombload.session", path = %self.path.display(), error = %err, "ignoring corrupt session marker");
				None
			}
		}
	}

	fn save(&self, marker: &SessionMarker) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		fs::write(&self.path, serde_json::to_string_pretty(marker)?)?;
		// The marker carries a session cookie.
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
		}
		Ok(())
	}

	fn clear(&self) -> Result<bool> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(true),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(err) => Err(err.into()),
		}
	}
}

/// In-process marker, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarker {
	inner: Arc<Mutex<Option<SessionMarker>>>,
}

impl MemoryMarker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_marker(marker: SessionMarker) -> Self {
		Self {
			inner: Arc::new(Mutex::new(Some(marker))),
		}
	}

	pub fn get(&self) -> Option<SessionMarker> {
		self.inner.lock().clone()
	}
}

impl MarkerStore for MemoryMarker {
	fn load(&self) -> Option<SessionMarker> {
		self.get()
	}

	fn save(&self, marker: &SessionMarker) -> Result<()> {
		*self.inner.lock() = Some(marker.clone());
		Ok(())
	}

	fn clear(&self) -> Result<bool> {
		Ok(self.inner.lock().take().is_some())
	}
}
