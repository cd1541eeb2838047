//! Session management: the sole gate for whether a channel may exist.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{AuthCollaborator, Credentials};
use crate::error::Result;
use crate::marker::{MarkerStore, SessionMarker};

/// Authentication state of the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
	authenticated: bool,
	credentials: Credentials,
}

impl Session {
	pub fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}
}

/// Owns the single [`Session`] and its durable marker.
pub struct SessionManager {
	auth: Arc<dyn AuthCollaborator>,
	marker: Arc<dyn MarkerStore>,
	session: Session,
}

impl SessionManager {
	pub fn new(auth: Arc<dyn AuthCollaborator>, marker: Arc<dyn MarkerStore>) -> Self {
		Self {
			auth,
			marker,
			session: Session::default(),
		}
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn is_authenticated(&self) -> bool {
		self.session.authenticated
	}

	/// Restores a session from the durable marker without re-validating it.
	///
	/// Returns whether the session is now authenticated.
	pub fn restore_session(&mut self) -> bool {
		match self.marker.load() {
			Some(marker) if marker.authenticated => {
				debug!(target = "zombload.session", "restored session from marker");
				self.session = Session {
					authenticated: true,
					credentials: marker.credentials(),
				};
			}
			_ => debug!(target = "zombload.session", "no session marker"),
		}
		self.session.authenticated
	}

	/// Exchanges credentials with the authentication collaborator.
	///
	/// On failure the session is left exactly as it was and the error is
	/// returned for the caller to surface.
	pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
		let credentials = match self.auth.login(username, password).await {
			Ok(credentials) => credentials,
			Err(err) => {
				warn!(target = "zombload.session", %username, error = %err, "login failed");
				return Err(err);
			}
		};

		if let Err(err) = self.marker.save(&SessionMarker::authenticated(&credentials)) {
			warn!(target = "zombload.session", error = %err, "cannot persist session marker; session lasts for this process only");
		}
		self.session = Session {
			authenticated: true,
			credentials,
		};
		info!(target = "zombload.session", %username, "login successful");
		Ok(())
	}

	/// Clears the local session and its marker. Idempotent and infallible.
	///
	/// Returns the credentials that should be invalidated remotely through
	/// [`SessionManager::invalidate_remote`].
	pub fn logout(&mut self) -> Credentials {
		let previous = std::mem::take(&mut self.session);
		if let Err(err) = self.marker.clear() {
			warn!(target = "zombload.session", error = %err, "cannot remove session marker");
		}
		if previous.authenticated {
			info!(target = "zombload.session", "logged out");
		}
		previous.credentials
	}

	/// Best-effort server-side logout. Failures are logged and swallowed.
	pub async fn invalidate_remote(&self, credentials: &Credentials) {
		if let Err(err) = self.auth.logout(credentials).await {
			warn!(target = "zombload.session", error = %err, "remote logout failed");
		}
	}
}
