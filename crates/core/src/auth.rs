//! Authentication collaborator.
//!
//! Credential exchange happens over plain HTTP; the resulting session cookie is
//! what the real-time channel presents when it connects.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::Form;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::HttpBackend;

/// Session credentials carried by the channel and API requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
	/// `Cookie` header value issued by the backend on login.
	pub cookie: Option<String>,
}

#[async_trait]
pub trait AuthCollaborator: Send + Sync {
	/// Exchanges a username and password for session credentials.
	///
	/// Fails with [`Error::AuthRejected`] on refused credentials and
	/// [`Error::AuthTransport`] when the service cannot be reached.
	async fn login(&self, username: &str, password: &str) -> Result<Credentials>;

	/// Asks the backend to invalidate server-side session state.
	async fn logout(&self, credentials: &Credentials) -> Result<()>;
}

/// Authentication against the backend's `/login` and `/logout` endpoints.
#[derive(Debug, Clone)]
pub struct HttpAuth {
	backend: HttpBackend,
}

impl HttpAuth {
	pub fn new(backend: HttpBackend) -> Self {
		Self { backend }
	}
}

#[async_trait]
impl AuthCollaborator for HttpAuth {
	async fn login(&self, username: &str, password: &str) -> Result<Credentials> {
		let url = self.backend.endpoint(&["login"])?;
		let form = Form::new()
			.text("username", username.to_owned())
			.text("password", password.to_owned());

		let response = self
			.backend
			.client()
			.post(url)
			.multipart(form)
			.send()
			.await
			.map_err(|err| Error::AuthTransport(err.to_string()))?;

		let status = response.status();
		debug!(target = "zombload.session", %status, "login response");
		match status {
			StatusCode::OK => Ok(Credentials {
				cookie: self.backend.session_cookie(),
			}),
			status if status.is_server_error() => Err(Error::AuthTransport(format!("login endpoint returned {status}"))),
			_ => Err(Error::AuthRejected("invalid username or password".to_string())),
		}
	}

	async fn logout(&self, credentials: &Credentials) -> Result<()> {
		self.backend.use_credentials(credentials);
		let url = self.backend.endpoint(&["logout"])?;
		self.backend.client().get(url).send().await?.error_for_status()?;
		Ok(())
	}
}

/// Collaborator accepting one fixed username/password pair.
///
/// Used where no backend is available, chiefly tests.
#[derive(Debug, Clone)]
pub struct StaticAuth {
	username: String,
	password: String,
	cookie: Option<String>,
	reachable: bool,
	fail_logout: bool,
	logouts: Arc<AtomicUsize>,
}

impl StaticAuth {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
			cookie: Some("session=static".to_string()),
			reachable: true,
			fail_logout: false,
			logouts: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Every login fails as if the service were down.
	pub fn unreachable() -> Self {
		Self {
			reachable: false,
			..Self::new("", "")
		}
	}

	pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
		self.cookie = Some(cookie.into());
		self
	}

	/// Makes remote logout fail, to exercise the best-effort path.
	pub fn failing_logout(mut self) -> Self {
		self.fail_logout = true;
		self
	}

	/// Number of remote logout calls received so far (shared between clones).
	pub fn logout_calls(&self) -> usize {
		self.logouts.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl AuthCollaborator for StaticAuth {
	async fn login(&self, username: &str, password: &str) -> Result<Credentials> {
		if !self.reachable {
			return Err(Error::AuthTransport("connection refused".to_string()));
		}
		if username == self.username && password == self.password {
			Ok(Credentials {
				cookie: self.cookie.clone(),
			})
		} else {
			Err(Error::AuthRejected("invalid username or password".to_string()))
		}
	}

	async fn logout(&self, _credentials: &Credentials) -> Result<()> {
		self.logouts.fetch_add(1, Ordering::SeqCst);
		if self.fail_logout {
			return Err(Error::Api("logout endpoint unavailable".to_string()));
		}
		Ok(())
	}
}
