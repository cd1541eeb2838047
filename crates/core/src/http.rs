//! Shared cookie-carrying HTTP client for the backend's REST surface.

use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};

use crate::auth::Credentials;
use crate::error::{Error, Result};

/// HTTP client bound to one backend origin.
///
/// Clones share the connection pool and cookie jar, so a session cookie set by
/// `POST /login` is presented by every later request.
#[derive(Debug, Clone)]
pub struct HttpBackend {
	client: reqwest::Client,
	jar: Arc<Jar>,
	base_url: Url,
}

impl HttpBackend {
	pub fn new(base_url: Url) -> Result<Self> {
		let jar = Arc::new(Jar::default());
		let client = reqwest::Client::builder()
			.cookie_provider(Arc::clone(&jar))
			.user_agent(concat!("zombload/", env!("CARGO_PKG_VERSION")))
			.build()?;
		Ok(Self { client, jar, base_url })
	}

	pub fn client(&self) -> &reqwest::Client {
		&self.client
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Builds `<base>/<segment>/<segment>...`, percent-encoding each segment.
	pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.base_url.clone();
		url.path_segments_mut()
			.map_err(|_| Error::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	/// `Cookie` header value the jar would send to the backend origin.
	pub fn session_cookie(&self) -> Option<String> {
		self.jar
			.cookies(&self.base_url)
			.and_then(|value| value.to_str().ok().map(str::to_owned))
	}

	/// Seeds the jar with previously persisted credentials.
	pub fn use_credentials(&self, credentials: &Credentials) {
		let Some(cookie) = credentials.cookie.as_deref() else {
			return;
		};
		for pair in cookie.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
			self.jar.add_cookie_str(pair, &self.base_url);
		}
	}
}
