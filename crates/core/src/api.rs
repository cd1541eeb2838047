//! Typed client for the backend's profile, media and text endpoints.
//!
//! These sit beside the real-time channel rather than inside it: each call is
//! a single request/response on the shared [`HttpBackend`], so it carries the
//! same session cookie the channel does.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use zombload_protocol::api::{
	ApiResponse, DeleteFileRequest, DeleteProfileRequest, FilesData, MediaKind, Profile, ProfileUpdate, SaveTextFileRequest,
	TextFile, TextPool,
};

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::http::HttpBackend;

#[derive(Debug, Clone)]
pub struct PanelApi {
	backend: HttpBackend,
}

impl PanelApi {
	pub fn new(backend: HttpBackend) -> Self {
		Self { backend }
	}

	/// Presents previously persisted credentials on every later request.
	pub fn use_credentials(&self, credentials: &Credentials) {
		self.backend.use_credentials(credentials);
	}

	pub async fn get_profile(&self, name: &str) -> Result<Profile> {
		let url = self.backend.endpoint(&["get_profile", name])?;
		let response = self.backend.client().get(url).send().await?;
		read_json(response).await
	}

	pub async fn save_profile(&self, name: &str, profile: &Profile) -> Result<ApiResponse> {
		let url = self.backend.endpoint(&["save_profile"])?;
		let body = ProfileUpdate {
			profile_name: name,
			profile,
		};
		let response = self.backend.client().post(url).json(&body).send().await?;
		read_envelope(response).await
	}

	/// Registers a new profile, uploading its OAuth client secret.
	pub async fn add_profile(&self, name: &str, client_secret: &Path) -> Result<ApiResponse> {
		let bytes = tokio::fs::read(client_secret).await?;
		let form = Form::new()
			.text("profile_name", name.to_owned())
			.part("client_secret_file", Part::bytes(bytes).file_name(file_name(client_secret)?));
		let url = self.backend.endpoint(&["add_profile"])?;
		let response = self.backend.client().post(url).multipart(form).send().await?;
		read_envelope(response).await
	}

	pub async fn delete_profile(&self, name: &str) -> Result<ApiResponse> {
		let url = self.backend.endpoint(&["delete_profile"])?;
		let body = DeleteProfileRequest { profile_name: name };
		let response = self.backend.client().post(url).json(&body).send().await?;
		read_envelope(response).await
	}

	/// Page that starts the YouTube OAuth flow for `name`. It has to be
	/// opened in the operator's browser.
	pub fn profile_auth_url(&self, name: &str) -> Result<Url> {
		self.backend.endpoint(&["auth", name])
	}

	pub async fn list_files(&self, name: &str) -> Result<FilesData> {
		let url = self.backend.endpoint(&["list_files", name])?;
		let response = self.backend.client().get(url).send().await?;
		read_json(response).await
	}

	/// Uploads one media file into the profile's `kind` folder.
	///
	/// Files whose extension the backend would refuse are rejected locally.
	pub async fn upload_file(&self, name: &str, kind: MediaKind, path: &Path) -> Result<ApiResponse> {
		if !kind.accepts(path) {
			return Err(Error::InvalidInput(format!(
				"{} is not a {} file (accepted: {})",
				path.display(),
				kind.wire_name(),
				kind.extensions().join(", ")
			)));
		}

		let bytes = tokio::fs::read(path).await?;
		debug!(target = "zombload.api", file = %path.display(), size = bytes.len(), kind = kind.wire_name(), "uploading");
		let form = Form::new()
			.part("file", Part::bytes(bytes).file_name(file_name(path)?))
			.text("profile_name", name.to_owned())
			.text("file_type", kind.wire_name());
		let url = self.backend.endpoint(&["upload_file"])?;
		let response = self.backend.client().post(url).multipart(form).send().await?;
		read_envelope(response).await
	}

	pub async fn delete_file(&self, name: &str, file: &str, kind: MediaKind) -> Result<ApiResponse> {
		let url = self.backend.endpoint(&["delete_file"])?;
		let body = DeleteFileRequest {
			profile_name: name,
			file_name: file,
			file_type: kind.wire_name(),
		};
		let response = self.backend.client().post(url).json(&body).send().await?;
		read_envelope(response).await
	}

	pub async fn get_text_file(&self, name: &str, pool: TextPool) -> Result<String> {
		let url = self.backend.endpoint(&["get_text_file", name, pool.wire_name()])?;
		let response = self.backend.client().get(url).send().await?;
		let file: TextFile = read_json(response).await?;
		Ok(file.content)
	}

	pub async fn save_text_file(&self, name: &str, pool: TextPool, content: &str) -> Result<ApiResponse> {
		let url = self.backend.endpoint(&["save_text_file"])?;
		let body = SaveTextFileRequest {
			profile_name: name,
			file_type: pool.wire_name(),
			content,
		};
		let response = self.backend.client().post(url).json(&body).send().await?;
		read_envelope(response).await
	}
}

fn file_name(path: &Path) -> Result<String> {
	path.file_name()
		.and_then(|name| name.to_str())
		.map(str::to_owned)
		.ok_or_else(|| Error::InvalidInput(format!("{} has no usable file name", path.display())))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
	let status = response.status();
	let body = response.bytes().await?;
	parse_json(status, &body)
}

async fn read_envelope(response: Response) -> Result<ApiResponse> {
	let status = response.status();
	let body = response.bytes().await?;
	parse_envelope(status, &body)
}

fn parse_json<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
	if !status.is_success() {
		return Err(error_from_body(status, body));
	}
	Ok(serde_json::from_slice(body)?)
}

/// Mutating endpoints answer `{status, message}`; an `error` status fails the
/// call even when the HTTP status is 200.
fn parse_envelope(status: StatusCode, body: &[u8]) -> Result<ApiResponse> {
	match serde_json::from_slice::<ApiResponse>(body) {
		Ok(envelope) if envelope.is_success() && status.is_success() => Ok(envelope),
		Ok(_) => Err(error_from_body(status, body)),
		Err(err) if status.is_success() => Err(Error::Json(err)),
		Err(_) => Err(error_from_body(status, body)),
	}
}

fn error_from_body(status: StatusCode, body: &[u8]) -> Error {
	match serde_json::from_slice::<ApiResponse>(body) {
		Ok(envelope) if !envelope.message.is_empty() => Error::Api(envelope.message),
		_ => Error::Api(format!("backend returned {status}")),
	}
}
