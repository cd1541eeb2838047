//! Error types for the Zombload client.

use thiserror::Error;
use zombload_protocol::PacketError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Credentials were refused by the authentication endpoint.
	#[error("Login failed: {0}")]
	AuthRejected(String),

	/// The authentication endpoint could not be reached.
	#[error("Login failed: authentication service unreachable: {0}")]
	AuthTransport(String),

	/// The real-time channel transport failed.
	#[error("Channel transport failure: {0}")]
	ChannelTransport(String),

	#[error("Protocol error: {0}")]
	Protocol(#[from] PacketError),

	/// A REST endpoint answered with an error status or envelope.
	#[error("API error: {0}")]
	Api(String),

	/// Input rejected locally before contacting the backend.
	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Invalid URL: {0}")]
	InvalidUrl(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("WebSocket error: {0}")]
	WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl Error {
	/// Whether the error means the operator is not logged in.
	pub fn is_auth_failure(&self) -> bool {
		matches!(self, Error::AuthRejected(_) | Error::AuthTransport(_))
	}
}

impl From<url::ParseError> for Error {
	fn from(err: url::ParseError) -> Self {
		Error::InvalidUrl(err.to_string())
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::WebSocket(Box::new(err))
	}
}
