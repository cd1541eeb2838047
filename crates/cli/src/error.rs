use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("Not logged in; run `zombload login` first")]
	NotLoggedIn,

	#[error("Timed out after {secs}s waiting for {what}")]
	Timeout { what: &'static str, secs: u64 },

	#[error("Channel closed while waiting for {0}")]
	ChannelClosed(&'static str),
}
