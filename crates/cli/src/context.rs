use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use zombload::{
	FileMarker, HttpAuth, HttpBackend, MarkerStore, Panel, PanelApi, PanelConfig, PanelSnapshot, SessionManager,
};

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
	config: PanelConfig,
	format: OutputFormat,
}

impl CommandContext {
	/// Config file, then `ZOMBLOAD_*` variables, then flags.
	pub fn new(cli: &Cli) -> zombload::Result<Self> {
		let mut config = PanelConfig::load(cli.config.as_deref())?;
		if let Some(url) = &cli.url {
			config.base_url = url.clone();
		}
		if let Some(path) = &cli.session_file {
			config.marker_path = Some(path.clone());
		}
		Ok(Self {
			config,
			format: cli.format,
		})
	}

	pub fn config(&self) -> &PanelConfig {
		&self.config
	}

	pub fn format(&self) -> OutputFormat {
		self.format
	}

	pub fn marker(&self) -> FileMarker {
		FileMarker::new(self.config.marker_path())
	}

	pub fn backend(&self) -> zombload::Result<HttpBackend> {
		HttpBackend::new(self.config.base_url()?)
	}

	pub fn panel(&self) -> zombload::Result<Panel> {
		Panel::with_http(&self.config, self.backend()?)
	}

	/// Session manager without a channel, for commands that only touch the
	/// session itself.
	pub fn sessions(&self) -> zombload::Result<SessionManager> {
		Ok(SessionManager::new(
			Arc::new(HttpAuth::new(self.backend()?)),
			Arc::new(self.marker()),
		))
	}

	/// Panel with the persisted session restored and its channel opening.
	pub fn restored_panel(&self) -> anyhow::Result<Panel> {
		let mut panel = self.panel()?;
		if !panel.restore_session() {
			return Err(CliError::NotLoggedIn.into());
		}
		Ok(panel)
	}

	/// REST client presenting the persisted session cookie.
	pub fn api(&self) -> anyhow::Result<PanelApi> {
		let marker = self
			.marker()
			.load()
			.filter(|marker| marker.authenticated)
			.ok_or(CliError::NotLoggedIn)?;
		let api = PanelApi::new(self.backend()?);
		api.use_credentials(&marker.credentials());
		Ok(api)
	}
}

/// Waits until `condition` holds for the latest snapshot.
pub async fn wait_for(
	updates: &mut watch::Receiver<PanelSnapshot>,
	what: &'static str,
	timeout_secs: u64,
	condition: impl FnMut(&PanelSnapshot) -> bool,
) -> anyhow::Result<PanelSnapshot> {
	match tokio::time::timeout(Duration::from_secs(timeout_secs), updates.wait_for(condition)).await {
		Ok(Ok(snapshot)) => Ok(snapshot.clone()),
		Ok(Err(_)) => Err(CliError::ChannelClosed(what).into()),
		Err(_) => Err(CliError::Timeout {
			what,
			secs: timeout_secs,
		}
		.into()),
	}
}
