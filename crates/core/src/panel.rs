//! Composition root.
//!
//! [`Panel`] owns exactly one [`SessionManager`] and exactly one
//! [`ChannelSupervisor`], and re-synchronises the channel after every session
//! change. Consumers get read handles ([`Panel::subscribe`]) or intent handles
//! ([`Panel::dispatcher`]); nothing else can write the derived state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::{AuthCollaborator, HttpAuth};
use crate::config::PanelConfig;
use crate::error::Result;
use crate::http::HttpBackend;
use crate::marker::{FileMarker, MarkerStore};
use crate::session::{Session, SessionManager};
use crate::store::PanelSnapshot;
use crate::supervisor::{ChannelPhase, ChannelSupervisor, CommandDispatcher};
use crate::transport::{Connector, WebSocketConnector};

pub struct Panel {
	sessions: SessionManager,
	supervisor: ChannelSupervisor,
}

impl Panel {
	pub fn new(auth: Arc<dyn AuthCollaborator>, marker: Arc<dyn MarkerStore>, connector: Arc<dyn Connector>) -> Self {
		Self {
			sessions: SessionManager::new(auth, marker),
			supervisor: ChannelSupervisor::new(connector),
		}
	}

	/// Wires the HTTP collaborator, file marker and Socket.IO transport from
	/// `config`, sharing `backend`'s cookie jar.
	pub fn with_http(config: &PanelConfig, backend: HttpBackend) -> Result<Self> {
		let connector = WebSocketConnector::new(backend.base_url(), config.backoff())?;
		Ok(Self::new(
			Arc::new(HttpAuth::new(backend)),
			Arc::new(FileMarker::new(config.marker_path())),
			Arc::new(connector),
		))
	}

	/// Restores a persisted session, opening the channel if one was found.
	pub fn restore_session(&mut self) -> bool {
		let restored = self.sessions.restore_session();
		self.supervisor.reconcile(self.sessions.session());
		restored
	}

	/// Logs in and, on success, opens the channel.
	///
	/// A failed login leaves both session and channel untouched.
	pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
		self.sessions.login(username, password).await?;
		self.supervisor.reconcile(self.sessions.session());
		Ok(())
	}

	/// Logs out locally, tears the channel down, then invalidates the
	/// server-side session on a best-effort basis.
	pub async fn logout(&mut self) {
		let credentials = self.sessions.logout();
		self.supervisor.reconcile(self.sessions.session());
		self.sessions.invalidate_remote(&credentials).await;
	}

	pub fn session(&self) -> &Session {
		self.sessions.session()
	}

	pub fn is_authenticated(&self) -> bool {
		self.sessions.is_authenticated()
	}

	pub fn phase(&self) -> ChannelPhase {
		self.supervisor.phase()
	}

	pub fn snapshot(&self) -> PanelSnapshot {
		self.supervisor.snapshot()
	}

	pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
		self.supervisor.subscribe()
	}

	pub fn dispatcher(&self) -> CommandDispatcher {
		self.supervisor.dispatcher()
	}

	pub fn request_start(&self) {
		self.supervisor.dispatcher().request_start();
	}

	pub fn request_stop(&self) {
		self.supervisor.dispatcher().request_stop();
	}
}
