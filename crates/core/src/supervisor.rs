//! Channel supervision and command dispatch.
//!
//! The supervisor keeps exactly one transport alive while the session is
//! authenticated and none otherwise. It follows the session reactively: the
//! owner calls [`ChannelSupervisor::reconcile`] after every session change.
//!
//! ```text
//!            authenticated            connect
//! Unopened ───────────────► Connecting ───────► Open
//!                  ▲           ▲   │ ◄─────────  │
//!                  │           │   │ disconnect  │
//!        authenticated         │   ▼             ▼
//!               Closed ◄───────┴── (any) ◄── logged out
//! ```
//!
//! Every transport is tagged with a generation. Events still in flight from a
//! torn-down transport carry a stale generation and are discarded.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use zombload_protocol::{ChannelEvent, Intent};

use crate::auth::Credentials;
use crate::session::Session;
use crate::store::{PanelSnapshot, StateStore};
use crate::transport::Connector;

/// Lifecycle of the real-time channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelPhase {
	#[default]
	Unopened,
	Connecting,
	Open,
	Closed,
}

impl ChannelPhase {
	/// Whether a transport handle exists in this phase.
	pub fn is_live(self) -> bool {
		matches!(self, Self::Connecting | Self::Open)
	}
}

impl std::fmt::Display for ChannelPhase {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Self::Unopened => "unopened",
			Self::Connecting => "connecting",
			Self::Open => "open",
			Self::Closed => "closed",
		})
	}
}

struct LiveChannel {
	generation: u64,
	credentials: Credentials,
	outbound: mpsc::UnboundedSender<Intent>,
	driver: JoinHandle<()>,
	pump: JoinHandle<()>,
}

/// How long a closing driver gets to say goodbye to the server.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

impl LiveChannel {
	/// Stops event delivery at once and lets the driver disconnect cleanly.
	///
	/// Dropping `outbound` is the driver's cue to send the namespace
	/// disconnect and close the socket. It is aborted if it has not finished
	/// within [`SHUTDOWN_GRACE`], or right away outside a runtime.
	fn shutdown(self) {
		let Self {
			generation,
			outbound,
			mut driver,
			pump,
			..
		} = self;
		pump.abort();
		drop(outbound);

		match tokio::runtime::Handle::try_current() {
			Ok(runtime) => {
				runtime.spawn(async move {
					if tokio::time::timeout(SHUTDOWN_GRACE, &mut driver).await.is_err() {
						debug!(target = "zombload.channel", generation, "transport did not stop in time; aborting");
						driver.abort();
					}
				});
			}
			Err(_) => driver.abort(),
		}
	}
}

struct Inner {
	phase: ChannelPhase,
	generation: u64,
	store: StateStore,
	live: Option<LiveChannel>,
}

struct Shared {
	inner: Mutex<Inner>,
	snapshots: watch::Sender<PanelSnapshot>,
}

impl Shared {
	fn publish(&self, inner: &Inner) {
		self.snapshots.send_replace(inner.store.snapshot(inner.phase));
	}

	/// Folds one inbound event if it belongs to the live transport.
	fn fold(&self, generation: u64, event: ChannelEvent) {
		let mut inner = self.inner.lock();
		if inner.live.as_ref().map(|live| live.generation) != Some(generation) {
			trace!(target = "zombload.channel", generation, event = event.name(), "discarding event from closed channel");
			return;
		}

		match &event {
			ChannelEvent::Connect => {
				inner.phase = ChannelPhase::Open;
				info!(target = "zombload.channel", generation, "channel connected");
			}
			ChannelEvent::Disconnect => {
				inner.phase = ChannelPhase::Connecting;
				warn!(target = "zombload.channel", generation, "channel disconnected; waiting for transport to reconnect");
			}
			_ => {}
		}

		if inner.store.apply(event) {
			self.publish(&inner);
		}
	}
}

/// Owner of the single real-time channel and its derived state.
#[derive(Clone)]
pub struct ChannelSupervisor {
	connector: Arc<dyn Connector>,
	shared: Arc<Shared>,
}

impl ChannelSupervisor {
	pub fn new(connector: Arc<dyn Connector>) -> Self {
		let inner = Inner {
			phase: ChannelPhase::Unopened,
			generation: 0,
			store: StateStore::new(),
			live: None,
		};
		let (snapshots, _) = watch::channel(inner.store.snapshot(inner.phase));
		Self {
			connector,
			shared: Arc::new(Shared {
				inner: Mutex::new(inner),
				snapshots,
			}),
		}
	}

	/// Brings the channel in line with `session`.
	///
	/// Opens a transport when authenticated and none is live (or the live one
	/// carries different credentials); closes it when not authenticated.
	/// Must be called from within a Tokio runtime.
	pub fn reconcile(&self, session: &Session) {
		if !session.is_authenticated() {
			self.close();
			return;
		}

		let current = {
			let inner = self.shared.inner.lock();
			inner.live.as_ref().map(|live| live.credentials.clone())
		};
		if current.as_ref() != Some(session.credentials()) {
			self.open(session.credentials());
		}
	}

	fn open(&self, credentials: &Credentials) {
		let mut inner = self.shared.inner.lock();
		if let Some(previous) = inner.live.take() {
			debug!(target = "zombload.channel", generation = previous.generation, "closing previous transport before reopening");
			previous.shutdown();
			// Last-known scheduler state, logs and metrics carry over; only
			// the connect of the new transport makes the channel connected.
			inner.store.apply(ChannelEvent::Disconnect);
		}

		inner.generation += 1;
		let generation = inner.generation;
		let parts = self.connector.connect(credentials);

		let run = parts.driver.run();
		let driver = tokio::spawn(async move {
			if let Err(err) = run.await {
				warn!(target = "zombload.channel", generation, error = %err, "transport stopped");
			}
		});

		// Weak, so dropping the last supervisor handle tears the channel down.
		let shared = Arc::downgrade(&self.shared);
		let mut inbound = parts.inbound;
		let pump = tokio::spawn(async move {
			while let Some(event) = inbound.recv().await {
				let Some(shared) = shared.upgrade() else {
					break;
				};
				shared.fold(generation, event);
			}
			debug!(target = "zombload.channel", generation, "event stream ended");
		});

		inner.live = Some(LiveChannel {
			generation,
			credentials: credentials.clone(),
			outbound: parts.outbound,
			driver,
			pump,
		});
		inner.phase = ChannelPhase::Connecting;
		info!(target = "zombload.channel", generation, "channel connecting");
		self.shared.publish(&inner);
	}

	fn close(&self) {
		let mut inner = self.shared.inner.lock();
		let Some(live) = inner.live.take() else {
			return;
		};
		info!(target = "zombload.channel", generation = live.generation, "channel closed");
		live.shutdown();
		inner.phase = ChannelPhase::Closed;
		inner.store.reset();
		self.shared.publish(&inner);
	}

	pub fn phase(&self) -> ChannelPhase {
		self.shared.inner.lock().phase
	}

	/// Generation of the live transport, if any.
	pub fn generation(&self) -> Option<u64> {
		self.shared.inner.lock().live.as_ref().map(|live| live.generation)
	}

	pub fn snapshot(&self) -> PanelSnapshot {
		self.shared.snapshots.borrow().clone()
	}

	/// Receiver notified after every state change.
	pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
		self.shared.snapshots.subscribe()
	}

	pub fn dispatcher(&self) -> CommandDispatcher {
		CommandDispatcher {
			shared: Arc::clone(&self.shared),
		}
	}

	#[cfg(test)]
	fn deliver(&self, generation: u64, event: ChannelEvent) {
		self.shared.fold(generation, event);
	}
}

impl Drop for Shared {
	fn drop(&mut self) {
		if let Some(live) = self.inner.get_mut().live.take() {
			live.shutdown();
		}
	}
}

/// Writes control intents onto the open channel.
///
/// Intents are fire-and-forget: the scheduler's response, if any, arrives
/// later as a `scheduler_status` event. Nothing here touches derived state.
#[derive(Clone)]
pub struct CommandDispatcher {
	shared: Arc<Shared>,
}

impl CommandDispatcher {
	pub fn request_start(&self) {
		self.send(Intent::StartScheduler);
	}

	pub fn request_stop(&self) {
		self.send(Intent::StopScheduler);
	}

	fn send(&self, intent: Intent) {
		let inner = self.shared.inner.lock();
		let live = match (&inner.live, inner.phase) {
			(Some(live), ChannelPhase::Open) => live,
			_ => {
				debug!(target = "zombload.channel", %intent, phase = %inner.phase, "dropping intent: channel not open");
				return;
			}
		};
		if live.outbound.send(intent).is_err() {
			debug!(target = "zombload.channel", %intent, "dropping intent: transport gone");
		}
	}
}
