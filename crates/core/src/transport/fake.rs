//! In-memory transport for exercising the supervisor without a backend.
//!
//! # Example
//!
//! ```ignore
//! let connector = Arc::new(FakeConnector::new().with_auto_connect());
//! let supervisor = ChannelSupervisor::new(connector.clone());
//! supervisor.reconcile(&session);
//!
//! let controller = connector.last().unwrap();
//! controller.inject_scheduler_status(true);
//! supervisor.dispatcher().request_stop();
//! assert_eq!(controller.take_sent().await, [Intent::StopScheduler]);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};
use zombload_protocol::{ChannelEvent, Intent, LogLine, SchedulerStatus, SystemStats};

use super::{Connector, TransportDriver, TransportParts};
use crate::auth::Credentials;
use crate::error::Result;

/// Connector handing out fake transports and remembering each one.
#[derive(Debug, Default)]
pub struct FakeConnector {
	auto_connect: bool,
	opened: parking_lot::Mutex<Vec<FakeTransportController>>,
}

impl FakeConnector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queue a `connect` event on every new transport, emulating an
	/// immediate handshake.
	pub fn with_auto_connect(mut self) -> Self {
		self.auto_connect = true;
		self
	}

	/// Number of transports opened so far.
	pub fn open_count(&self) -> usize {
		self.opened.lock().len()
	}

	/// Controller of the most recently opened transport.
	pub fn last(&self) -> Option<FakeTransportController> {
		self.opened.lock().last().cloned()
	}

	pub fn controllers(&self) -> Vec<FakeTransportController> {
		self.opened.lock().clone()
	}
}

impl Connector for FakeConnector {
	fn connect(&self, credentials: &Credentials) -> TransportParts {
		let (inject_tx, inject_rx) = mpsc::unbounded_channel();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let sent = Arc::new(Mutex::new(Vec::new()));
		let finished = Arc::new(AtomicBool::new(false));

		let controller = FakeTransportController {
			inject_tx,
			sent: Arc::clone(&sent),
			finished: Arc::clone(&finished),
			credentials: credentials.clone(),
		};
		if self.auto_connect {
			controller.inject_connect();
		}
		self.opened.lock().push(controller);

		let driver = FakeTransportDriver {
			inject_rx,
			inbound_tx,
			outbound_rx,
			sent,
			finished,
		};

		TransportParts {
			outbound: outbound_tx,
			inbound: inbound_rx,
			driver: Box::new(driver),
		}
	}
}

/// Handle for injecting events into, and inspecting intents sent over, one
/// fake transport.
#[derive(Debug, Clone)]
pub struct FakeTransportController {
	inject_tx: mpsc::UnboundedSender<ChannelEvent>,
	sent: Arc<Mutex<Vec<Intent>>>,
	finished: Arc<AtomicBool>,
	credentials: Credentials,
}

impl FakeTransportController {
	/// Simulates receiving an event from the server. Silently dropped once the
	/// transport has been torn down.
	pub fn inject(&self, event: ChannelEvent) {
		let _ = self.inject_tx.send(event);
	}

	pub fn inject_connect(&self) {
		self.inject(ChannelEvent::Connect);
	}

	pub fn inject_disconnect(&self) {
		self.inject(ChannelEvent::Disconnect);
	}

	pub fn inject_scheduler_status(&self, running: bool) {
		self.inject(ChannelEvent::SchedulerStatus(SchedulerStatus { running }));
	}

	pub fn inject_log(&self, line: impl Into<String>) {
		self.inject(ChannelEvent::NewLog(LogLine { data: line.into() }));
	}

	pub fn inject_stats(&self, cpu: f64, ram: f64) {
		self.inject(ChannelEvent::SystemStats(SystemStats { cpu, ram }));
	}

	/// Whether the supervisor has dropped this transport.
	pub fn is_closed(&self) -> bool {
		self.inject_tx.is_closed()
	}

	/// Whether the driver ran to completion rather than being aborted.
	pub fn driver_finished(&self) -> bool {
		self.finished.load(Ordering::Acquire)
	}

	/// Credentials the transport was opened with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Take all intents written so far, clearing the buffer.
	pub async fn take_sent(&self) -> Vec<Intent> {
		std::mem::take(&mut *self.sent.lock().await)
	}
}

struct FakeTransportDriver {
	inject_rx: mpsc::UnboundedReceiver<ChannelEvent>,
	inbound_tx: mpsc::UnboundedSender<ChannelEvent>,
	outbound_rx: mpsc::UnboundedReceiver<Intent>,
	sent: Arc<Mutex<Vec<Intent>>>,
	finished: Arc<AtomicBool>,
}

impl TransportDriver for FakeTransportDriver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			loop {
				tokio::select! {
					Some(event) = self.inject_rx.recv() => {
						if self.inbound_tx.send(event).is_err() {
							break;
						}
					}
					intent = self.outbound_rx.recv() => match intent {
						Some(intent) => self.sent.lock().await.push(intent),
						None => break,
					},
				}
			}
			self.finished.store(true, Ordering::Release);
			Ok(())
		})
	}
}
