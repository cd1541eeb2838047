//! Channel transports.
//!
//! A [`Connector`] turns session credentials into [`TransportParts`]: an
//! outbound intent queue, an inbound event stream, and a driver future that
//! performs the actual I/O (including its own reconnect backoff). The
//! supervisor spawns the driver and cancels the channel by dropping the
//! outbound sender, aborting the driver only if it lingers.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use zombload_protocol::{ChannelEvent, Intent};

use crate::auth::Credentials;
use crate::error::Result;

pub mod fake;
pub mod websocket;

pub use fake::{FakeConnector, FakeTransportController};
pub use websocket::WebSocketConnector;

/// Halves of one opened transport.
pub struct TransportParts {
	/// Fire-and-forget intent queue; never blocks the caller.
	pub outbound: mpsc::UnboundedSender<Intent>,
	/// Inbound events in transport delivery order.
	pub inbound: mpsc::UnboundedReceiver<ChannelEvent>,
	/// I/O loop; runs until the inbound receiver or outbound sender is dropped.
	pub driver: Box<dyn TransportDriver>,
}

pub trait TransportDriver: Send {
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Opens transports for the supervisor.
pub trait Connector: Send + Sync {
	fn connect(&self, credentials: &Credentials) -> TransportParts;
}

/// Exponential reconnect delay, doubling from `initial` up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
	initial: Duration,
	max: Duration,
}

impl Backoff {
	pub fn new(initial: Duration, max: Duration) -> Self {
		Self { initial, max }
	}

	pub fn initial(&self) -> Duration {
		self.initial
	}

	pub fn next(&self, current: Duration) -> Duration {
		current.saturating_mul(2).min(self.max)
	}
}

impl Default for Backoff {
	fn default() -> Self {
		Self::new(Duration::from_secs(1), Duration::from_secs(5))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backoff_doubles_up_to_max() {
		let backoff = Backoff::default();
		let mut delay = backoff.initial();
		let mut seen = Vec::new();
		for _ in 0..5 {
			seen.push(delay.as_millis());
			delay = backoff.next(delay);
		}
		assert_eq!(seen, [1000, 2000, 4000, 5000, 5000]);
	}
}
