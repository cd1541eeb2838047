//! Socket.IO over WebSocket transport.
//!
//! One driver owns one logical channel. It dials
//! `<base>/socket.io/?EIO=4&transport=websocket` with the session cookie,
//! answers heartbeats, translates frames into [`ChannelEvent`]s, and redials
//! with exponential backoff whenever the socket drops. `connect` is emitted
//! when the namespace handshake completes and `disconnect` when an
//! established socket is lost.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;
use zombload_protocol::{ChannelEvent, Intent, OpenHandshake, Packet, SocketPacket};

use super::{Backoff, Connector, TransportDriver, TransportParts};
use crate::auth::Credentials;
use crate::error::{Error, Result};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Heartbeat budget before the server's `open` packet tells us the real one.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(45);

/// Upper bound on the heartbeat budget a server can ask for.
const MAX_HEARTBEAT: Duration = Duration::from_secs(600);

/// Time allowed between server pings: interval plus timeout, capped.
fn heartbeat_budget(handshake: &OpenHandshake) -> Duration {
	Duration::from_millis(handshake.ping_interval.saturating_add(handshake.ping_timeout)).min(MAX_HEARTBEAT)
}

/// Opens Socket.IO channels against one backend origin.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
	endpoint: Url,
	backoff: Backoff,
}

impl WebSocketConnector {
	pub fn new(base_url: &Url, backoff: Backoff) -> Result<Self> {
		Ok(Self {
			endpoint: Self::endpoint_for(base_url)?,
			backoff,
		})
	}

	/// Maps an `http(s)` origin to its Socket.IO WebSocket endpoint.
	pub fn endpoint_for(base_url: &Url) -> Result<Url> {
		let mut endpoint = base_url.join("socket.io/")?;
		let scheme = match base_url.scheme() {
			"http" | "ws" => "ws",
			"https" | "wss" => "wss",
			other => return Err(Error::InvalidUrl(format!("unsupported scheme '{other}' for channel endpoint"))),
		};
		endpoint
			.set_scheme(scheme)
			.map_err(|_| Error::InvalidUrl(format!("cannot use {scheme} with {base_url}")))?;
		endpoint.set_query(Some("EIO=4&transport=websocket"));
		Ok(endpoint)
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}

impl Connector for WebSocketConnector {
	fn connect(&self, credentials: &Credentials) -> TransportParts {
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

		let driver = WebSocketDriver {
			endpoint: self.endpoint.clone(),
			cookie: credentials.cookie.clone(),
			backoff: self.backoff,
			outbound: outbound_rx,
			inbound: inbound_tx,
		};

		TransportParts {
			outbound: outbound_tx,
			inbound: inbound_rx,
			driver: Box::new(driver),
		}
	}
}

struct WebSocketDriver {
	endpoint: Url,
	cookie: Option<String>,
	backoff: Backoff,
	outbound: mpsc::UnboundedReceiver<Intent>,
	inbound: mpsc::UnboundedSender<ChannelEvent>,
}

/// Why one socket session ended.
enum SessionEnd {
	/// The owner dropped its side of the channel.
	Shutdown,
	/// The socket was lost; `established` tells whether the namespace
	/// handshake had completed.
	Lost { established: bool },
}

impl TransportDriver for WebSocketDriver {
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(self.run_loop())
	}
}

impl WebSocketDriver {
	async fn run_loop(mut self) -> Result<()> {
		let mut delay = self.backoff.initial();
		loop {
			if self.inbound.is_closed() {
				return Ok(());
			}

			match self.dial().await {
				Ok(socket) => match self.session(socket).await {
					SessionEnd::Shutdown => return Ok(()),
					SessionEnd::Lost { established } => {
						if established {
							delay = self.backoff.initial();
						}
					}
				},
				Err(err) => warn!(target = "zombload.transport", endpoint = %self.endpoint, error = %err, "channel connect failed"),
			}

			debug!(target = "zombload.transport", delay_ms = delay.as_millis() as u64, "reconnecting after delay");
			sleep(delay).await;
			delay = self.backoff.next(delay);
		}
	}

	async fn dial(&self) -> Result<Socket> {
		let mut request = self.endpoint.as_str().into_client_request()?;
		if let Some(cookie) = &self.cookie {
			let value = HeaderValue::from_str(cookie).map_err(|err| Error::ChannelTransport(format!("invalid session cookie: {err}")))?;
			request.headers_mut().insert(COOKIE, value);
		}
		let (socket, _response) = connect_async(request).await?;
		debug!(target = "zombload.transport", endpoint = %self.endpoint, "websocket established");
		Ok(socket)
	}

	async fn session(&mut self, socket: Socket) -> SessionEnd {
		let (mut sink, mut stream) = socket.split();

		// Intents are never buffered across a reconnect.
		let mut dropped = 0usize;
		while self.outbound.try_recv().is_ok() {
			dropped += 1;
		}
		if dropped > 0 {
			debug!(target = "zombload.transport", dropped, "discarded intents queued while offline");
		}

		let mut established = false;
		let mut heartbeat = HANDSHAKE_TIMEOUT;
		let mut deadline = Instant::now() + heartbeat;

		loop {
			tokio::select! {
				frame = stream.next() => {
					let text = match frame {
						Some(Ok(Message::Text(text))) => text,
						Some(Ok(Message::Close(_))) | None => break,
						Some(Ok(_)) => continue,
						Some(Err(err)) => {
							warn!(target = "zombload.transport", error = %err, "channel read failed");
							break;
						}
					};

					let packet = match Packet::decode(&text) {
						Ok(packet) => packet,
						Err(err) => {
							debug!(target = "zombload.transport", error = %err, frame = %text, "ignoring undecodable frame");
							continue;
						}
					};

					match packet {
						Packet::Open(handshake) => {
							heartbeat = heartbeat_budget(&handshake);
							deadline = Instant::now() + heartbeat;
							debug!(target = "zombload.transport", sid = %handshake.sid, "engine.io open");
							if sink.send(Message::Text(Packet::connect().encode())).await.is_err() {
								break;
							}
						}
						Packet::Ping => {
							deadline = Instant::now() + heartbeat;
							if sink.send(Message::Text(Packet::Pong.encode())).await.is_err() {
								break;
							}
						}
						Packet::Close | Packet::Message(SocketPacket::Disconnect) => {
							info!(target = "zombload.transport", "server closed the channel");
							break;
						}
						Packet::Message(SocketPacket::ConnectError(data)) => {
							warn!(target = "zombload.transport", error = %data, "channel connect rejected");
							break;
						}
						Packet::Message(SocketPacket::Connect(_)) => {
							established = true;
							if self.inbound.send(ChannelEvent::Connect).is_err() {
								return SessionEnd::Shutdown;
							}
						}
						Packet::Message(SocketPacket::Event { name, payload }) => {
							if self.inbound.send(ChannelEvent::from_wire(&name, payload)).is_err() {
								return SessionEnd::Shutdown;
							}
						}
						Packet::Pong | Packet::Upgrade | Packet::Noop | Packet::Message(SocketPacket::Ack) => {}
					}
				}
				intent = self.outbound.recv() => match intent {
					Some(intent) if established => {
						let frame = Packet::event(intent.event_name(), None).encode();
						if sink.send(Message::Text(frame)).await.is_err() {
							break;
						}
						debug!(target = "zombload.transport", %intent, "intent sent");
					}
					Some(intent) => debug!(target = "zombload.transport", %intent, "dropping intent before namespace connect"),
					None => {
						let _ = sink.send(Message::Text(Packet::Message(SocketPacket::Disconnect).encode())).await;
						let _ = sink.close().await;
						return SessionEnd::Shutdown;
					}
				},
				_ = sleep_until(deadline) => {
					warn!(target = "zombload.transport", timeout_ms = heartbeat.as_millis() as u64, "heartbeat timeout");
					break;
				}
			}
		}

		if established && self.inbound.send(ChannelEvent::Disconnect).is_err() {
			return SessionEnd::Shutdown;
		}
		SessionEnd::Lost { established }
	}
}
