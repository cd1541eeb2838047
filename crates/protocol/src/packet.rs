//! Engine.IO v4 / Socket.IO v5 text framing.
//!
//! The scheduler service speaks Socket.IO over a WebSocket. Every text frame is
//! an Engine.IO packet whose first character is the packet type; `message`
//! packets wrap a Socket.IO packet with its own type digit:
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000,..}   open
//! 2 / 3                                   ping / pong
//! 40                                      namespace connect (ack carries {"sid":..})
//! 41                                      namespace disconnect
//! 42["scheduler_status",{"running":true}] event
//! 44{"message":"unauthorized"}            connect error
//! ```
//!
//! Only the default namespace and text payloads are supported.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Framing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
	#[error("empty packet")]
	Empty,
	#[error("unknown {layer} packet type '{kind}'")]
	UnknownType { layer: &'static str, kind: char },
	#[error("unsupported packet: {0}")]
	Unsupported(String),
	#[error("malformed packet payload: {0}")]
	Malformed(String),
}

/// Handshake data sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
	pub sid: String,
	#[serde(default)]
	pub upgrades: Vec<String>,
	#[serde(default = "default_ping_interval")]
	pub ping_interval: u64,
	#[serde(default = "default_ping_timeout")]
	pub ping_timeout: u64,
	#[serde(default)]
	pub max_payload: Option<u64>,
}

fn default_ping_interval() -> u64 {
	25_000
}

fn default_ping_timeout() -> u64 {
	20_000
}

/// Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
	Open(OpenHandshake),
	Close,
	Ping,
	Pong,
	Message(SocketPacket),
	Upgrade,
	Noop,
}

/// Socket.IO packet carried inside an Engine.IO `message`.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
	Connect(Option<Value>),
	Disconnect,
	Event { name: String, payload: Option<Value> },
	Ack,
	ConnectError(Value),
}

impl Packet {
	/// Client namespace connect request for the default namespace.
	pub fn connect() -> Self {
		Self::Message(SocketPacket::Connect(None))
	}

	/// Event packet with an optional single argument.
	pub fn event(name: impl Into<String>, payload: Option<Value>) -> Self {
		Self::Message(SocketPacket::Event {
			name: name.into(),
			payload,
		})
	}

	/// Parses one text frame.
	pub fn decode(frame: &str) -> Result<Self, PacketError> {
		let mut chars = frame.chars();
		let kind = chars.next().ok_or(PacketError::Empty)?;
		let rest = chars.as_str();
		match kind {
			'0' => serde_json::from_str(rest)
				.map(Packet::Open)
				.map_err(|err| PacketError::Malformed(err.to_string())),
			'1' => Ok(Packet::Close),
			'2' => Ok(Packet::Ping),
			'3' => Ok(Packet::Pong),
			'4' => SocketPacket::decode(rest).map(Packet::Message),
			'5' => Ok(Packet::Upgrade),
			'6' => Ok(Packet::Noop),
			other => Err(PacketError::UnknownType {
				layer: "engine.io",
				kind: other,
			}),
		}
	}

	/// Serializes to a text frame.
	pub fn encode(&self) -> String {
		match self {
			Packet::Open(handshake) => format!("0{}", serde_json::to_string(handshake).unwrap_or_default()),
			Packet::Close => "1".to_string(),
			Packet::Ping => "2".to_string(),
			Packet::Pong => "3".to_string(),
			Packet::Message(inner) => format!("4{}", inner.encode()),
			Packet::Upgrade => "5".to_string(),
			Packet::Noop => "6".to_string(),
		}
	}
}

impl SocketPacket {
	fn decode(body: &str) -> Result<Self, PacketError> {
		let mut chars = body.chars();
		let kind = chars.next().ok_or(PacketError::Empty)?;
		let data = strip_namespace_and_ack(chars.as_str())?;
		match kind {
			'0' => Ok(SocketPacket::Connect(parse_optional_json(data)?)),
			'1' => Ok(SocketPacket::Disconnect),
			'2' => decode_event(data),
			'3' => Ok(SocketPacket::Ack),
			'4' => Ok(SocketPacket::ConnectError(parse_optional_json(data)?.unwrap_or(Value::Null))),
			'5' | '6' => Err(PacketError::Unsupported("binary attachments".to_string())),
			other => Err(PacketError::UnknownType {
				layer: "socket.io",
				kind: other,
			}),
		}
	}

	fn encode(&self) -> String {
		match self {
			SocketPacket::Connect(None) => "0".to_string(),
			SocketPacket::Connect(Some(auth)) => format!("0{auth}"),
			SocketPacket::Disconnect => "1".to_string(),
			SocketPacket::Event { name, payload } => {
				let mut args = vec![Value::String(name.clone())];
				if let Some(payload) = payload {
					args.push(payload.clone());
				}
				format!("2{}", Value::Array(args))
			}
			SocketPacket::Ack => "3[]".to_string(),
			SocketPacket::ConnectError(data) => format!("4{data}"),
		}
	}
}

/// Rejects non-default namespaces and skips an optional numeric ack id.
fn strip_namespace_and_ack(data: &str) -> Result<&str, PacketError> {
	let data = if let Some(rest) = data.strip_prefix('/') {
		match rest.split_once(',') {
			Some(("", tail)) => tail,
			Some((namespace, _)) => return Err(PacketError::Unsupported(format!("namespace /{namespace}"))),
			None if rest.is_empty() => "",
			None => return Err(PacketError::Unsupported(format!("namespace /{rest}"))),
		}
	} else {
		data
	};
	Ok(data.trim_start_matches(|c: char| c.is_ascii_digit()))
}

fn parse_optional_json(data: &str) -> Result<Option<Value>, PacketError> {
	if data.is_empty() {
		return Ok(None);
	}
	serde_json::from_str(data)
		.map(Some)
		.map_err(|err| PacketError::Malformed(err.to_string()))
}

fn decode_event(data: &str) -> Result<SocketPacket, PacketError> {
	let args: Vec<Value> = serde_json::from_str(data).map_err(|err| PacketError::Malformed(err.to_string()))?;
	let mut args = args.into_iter();
	let name = match args.next() {
		Some(Value::String(name)) => name,
		_ => return Err(PacketError::Malformed("event without a name".to_string())),
	};
	Ok(SocketPacket::Event { name, payload: args.next() })
}
