//! Real-time channel event vocabulary.
//!
//! Event names are the bit-exact contract with the scheduler service. Inbound
//! events are folded into client-side state; outbound intents carry no payload
//! and no correlation id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport-level connect acknowledgement.
pub const EVENT_CONNECT: &str = "connect";
/// Transport-level disconnect.
pub const EVENT_DISCONNECT: &str = "disconnect";
/// Authoritative scheduler run state.
pub const EVENT_SCHEDULER_STATUS: &str = "scheduler_status";
/// One scheduler log line.
pub const EVENT_NEW_LOG: &str = "new_log";
/// Host resource metrics.
pub const EVENT_SYSTEM_STATS: &str = "system_stats";
/// Intent: start the scheduler.
pub const INTENT_START_SCHEDULER: &str = "start_scheduler";
/// Intent: stop the scheduler.
pub const INTENT_STOP_SCHEDULER: &str = "stop_scheduler";

/// Payload of `scheduler_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
	pub running: bool,
}

/// Payload of `new_log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
	pub data: String,
}

/// Payload of `system_stats`: CPU and RAM usage in percent (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
	pub cpu: f64,
	pub ram: f64,
}

/// Inbound event delivered by the channel transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
	Connect,
	Disconnect,
	SchedulerStatus(SchedulerStatus),
	NewLog(LogLine),
	SystemStats(SystemStats),
	/// An event name outside the supported vocabulary, or a known name whose
	/// payload did not match its schema. Ignored by consumers.
	Unknown(String),
}

impl ChannelEvent {
	/// Builds an event from its wire name and JSON payload.
	///
	/// Never fails: anything that cannot be interpreted becomes
	/// [`ChannelEvent::Unknown`] so newer backends stay compatible.
	pub fn from_wire(name: &str, payload: Option<Value>) -> Self {
		let payload = payload.unwrap_or(Value::Null);
		match name {
			EVENT_CONNECT => Self::Connect,
			EVENT_DISCONNECT => Self::Disconnect,
			EVENT_SCHEDULER_STATUS => serde_json::from_value(payload)
				.map(Self::SchedulerStatus)
				.unwrap_or_else(|_| Self::Unknown(name.to_string())),
			EVENT_NEW_LOG => serde_json::from_value(payload)
				.map(Self::NewLog)
				.unwrap_or_else(|_| Self::Unknown(name.to_string())),
			EVENT_SYSTEM_STATS => serde_json::from_value(payload)
				.map(Self::SystemStats)
				.unwrap_or_else(|_| Self::Unknown(name.to_string())),
			other => Self::Unknown(other.to_string()),
		}
	}

	/// Wire name of this event.
	pub fn name(&self) -> &str {
		match self {
			Self::Connect => EVENT_CONNECT,
			Self::Disconnect => EVENT_DISCONNECT,
			Self::SchedulerStatus(_) => EVENT_SCHEDULER_STATUS,
			Self::NewLog(_) => EVENT_NEW_LOG,
			Self::SystemStats(_) => EVENT_SYSTEM_STATS,
			Self::Unknown(name) => name,
		}
	}
}

/// Outbound control intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
	StartScheduler,
	StopScheduler,
}

impl Intent {
	pub fn event_name(self) -> &'static str {
		match self {
			Self::StartScheduler => INTENT_START_SCHEDULER,
			Self::StopScheduler => INTENT_STOP_SCHEDULER,
		}
	}
}

impl std::fmt::Display for Intent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.event_name())
	}
}
