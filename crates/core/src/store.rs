//! Event-derived state.
//!
//! Every field here is computed solely by folding inbound channel events; no
//! local command writes to it. Each event is folded independently, in arrival
//! order.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::trace;
use zombload_protocol::{ChannelEvent, SystemStats};

use crate::supervisor::ChannelPhase;

/// Maximum number of log lines retained.
pub const LOG_CAPACITY: usize = 100;

/// Last known remote scheduler state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerRunState {
	Running,
	#[default]
	Stopped,
}

impl SchedulerRunState {
	pub fn from_running(running: bool) -> Self {
		if running { Self::Running } else { Self::Stopped }
	}

	pub fn is_running(self) -> bool {
		self == Self::Running
	}
}

impl std::fmt::Display for SchedulerRunState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Self::Running => "running",
			Self::Stopped => "stopped",
		})
	}
}

/// Insertion-ordered log history holding the most recent [`LOG_CAPACITY`] lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBuffer {
	lines: VecDeque<String>,
}

impl LogBuffer {
	pub fn push(&mut self, line: String) {
		self.lines.push_back(line);
		while self.lines.len() > LOG_CAPACITY {
			self.lines.pop_front();
		}
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.lines.iter().map(String::as_str)
	}

	pub fn clear(&mut self) {
		self.lines.clear();
	}

	pub fn to_vec(&self) -> Vec<String> {
		self.lines.iter().cloned().collect()
	}
}

/// Reducers over the channel event vocabulary.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
	connected: bool,
	scheduler: SchedulerRunState,
	scheduler_reports: u64,
	logs: LogBuffer,
	logs_received: u64,
	metrics: Option<SystemStats>,
}

impl StateStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Folds one event. Returns `false` for events outside the vocabulary,
	/// which leave the state untouched.
	pub fn apply(&mut self, event: ChannelEvent) -> bool {
		match event {
			ChannelEvent::Connect => self.connected = true,
			// Run state, logs and metrics stay as "last known".
			ChannelEvent::Disconnect => self.connected = false,
			ChannelEvent::SchedulerStatus(status) => {
				self.scheduler = SchedulerRunState::from_running(status.running);
				self.scheduler_reports += 1;
			}
			ChannelEvent::NewLog(line) => {
				self.logs.push(line.data);
				self.logs_received += 1;
			}
			ChannelEvent::SystemStats(stats) => self.metrics = Some(stats),
			ChannelEvent::Unknown(name) => {
				trace!(target = "zombload.channel", event = %name, "ignoring unknown event");
				return false;
			}
		}
		true
	}

	/// Teardown reset: disconnected, no logs, no metrics, scheduler stopped.
	pub fn reset(&mut self) {
		*self = Self::default();
	}

	pub fn connected(&self) -> bool {
		self.connected
	}

	pub fn scheduler(&self) -> SchedulerRunState {
		self.scheduler
	}

	pub fn logs(&self) -> &LogBuffer {
		&self.logs
	}

	pub fn metrics(&self) -> Option<SystemStats> {
		self.metrics
	}

	pub fn snapshot(&self, phase: ChannelPhase) -> PanelSnapshot {
		PanelSnapshot {
			phase,
			connected: self.connected,
			scheduler: self.scheduler,
			scheduler_reports: self.scheduler_reports,
			logs: self.logs.to_vec(),
			logs_received: self.logs_received,
			metrics: self.metrics,
		}
	}
}

/// Read-only view of the derived state handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PanelSnapshot {
	pub phase: ChannelPhase,
	pub connected: bool,
	pub scheduler: SchedulerRunState,
	/// `scheduler_status` events folded since the channel opened.
	pub scheduler_reports: u64,
	pub logs: Vec<String>,
	/// Log lines received since the channel opened, including evicted ones.
	pub logs_received: u64,
	pub metrics: Option<SystemStats>,
}

impl PanelSnapshot {
	/// Lines that arrived after `previous` was taken, oldest first.
	///
	/// Bounded by what the buffer still holds.
	pub fn logs_since(&self, previous: &PanelSnapshot) -> &[String] {
		let fresh = self.logs_received.saturating_sub(previous.logs_received);
		let fresh = usize::try_from(fresh).unwrap_or(usize::MAX).min(self.logs.len());
		&self.logs[self.logs.len() - fresh..]
	}
}
