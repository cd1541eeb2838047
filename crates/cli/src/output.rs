//! Rendering of command results and live channel updates.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use zombload::protocol::SystemStats;
use zombload::{ChannelPhase, PanelSnapshot, SchedulerRunState};

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// JSON; `watch` emits one object per line
	Json,
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

pub fn success(message: impl AsRef<str>) {
	println!("{} {}", "✓".green().bold(), message.as_ref());
}

pub fn field(label: &str, value: impl std::fmt::Display) {
	println!("{:>10}: {value}", label.dimmed());
}

pub fn phase(phase: ChannelPhase) -> String {
	match phase {
		ChannelPhase::Open => phase.to_string().green().to_string(),
		ChannelPhase::Connecting => phase.to_string().yellow().to_string(),
		ChannelPhase::Unopened | ChannelPhase::Closed => phase.to_string().dimmed().to_string(),
	}
}

pub fn scheduler(state: SchedulerRunState) -> String {
	match state {
		SchedulerRunState::Running => state.to_string().green().bold().to_string(),
		SchedulerRunState::Stopped => state.to_string().red().to_string(),
	}
}

pub fn stats(stats: Option<SystemStats>) -> String {
	match stats {
		Some(SystemStats { cpu, ram }) => format!("cpu {cpu:.1}%  ram {ram:.1}%"),
		None => "-".dimmed().to_string(),
	}
}

/// One change between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
	Phase { phase: ChannelPhase },
	Scheduler { state: SchedulerRunState },
	Log { line: String },
	Stats { cpu: f64, ram: f64 },
}

/// Changes from `previous` to `current`, in a stable order.
pub fn updates(previous: &PanelSnapshot, current: &PanelSnapshot) -> Vec<Update> {
	let mut updates = Vec::new();
	if previous.phase != current.phase {
		updates.push(Update::Phase { phase: current.phase });
	}
	if previous.scheduler != current.scheduler || previous.scheduler_reports != current.scheduler_reports {
		updates.push(Update::Scheduler {
			state: current.scheduler,
		});
	}
	for line in current.logs_since(previous) {
		updates.push(Update::Log { line: line.clone() });
	}
	if let Some(SystemStats { cpu, ram }) = current.metrics.filter(|_| previous.metrics != current.metrics) {
		updates.push(Update::Stats { cpu, ram });
	}
	updates
}

pub fn print_update(update: &Update, format: OutputFormat) -> anyhow::Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string(update)?),
		OutputFormat::Text => match update {
			Update::Phase { phase: p } => println!("{} channel {}", "●".cyan(), phase(*p)),
			Update::Scheduler { state } => println!("{} scheduler {}", "●".cyan(), scheduler(*state)),
			Update::Log { line } => println!("{line}"),
			Update::Stats { cpu, ram } => println!(
				"{} {}",
				"●".cyan(),
				stats(Some(SystemStats { cpu: *cpu, ram: *ram })).dimmed()
			),
		},
	}
	Ok(())
}

pub fn print_snapshot(snapshot: &PanelSnapshot, format: OutputFormat) -> anyhow::Result<()> {
	match format {
		OutputFormat::Json => print_json(&json!({
			"phase": snapshot.phase,
			"connected": snapshot.connected,
			"scheduler": snapshot.scheduler,
			"metrics": snapshot.metrics,
			"logs": snapshot.logs,
		})),
		OutputFormat::Text => {
			field("channel", phase(snapshot.phase));
			field("scheduler", scheduler(snapshot.scheduler));
			field("system", stats(snapshot.metrics));
			if !snapshot.logs.is_empty() {
				field("logs", snapshot.logs.len());
				for line in &snapshot.logs {
					println!("  {line}");
				}
			}
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn snapshot() -> PanelSnapshot {
		PanelSnapshot {
			phase: ChannelPhase::Open,
			connected: true,
			..Default::default()
		}
	}

	#[test]
	fn reports_each_kind_of_change() {
		let before = snapshot();
		let after = PanelSnapshot {
			scheduler: SchedulerRunState::Running,
			scheduler_reports: 1,
			logs: vec!["a".to_string(), "b".to_string()],
			logs_received: 2,
			metrics: Some(SystemStats { cpu: 3.0, ram: 4.0 }),
			..snapshot()
		};

		assert_eq!(updates(&before, &after), [
			Update::Scheduler {
				state: SchedulerRunState::Running
			},
			Update::Log { line: "a".to_string() },
			Update::Log { line: "b".to_string() },
			Update::Stats { cpu: 3.0, ram: 4.0 },
		]);
		assert!(updates(&after, &after).is_empty());
	}

	#[test]
	fn repeated_status_is_still_reported() {
		let before = PanelSnapshot {
			scheduler_reports: 1,
			..snapshot()
		};
		let after = PanelSnapshot {
			scheduler_reports: 2,
			..snapshot()
		};
		assert_eq!(updates(&before, &after), [Update::Scheduler {
			state: SchedulerRunState::Stopped
		}]);
	}

	#[test]
	fn updates_serialize_tagged() {
		let value = serde_json::to_value(Update::Phase {
			phase: ChannelPhase::Connecting,
		})
		.unwrap();
		assert_eq!(value, json!({ "type": "phase", "phase": "connecting" }));
	}
}
