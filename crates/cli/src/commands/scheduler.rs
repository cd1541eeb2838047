use std::time::Duration;

use serde_json::json;
use tracing::info;
use zombload::{ChannelPhase, Panel, PanelSnapshot};
use zombload::protocol::Intent;

use crate::context::{CommandContext, wait_for};
use crate::output::{self, OutputFormat};

/// Streams channel updates until Ctrl-C or `duration` elapses.
pub async fn watch(ctx: &CommandContext, duration: Option<u64>) -> anyhow::Result<()> {
	let panel = ctx.restored_panel()?;
	let mut updates = panel.subscribe();
	let mut previous = updates.borrow_and_update().clone();
	output::print_update(&output::Update::Phase { phase: previous.phase }, ctx.format())?;

	let elapsed = async {
		match duration {
			Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
			None => std::future::pending().await,
		}
	};
	let interrupted = tokio::signal::ctrl_c();
	tokio::pin!(elapsed, interrupted);

	loop {
		tokio::select! {
			changed = updates.changed() => {
				if changed.is_err() {
					break;
				}
				let current = updates.borrow_and_update().clone();
				for update in output::updates(&previous, &current) {
					output::print_update(&update, ctx.format())?;
				}
				previous = current;
			}
			_ = &mut interrupted => {
				info!(target = "zombload", "interrupted");
				break;
			}
			_ = &mut elapsed => break,
		}
	}
	Ok(())
}

/// Sends `intent` once the channel is open and waits for the scheduler's
/// next status report.
pub async fn request(ctx: &CommandContext, intent: Intent, timeout: u64) -> anyhow::Result<()> {
	let panel = ctx.restored_panel()?;
	let reported = send_and_await_report(&panel, intent, timeout).await?;

	match ctx.format() {
		OutputFormat::Json => output::print_json(&json!({
			"intent": intent.event_name(),
			"scheduler": reported.scheduler,
		})),
		OutputFormat::Text => {
			output::success(format!("Scheduler {}", output::scheduler(reported.scheduler)));
			Ok(())
		}
	}
}

/// Only a report folded after the intent goes out counts as the answer.
async fn send_and_await_report(panel: &Panel, intent: Intent, timeout: u64) -> anyhow::Result<PanelSnapshot> {
	let mut updates = panel.subscribe();
	wait_for(&mut updates, "the channel to open", timeout, |s| s.phase == ChannelPhase::Open).await?;

	let baseline = panel.snapshot().scheduler_reports;
	let dispatcher = panel.dispatcher();
	match intent {
		Intent::StartScheduler => dispatcher.request_start(),
		Intent::StopScheduler => dispatcher.request_stop(),
	}
	info!(target = "zombload", %intent, baseline, "intent sent");

	wait_for(&mut updates, "a scheduler status report", timeout, |s| {
		s.scheduler_reports > baseline
	})
	.await
}
