use colored::Colorize;
use serde_json::json;
use zombload::{ChannelPhase, MarkerStore};

use crate::context::{CommandContext, wait_for};
use crate::output::{self, OutputFormat};

/// How long a live status probe waits for the first metrics push.
const METRICS_GRACE_SECS: u64 = 2;

pub async fn login(ctx: &CommandContext, username: &str, password: &str) -> anyhow::Result<()> {
	let mut sessions = ctx.sessions()?;
	sessions.login(username, password).await?;

	match ctx.format() {
		OutputFormat::Json => output::print_json(&json!({
			"authenticated": true,
			"url": ctx.config().base_url,
		})),
		OutputFormat::Text => {
			output::success(format!("Logged in to {}", ctx.config().base_url));
			Ok(())
		}
	}
}

/// Always succeeds locally; the remote logout is best effort.
pub async fn logout(ctx: &CommandContext) -> anyhow::Result<()> {
	let mut sessions = ctx.sessions()?;
	let was_logged_in = sessions.restore_session();
	let credentials = sessions.logout();
	if was_logged_in {
		sessions.invalidate_remote(&credentials).await;
	}

	match ctx.format() {
		OutputFormat::Json => output::print_json(&json!({ "authenticated": false })),
		OutputFormat::Text => {
			if was_logged_in {
				output::success("Logged out");
			} else {
				println!("Not logged in");
			}
			Ok(())
		}
	}
}

pub async fn status(ctx: &CommandContext, live: bool, timeout: u64) -> anyhow::Result<()> {
	let marker_path = ctx.config().marker_path();
	let authenticated = ctx.marker().load().is_some_and(|marker| marker.authenticated);

	let snapshot = if live {
		let panel = ctx.restored_panel()?;
		let mut updates = panel.subscribe();
		wait_for(&mut updates, "the channel to open", timeout, |s| s.phase == ChannelPhase::Open).await?;
		let _ = wait_for(&mut updates, "system stats", METRICS_GRACE_SECS, |s| s.metrics.is_some()).await;
		Some(panel.snapshot())
	} else {
		None
	};

	match ctx.format() {
		OutputFormat::Json => output::print_json(&json!({
			"url": ctx.config().base_url,
			"sessionFile": marker_path,
			"authenticated": authenticated,
			"channel": snapshot,
		})),
		OutputFormat::Text => {
			output::field("url", &ctx.config().base_url);
			output::field("session", if authenticated { "logged in".green() } else { "logged out".yellow() });
			output::field("file", marker_path.display());
			if let Some(snapshot) = &snapshot {
				output::print_snapshot(snapshot, OutputFormat::Text)?;
			}
			Ok(())
		}
	}
}
