use std::path::Path;

use anyhow::Context;
use serde_json::json;
use zombload::protocol::api::{ApiResponse, Profile};

use crate::context::CommandContext;
use crate::output::{self, OutputFormat};

pub async fn show(ctx: &CommandContext, name: &str) -> anyhow::Result<()> {
	let profile = ctx.api()?.get_profile(name).await?;
	match ctx.format() {
		OutputFormat::Json => output::print_json(&profile),
		OutputFormat::Text => {
			print_profile(name, &profile);
			Ok(())
		}
	}
}

pub async fn save(ctx: &CommandContext, name: &str, from: &Path) -> anyhow::Result<()> {
	let content = std::fs::read_to_string(from).with_context(|| format!("cannot read {}", from.display()))?;
	let profile: Profile = serde_json::from_str(&content).with_context(|| format!("{} is not a profile", from.display()))?;
	let response = ctx.api()?.save_profile(name, &profile).await?;
	report(ctx, &response)
}

pub async fn add(ctx: &CommandContext, name: &str, client_secret: &Path) -> anyhow::Result<()> {
	let response = ctx.api()?.add_profile(name, client_secret).await?;
	report(ctx, &response)
}

pub async fn delete(ctx: &CommandContext, name: &str) -> anyhow::Result<()> {
	let response = ctx.api()?.delete_profile(name).await?;
	report(ctx, &response)
}

pub fn auth(ctx: &CommandContext, name: &str) -> anyhow::Result<()> {
	let url = ctx.api()?.profile_auth_url(name)?;
	match ctx.format() {
		OutputFormat::Json => output::print_json(&json!({ "profile": name, "authUrl": url.as_str() })),
		OutputFormat::Text => {
			println!("Open this URL in a browser logged in to the panel:");
			println!("  {url}");
			Ok(())
		}
	}
}

pub(super) fn report(ctx: &CommandContext, response: &ApiResponse) -> anyhow::Result<()> {
	match ctx.format() {
		OutputFormat::Json => output::print_json(response),
		OutputFormat::Text => {
			output::success(&response.message);
			Ok(())
		}
	}
}

fn print_profile(name: &str, profile: &Profile) {
	let auth = match profile.auth_status.as_deref() {
		Some(status) if profile.is_authenticated() => status.to_string(),
		Some(status) => format!("{status} (run `zombload profile auth {name}`)"),
		None => "unknown".to_string(),
	};
	output::field("profile", name);
	output::field("auth", auth);
	output::field("category", &profile.category);
	output::field("start", &profile.start_time);
	output::field("slots", &profile.schedule_slots);
	output::field("videos", format!("{} per upload from {}", profile.num_video, profile.video_folder));
	output::field("audios", format!("{} per upload from {}", profile.num_audio, profile.audio_folder));
	output::field("thumbs", &profile.thumb_folder);
	output::field("output", &profile.output_folder);
	output::field("titles", &profile.title_file);
	output::field("desc", &profile.desc_file);
	output::field("monetize", if profile.monetization { "yes" } else { "no" });
}
