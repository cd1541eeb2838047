use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde_json::json;
use zombload::protocol::api::TextPool;

use super::profile::report;
use crate::context::CommandContext;
use crate::output::{self, OutputFormat};

pub async fn get(ctx: &CommandContext, profile: &str, pool: TextPool) -> anyhow::Result<()> {
	let content = ctx.api()?.get_text_file(profile, pool).await?;
	match ctx.format() {
		OutputFormat::Json => output::print_json(&json!({ "pool": pool.wire_name(), "content": content })),
		OutputFormat::Text => {
			print!("{content}");
			if !content.is_empty() && !content.ends_with('\n') {
				println!();
			}
			Ok(())
		}
	}
}

pub async fn set(ctx: &CommandContext, profile: &str, pool: TextPool, file: Option<&Path>) -> anyhow::Result<()> {
	let api = ctx.api()?;
	let content = match file {
		Some(path) => std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?,
		None => {
			let mut buffer = String::new();
			std::io::stdin().read_to_string(&mut buffer).context("cannot read stdin")?;
			buffer
		}
	};
	let response = api.save_text_file(profile, pool, &content).await?;
	report(ctx, &response)
}
