use std::path::PathBuf;

use anyhow::anyhow;
use colored::Colorize;
use zombload::protocol::api::MediaKind;

use super::profile::report;
use crate::context::CommandContext;
use crate::output::{self, OutputFormat};

pub async fn list(ctx: &CommandContext, profile: &str) -> anyhow::Result<()> {
	let files = ctx.api()?.list_files(profile).await?;
	match ctx.format() {
		OutputFormat::Json => output::print_json(&files),
		OutputFormat::Text => {
			for kind in MediaKind::ALL {
				let names = files.files(kind);
				println!("{} ({})", kind.wire_name().bold(), names.len());
				for name in names {
					println!("  {name}");
				}
			}
			Ok(())
		}
	}
}

/// Uploads every file in order, stopping at the first failure.
pub async fn upload(ctx: &CommandContext, profile: &str, files: &[PathBuf], kind: Option<MediaKind>) -> anyhow::Result<()> {
	let api = ctx.api()?;
	for path in files {
		let kind = match kind.or_else(|| MediaKind::from_path(path)) {
			Some(kind) => kind,
			None => return Err(anyhow!("cannot tell the media kind of {}; pass --kind", path.display())),
		};
		let response = api.upload_file(profile, kind, path).await?;
		report(ctx, &response)?;
	}
	Ok(())
}

pub async fn delete(ctx: &CommandContext, profile: &str, kind: MediaKind, file: &str) -> anyhow::Result<()> {
	let response = ctx.api()?.delete_file(profile, file, kind).await?;
	report(ctx, &response)
}
