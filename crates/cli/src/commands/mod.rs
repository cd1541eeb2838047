mod files;
mod profile;
mod scheduler;
mod session;
mod text;

use zombload::protocol::Intent;

use crate::cli::{Commands, FilesAction, ProfileAction, TextAction};
use crate::context::CommandContext;

pub async fn dispatch(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
	match command {
		Commands::Login { username, password } => session::login(ctx, &username, &password).await,
		Commands::Logout => session::logout(ctx).await,
		Commands::Status { live, timeout } => session::status(ctx, live, timeout).await,
		Commands::Watch { duration } => scheduler::watch(ctx, duration).await,
		Commands::Start { timeout } => scheduler::request(ctx, Intent::StartScheduler, timeout).await,
		Commands::Stop { timeout } => scheduler::request(ctx, Intent::StopScheduler, timeout).await,
		Commands::Profile { action } => match action {
			ProfileAction::Show { name } => profile::show(ctx, &name).await,
			ProfileAction::Save { name, from } => profile::save(ctx, &name, &from).await,
			ProfileAction::Add { name, client_secret } => profile::add(ctx, &name, &client_secret).await,
			ProfileAction::Delete { name } => profile::delete(ctx, &name).await,
			ProfileAction::Auth { name } => profile::auth(ctx, &name),
		},
		Commands::Files { action } => match action {
			FilesAction::List { profile } => files::list(ctx, &profile).await,
			FilesAction::Upload { profile, files, kind } => files::upload(ctx, &profile, &files, kind).await,
			FilesAction::Delete { profile, kind, file } => files::delete(ctx, &profile, kind, &file).await,
		},
		Commands::Text { action } => match action {
			TextAction::Get { profile, pool } => text::get(ctx, &profile, pool).await,
			TextAction::Set { profile, pool, file } => text::set(ctx, &profile, pool, file.as_deref()).await,
		},
	}
}
