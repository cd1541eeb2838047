use clap::Parser;
use tracing::error;
use zombload_cli::cli::Cli;
use zombload_cli::context::CommandContext;
use zombload_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let result = match CommandContext::new(&cli) {
		Ok(ctx) => commands::dispatch(cli.command, &ctx).await,
		Err(err) => Err(err.into()),
	};

	if let Err(err) = result {
		error!(target = "zombload", error = %format!("{err:#}"), "command failed");
		std::process::exit(1);
	}
}
