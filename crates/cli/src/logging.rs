use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "zombload=info,info",
		_ => "zombload=debug,info",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(verbose > 1)
		.with_writer(std::io::stderr)
		.init();
}
