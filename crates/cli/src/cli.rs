use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zombload::protocol::api::{MediaKind, TextPool};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "zombload")]
#[command(about = "Zombload panel - control the upload scheduler from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Backend URL serving the API and the real-time channel
	#[arg(long, global = true, env = "ZOMBLOAD_URL")]
	pub url: Option<String>,

	/// Session marker file
	#[arg(long, global = true, value_name = "FILE", env = "ZOMBLOAD_SESSION_FILE")]
	pub session_file: Option<PathBuf>,

	/// JSON configuration file
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Log in and persist the session
	Login {
		#[arg(short, long, default_value = "admin")]
		username: String,
		#[arg(short, long, env = "ZOMBLOAD_PASSWORD", hide_env_values = true)]
		password: String,
	},

	/// Log out and forget the persisted session
	Logout,

	/// Show session state, optionally probing the live channel
	Status {
		/// Connect and report live scheduler state and metrics
		#[arg(long)]
		live: bool,
		/// Seconds to wait for the channel to open
		#[arg(long, default_value = "10")]
		timeout: u64,
	},

	/// Stream logs, metrics and scheduler state until interrupted
	Watch {
		/// Stop after this many seconds
		#[arg(long, value_name = "SECS")]
		duration: Option<u64>,
	},

	/// Ask the scheduler to start
	Start {
		/// Seconds to wait for the scheduler to report back
		#[arg(long, default_value = "10")]
		timeout: u64,
	},

	/// Ask the scheduler to stop
	Stop {
		/// Seconds to wait for the scheduler to report back
		#[arg(long, default_value = "10")]
		timeout: u64,
	},

	/// Upload profiles
	Profile {
		#[command(subcommand)]
		action: ProfileAction,
	},

	/// Media files of a profile
	Files {
		#[command(subcommand)]
		action: FilesAction,
	},

	/// Title and description pools of a profile
	Text {
		#[command(subcommand)]
		action: TextAction,
	},
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
	/// Print a profile
	Show { name: String },

	/// Replace a profile's settings from a JSON file
	Save {
		name: String,
		/// Profile JSON, as printed by `profile show -f json`
		#[arg(long, value_name = "FILE")]
		from: PathBuf,
	},

	/// Create a profile from an OAuth client secret
	Add {
		name: String,
		#[arg(long, value_name = "FILE")]
		client_secret: PathBuf,
	},

	/// Delete a profile
	Delete { name: String },

	/// Print the URL that starts the YouTube authorization flow
	Auth { name: String },
}

#[derive(Subcommand, Debug)]
pub enum FilesAction {
	/// List videos, audios and thumbnails
	List { profile: String },

	/// Upload files, inferring the kind from the extension unless given
	Upload {
		profile: String,
		#[arg(required = true)]
		files: Vec<PathBuf>,
		/// videos, audios or thumbs
		#[arg(long)]
		kind: Option<MediaKind>,
	},

	/// Delete one file
	Delete {
		profile: String,
		/// videos, audios or thumbs
		kind: MediaKind,
		file: String,
	},
}

#[derive(Subcommand, Debug)]
pub enum TextAction {
	/// Print a pool, one entry per line
	Get { profile: String, pool: TextPool },

	/// Replace a pool with the contents of a file (or stdin)
	Set {
		profile: String,
		pool: TextPool,
		#[arg(long, value_name = "FILE")]
		file: Option<PathBuf>,
	},
}
