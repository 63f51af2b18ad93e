use std::path::PathBuf;

use clap::Parser;
use quire_runtime::Config;

#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(about = "Plays a story from the command line")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Story file: a TOML list of `[[passage]]` tables
	pub story: PathBuf,

	/// Passage to play first (defaults to the configured start passage)
	#[arg(long, short = 's')]
	pub start: Option<String>,

	/// Configuration file
	#[arg(long, short = 'c', value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Directory for persistent storage
	#[arg(long, value_name = "DIR")]
	pub storage_dir: Option<PathBuf>,

	/// Wrap macro output in debug views
	#[arg(long)]
	pub debug: bool,

	/// Print the text of the final passage instead of its HTML
	#[arg(long)]
	pub text: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

impl Cli {
	/// Applies command-line overrides on top of file configuration.
	pub fn apply(&self, config: &mut Config) {
		if let Some(start) = &self.start {
			config.passages.start.clone_from(start);
		}
		if let Some(dir) = &self.storage_dir {
			config.storage.dir = Some(dir.clone());
		}
		config.debug |= self.debug;
	}
}
