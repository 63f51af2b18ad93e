//! `quire`: plays a story file and prints the final passage.
//!
//! Deferred macro work runs on the tokio clock until the task queue drains,
//! so `<<done>>` and `<<goto>>` take effect before output is printed.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use quire_runtime::{Config, Runtime, Story};
use quire_storage::{FileAdapter, SimpleStore, Store, WebStorageAdapter};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::Cli;

fn main() -> Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let output = run(&cli)?;
	println!("{output}");
	Ok(())
}

fn setup_tracing(verbose: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("quire=trace,debug")
		} else {
			EnvFilter::new("quire=debug,info")
		}
	});

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
		.init();
}

/// Loads the story, plays the start passage, drains deferred work, and
/// returns the rendered container.
fn run(cli: &Cli) -> Result<String> {
	let mut config = match &cli.config {
		Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
		None => Config::default(),
	};
	cli.apply(&mut config);

	let story = Story::load(&cli.story).with_context(|| format!("loading story {}", cli.story.display()))?;
	tracing::info!(passages = story.len(), start = %config.passages.start, "quire.story");

	let store = open_storage(&config);
	let mut rt = Runtime::new(config, story)?;
	match store {
		Ok(store) => {
			rt.attach_storage(store);
		}
		Err(e) => tracing::warn!(error = %e, "quire.storage_unavailable"),
	}

	rt.start()?;

	let driver = tokio::runtime::Builder::new_current_thread()
		.enable_time()
		.build()
		.context("building tokio runtime")?;
	let report = driver.block_on(rt.run_realtime());
	tracing::debug!(completed = report.completed(), "quire.drained");

	for error in rt.take_deferred_errors() {
		eprintln!("error: {error}");
	}

	Ok(if cli.text { rt.text() } else { rt.html() })
}

/// Binds the first usable adapter: files when a directory is configured,
/// then in-memory web storage.
fn open_storage(config: &Config) -> Result<Box<dyn Store>, quire_storage::StoreError> {
	let mut simple = SimpleStore::new();
	if let Some(dir) = &config.storage.dir {
		simple = simple.with_adapter(FileAdapter::new(dir));
	}
	simple
		.with_adapter(WebStorageAdapter::in_memory())
		.create(&config.storage.id, true)
}
