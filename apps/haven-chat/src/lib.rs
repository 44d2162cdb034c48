pub mod commands;

use std::{io, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use haven_config::{Config, StorageBackend};
use haven_service::HavenService;
use haven_storage::{db::Db, memory::MemoryStore, store::Store};

#[derive(Debug, Parser)]
#[command(
	version = haven_cli::VERSION,
	rename_all = "kebab",
	styles = haven_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Identity the session and mood entries belong to.
	#[arg(long, value_name = "ID", default_value = "local")]
	pub user: String,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Start an interactive session; type `/end` to finish and print the report.
	Chat {
		#[arg(long, value_name = "TEXT")]
		mood: Option<String>,
	},
	/// Record today's mood check-in.
	Mood { text: String },
	/// List past sessions, newest first.
	History,
	/// Print the stored report of a completed session.
	Report { session_id: Uuid },
	/// Embed an intents file into a corpus file.
	Index { intents: PathBuf, out: PathBuf },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = haven_config::load(&args.config)?;

	init_tracing(&config);

	let store = open_store(&config).await?;
	let service = HavenService::new(config, store);

	match args.command {
		Command::Chat { mood } => commands::chat(&service, &args.user, mood.as_deref()).await,
		Command::Mood { text } => commands::mood(&service, &args.user, &text).await,
		Command::History => commands::history(&service, &args.user).await,
		Command::Report { session_id } => commands::report(&service, session_id).await,
		Command::Index { intents, out } => commands::index(&service, &intents, &out).await,
	}
}

async fn open_store(config: &Config) -> color_eyre::Result<Arc<dyn Store>> {
	match config.storage.backend {
		StorageBackend::Postgres => {
			let Some(postgres) = config.storage.postgres.as_ref() else {
				return Err(eyre::eyre!("storage.postgres is required for the postgres backend."));
			};
			let db = Db::connect(postgres).await?;

			db.ensure_schema().await?;

			Ok(Arc::new(db))
		},
		StorageBackend::Memory => {
			tracing::info!("Using in-memory storage; nothing is persisted.");

			Ok(Arc::new(MemoryStore::new()))
		},
	}
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}
