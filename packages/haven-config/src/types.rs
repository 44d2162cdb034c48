use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub corpus: Corpus,
	#[serde(default)]
	pub session: Session,
	#[serde(default)]
	pub mood: Mood,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub postgres: Option<Postgres>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Postgres,
	Memory,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: Option<u32>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl EmbeddingProviderConfig {
	pub fn api_key(&self) -> Result<&str> {
		require_key(&self.provider_id, &self.api_key)
	}
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl LlmProviderConfig {
	pub fn api_key(&self) -> Result<&str> {
		require_key(&self.provider_id, &self.api_key)
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Corpus {
	pub enabled: bool,
	pub path: PathBuf,
	pub top_k: u32,
}
impl Default for Corpus {
	fn default() -> Self {
		Self { enabled: true, path: PathBuf::from("rag/embeddings.json"), top_k: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
	/// Number of most recent prior messages replayed as chat turns.
	pub history_limit: u32,
	/// Minimum start/end phase delta, on the 0-1 sentiment scale, for a directional trend.
	pub trend_epsilon: f32,
	/// Population variance above which a non-directional session counts as fluctuating.
	pub fluctuation_variance: f32,
	/// Optional. Overrides `providers.generation.model` for end-of-session reports.
	pub report_model: Option<String>,
}
impl Default for Session {
	fn default() -> Self {
		Self {
			history_limit: 10,
			trend_epsilon: 0.1,
			fluctuation_variance: 0.04,
			report_model: None,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Mood {
	/// Offset of the calendar used for the one-entry-per-day rule.
	pub utc_offset_minutes: i32,
	/// Tried in order; the first model that answers wins.
	pub models: Vec<String>,
}
impl Default for Mood {
	fn default() -> Self {
		Self {
			utc_offset_minutes: 330,
			models: vec!["gemini-2.5-flash".to_string(), "gemini-3.0-pro".to_string()],
		}
	}
}

fn require_key<'a>(provider_id: &str, key: &'a str) -> Result<&'a str> {
	let trimmed = key.trim();

	if trimmed.is_empty() {
		return Err(Error::MissingCredential { provider: provider_id.to_string() });
	}

	Ok(trimmed)
}

fn default_timeout_ms() -> u64 {
	30_000
}
