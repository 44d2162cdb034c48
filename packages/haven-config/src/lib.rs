mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Corpus, EmbeddingProviderConfig, LlmProviderConfig, Mood, Postgres, Providers,
	Service, Session, Storage, StorageBackend,
};

use std::{fs, path::Path};

const MAX_TIMEOUT_MS: u64 = 120_000;
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	match (cfg.storage.backend, cfg.storage.postgres.as_ref()) {
		(StorageBackend::Postgres, None) => {
			return Err(Error::Validation {
				message: "storage.postgres must be set when storage.backend is postgres."
					.to_string(),
			});
		},
		(StorageBackend::Postgres, Some(pg)) => {
			if pg.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if pg.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
		},
		(StorageBackend::Memory, _) => {},
	}

	if let Some(dimensions) = cfg.providers.embedding.dimensions
		&& dimensions == 0
	{
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("generation", cfg.providers.generation.timeout_ms),
	] {
		if timeout_ms == 0 || timeout_ms > MAX_TIMEOUT_MS {
			return Err(Error::Validation {
				message: format!(
					"providers.{label}.timeout_ms must be in the range 1-{MAX_TIMEOUT_MS}."
				),
			});
		}
	}
	for (label, model) in [
		("embedding", &cfg.providers.embedding.model),
		("generation", &cfg.providers.generation.model),
	] {
		if model.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.model must be non-empty."),
			});
		}
	}

	let temperature = cfg.providers.generation.temperature;

	if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.corpus.enabled && cfg.corpus.top_k == 0 {
		return Err(Error::Validation {
			message: "corpus.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.session.history_limit == 0 {
		return Err(Error::Validation {
			message: "session.history_limit must be greater than zero.".to_string(),
		});
	}
	if !cfg.session.trend_epsilon.is_finite() || !(0.0..=1.0).contains(&cfg.session.trend_epsilon)
	{
		return Err(Error::Validation {
			message: "session.trend_epsilon must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !cfg.session.fluctuation_variance.is_finite() || cfg.session.fluctuation_variance < 0.0 {
		return Err(Error::Validation {
			message: "session.fluctuation_variance must be zero or greater.".to_string(),
		});
	}
	if cfg.mood.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
		return Err(Error::Validation {
			message: "mood.utc_offset_minutes must be within +/-840.".to_string(),
		});
	}
	if cfg.mood.models.is_empty() {
		return Err(Error::Validation { message: "mood.models must be non-empty.".to_string() });
	}
	if cfg.mood.models.iter().any(|model| model.trim().is_empty()) {
		return Err(Error::Validation {
			message: "mood.models entries must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.session.report_model.as_deref().map(|model| model.trim().is_empty()).unwrap_or(false) {
		cfg.session.report_model = None;
	}

	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
	cfg.providers.generation.api_base =
		cfg.providers.generation.api_base.trim_end_matches('/').to_string();
}
