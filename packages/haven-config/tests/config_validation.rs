use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use haven_config::{Config, Error, StorageBackend};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(edit: impl FnOnce(&mut toml::Table)) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let root = value.as_table_mut().expect("Template config must be a table.");

	edit(root);

	toml::to_string(&value).expect("Failed to render template config.")
}

fn section<'a>(root: &'a mut toml::Table, path: &[&str]) -> &'a mut toml::Table {
	let mut table = root;

	for key in path {
		table = table
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	table
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("haven_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> haven_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = haven_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_message(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_payload(sample_toml_with(|_| {})).expect("Sample config must load.");

	assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
	assert_eq!(cfg.corpus.top_k, 3);
	assert_eq!(cfg.mood.utc_offset_minutes, 330);
	assert!(cfg.session.report_model.is_none(), "Blank report_model must normalize to None.");
	assert!(!cfg.providers.generation.api_base.ends_with('/'));
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let payload = sample_toml_with(|root| {
		root.remove("corpus");
		root.remove("session");
		root.remove("mood");
	});
	let cfg = load_payload(payload).expect("Config without optional sections must load.");

	assert!(cfg.corpus.enabled);
	assert_eq!(cfg.session.history_limit, 10);
	assert!((cfg.session.trend_epsilon - 0.1).abs() < f32::EPSILON);
	assert_eq!(cfg.mood.models.len(), 2);
}

#[test]
fn postgres_backend_requires_postgres_section() {
	let payload = sample_toml_with(|root| {
		section(root, &["storage"]).remove("postgres");
	});

	expect_validation_message(payload, "storage.postgres must be set");
}

#[test]
fn memory_backend_does_not_need_postgres() {
	let payload = sample_toml_with(|root| {
		let storage = section(root, &["storage"]);

		storage.remove("postgres");
		storage.insert("backend".to_string(), Value::String("memory".to_string()));
	});
	let cfg = load_payload(payload).expect("Memory backend config must load.");

	assert_eq!(cfg.storage.backend, StorageBackend::Memory);
	assert!(cfg.storage.postgres.is_none());
}

#[test]
fn timeout_must_be_bounded() {
	let payload = sample_toml_with(|root| {
		section(root, &["providers", "generation"])
			.insert("timeout_ms".to_string(), Value::Integer(0));
	});

	expect_validation_message(payload, "providers.generation.timeout_ms must be in the range");
}

#[test]
fn trend_epsilon_must_be_within_unit_range() {
	let payload = sample_toml_with(|root| {
		section(root, &["session"]).insert("trend_epsilon".to_string(), Value::Float(1.5));
	});

	expect_validation_message(payload, "session.trend_epsilon must be in the range 0.0-1.0.");
}

#[test]
fn mood_models_must_be_non_empty() {
	let payload = sample_toml_with(|root| {
		section(root, &["mood"]).insert("models".to_string(), Value::Array(Vec::new()));
	});

	expect_validation_message(payload, "mood.models must be non-empty.");
}

#[test]
fn blank_api_key_loads_but_reports_missing_credential() {
	let payload = sample_toml_with(|root| {
		section(root, &["providers", "embedding"])
			.insert("api_key".to_string(), Value::String("  ".to_string()));
	});
	let cfg = load_payload(payload).expect("Blank api_key must not fail config load.");
	let err = cfg.providers.embedding.api_key().expect_err("Expected missing credential.");

	assert!(matches!(err, Error::MissingCredential { ref provider } if provider == "gemini"));
	assert_eq!(cfg.providers.generation.api_key().expect("Key must be present."), "test-key");
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("haven_config_test_missing_file.toml");

	let err = haven_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
