//! The fixed retrieval corpus: a JSON file of embedded example exchanges, read once per
//! [`CorpusStore`] and cached for its lifetime.

use std::{
	fs,
	path::{Path, PathBuf},
	sync::OnceLock,
};

use serde::{Deserialize, Serialize};

use haven_domain::similarity::EmbeddingRecord;

/// One element of the corpus file.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CorpusEntry {
	pub text: String,
	pub metadata: CorpusMetadata,
	pub embedding: Vec<f32>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CorpusMetadata {
	pub tag: String,
	#[serde(default)]
	pub responses: Vec<String>,
	pub matched_pattern: String,
}

impl From<CorpusEntry> for EmbeddingRecord {
	fn from(entry: CorpusEntry) -> Self {
		Self {
			text: entry.text,
			tag: entry.metadata.tag,
			responses: entry.metadata.responses,
			matched_pattern: entry.metadata.matched_pattern,
			vector: entry.embedding,
		}
	}
}

pub struct CorpusStore {
	path: PathBuf,
	records: OnceLock<Vec<EmbeddingRecord>>,
}
impl CorpusStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), records: OnceLock::new() }
	}

	/// A store that never touches the filesystem.
	pub fn from_records(records: Vec<EmbeddingRecord>) -> Self {
		let records = retain_consistent_dimensions(records);

		Self { path: PathBuf::new(), records: OnceLock::from(records) }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn is_loaded(&self) -> bool {
		self.records.get().is_some()
	}

	/// Cached records. The first call reads the file; a missing or malformed file caches an
	/// empty corpus.
	pub fn load(&self) -> &[EmbeddingRecord] {
		self.records.get_or_init(|| read_corpus(&self.path))
	}
}

fn read_corpus(path: &Path) -> Vec<EmbeddingRecord> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) => {
			tracing::error!(path = %path.display(), error = %err, "Failed to read corpus file.");

			return Vec::new();
		},
	};
	let entries: Vec<CorpusEntry> = match serde_json::from_str(&raw) {
		Ok(entries) => entries,
		Err(err) => {
			tracing::error!(path = %path.display(), error = %err, "Failed to parse corpus file.");

			return Vec::new();
		},
	};
	let records =
		retain_consistent_dimensions(entries.into_iter().map(EmbeddingRecord::from).collect());

	tracing::info!(path = %path.display(), records = records.len(), "Corpus loaded.");

	records
}

/// Drops records whose dimensionality differs from the first record's.
pub fn retain_consistent_dimensions(records: Vec<EmbeddingRecord>) -> Vec<EmbeddingRecord> {
	let Some(expected) = records.first().map(|record| record.vector.len()) else {
		return records;
	};
	let before = records.len();
	let kept = records
		.into_iter()
		.filter(|record| record.vector.len() == expected)
		.collect::<Vec<_>>();

	if kept.len() != before {
		tracing::warn!(
			expected,
			dropped = before - kept.len(),
			"Dropped corpus records with mismatched dimensions."
		);
	}

	kept
}

#[cfg(test)]
mod tests {
	use std::env;

	use super::*;

	fn record(tag: &str, vector: Vec<f32>) -> EmbeddingRecord {
		EmbeddingRecord {
			text: tag.to_string(),
			tag: tag.to_string(),
			responses: Vec::new(),
			matched_pattern: tag.to_string(),
			vector,
		}
	}

	#[test]
	fn mismatched_dimensions_are_dropped() {
		let kept = retain_consistent_dimensions(vec![
			record("a", vec![1.0, 0.0]),
			record("b", vec![1.0, 0.0, 0.0]),
			record("c", vec![0.0, 1.0]),
		]);
		let tags = kept.iter().map(|record| record.tag.as_str()).collect::<Vec<_>>();

		assert_eq!(tags, vec!["a", "c"]);
	}

	#[test]
	fn missing_file_caches_empty_corpus() {
		let path = env::temp_dir().join(format!("haven_missing_{}.json", std::process::id()));
		let store = CorpusStore::new(&path);

		assert!(!store.is_loaded());
		assert!(store.load().is_empty());
		assert!(store.is_loaded());
	}

	#[test]
	fn file_is_read_once() {
		let path = env::temp_dir().join(format!("haven_corpus_{}.json", std::process::id()));
		let body = serde_json::json!([
			{
				"text": "I feel alone",
				"metadata": {
					"tag": "loneliness",
					"responses": ["You are not alone."],
					"matched_pattern": "I feel alone"
				},
				"embedding": [0.1, 0.2, 0.3]
			}
		]);

		fs::write(&path, body.to_string()).expect("write corpus");

		let store = CorpusStore::new(&path);

		assert_eq!(store.load().len(), 1);

		fs::remove_file(&path).expect("remove corpus");

		assert_eq!(store.load().len(), 1);
		assert_eq!(store.load()[0].tag, "loneliness");
	}
}
