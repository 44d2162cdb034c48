use serde::Deserialize;

use crate::{
	Error, HavenService, Result,
	corpus::{CorpusEntry, CorpusMetadata},
};

pub const EMBED_BATCH_SIZE: usize = 10;

/// Source document for the corpus: intents with example user patterns and canned responses.
#[derive(Clone, Debug, Deserialize)]
pub struct IntentsDocument {
	pub intents: Vec<Intent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Intent {
	pub tag: String,
	#[serde(default)]
	pub patterns: Vec<String>,
	#[serde(default)]
	pub responses: Vec<String>,
}

impl HavenService {
	/// Embeds every non-blank pattern as one corpus entry. A batch the provider rejects is
	/// skipped; a missing embedding credential fails the whole run.
	pub async fn build_corpus(&self, intents: &IntentsDocument) -> Result<Vec<CorpusEntry>> {
		let pending = intents
			.intents
			.iter()
			.flat_map(|intent| {
				intent
					.patterns
					.iter()
					.map(|pattern| pattern.trim())
					.filter(|pattern| !pattern.is_empty())
					.map(move |pattern| (intent, pattern.to_string()))
			})
			.collect::<Vec<_>>();
		let mut entries = Vec::with_capacity(pending.len());

		for (batch_index, batch) in pending.chunks(EMBED_BATCH_SIZE).enumerate() {
			let texts = batch.iter().map(|(_, pattern)| pattern.clone()).collect::<Vec<_>>();
			let embedded =
				self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await;
			let vectors = match embedded {
				Ok(vectors) if vectors.len() == texts.len() => vectors,
				Ok(vectors) => {
					tracing::warn!(
						batch = batch_index,
						expected = texts.len(),
						received = vectors.len(),
						"Embedding batch size mismatch; skipping batch."
					);

					continue;
				},
				Err(err) if err.is_config() => return Err(Error::from(err)),
				Err(err) => {
					tracing::warn!(
						batch = batch_index,
						error = %err,
						"Embedding batch failed; skipping batch."
					);

					continue;
				},
			};

			for ((intent, pattern), embedding) in batch.iter().zip(vectors) {
				entries.push(CorpusEntry {
					text: pattern.clone(),
					metadata: CorpusMetadata {
						tag: intent.tag.clone(),
						responses: intent.responses.clone(),
						matched_pattern: pattern.clone(),
					},
					embedding,
				});
			}
		}

		tracing::info!(patterns = pending.len(), entries = entries.len(), "Corpus built.");

		Ok(entries)
	}
}
