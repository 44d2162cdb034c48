use haven_domain::similarity::{self, ScoredRecord};

use crate::HavenService;

impl HavenService {
	/// Context block of corpus exchanges similar to `query`, or an empty string when retrieval
	/// is disabled or unavailable.
	pub async fn context_for(&self, query: &str) -> String {
		if !self.cfg.corpus.enabled || query.trim().is_empty() {
			return String::new();
		}

		let texts = vec![query.to_string()];
		let embedded = self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await;
		let vectors = match embedded {
			Ok(vectors) => vectors,
			Err(err) if err.is_config() => {
				tracing::warn!(error = %err, "Retrieval skipped; embedding is not configured.");

				return String::new();
			},
			Err(err) => {
				tracing::warn!(error = %err, "Query embedding failed; continuing without context.");

				return String::new();
			},
		};
		let Some(query_vector) = vectors.into_iter().next() else {
			return String::new();
		};
		let corpus = self.corpus().load();

		if corpus.is_empty() {
			tracing::warn!("Corpus is empty; no retrieved context.");

			return String::new();
		}

		let matches = similarity::top_k(&query_vector, corpus, self.cfg.corpus.top_k as usize);

		if let Some(best) = matches.first() {
			tracing::info!(tag = %best.record.tag, score = best.score, "Corpus match selected.");
		}

		format_context(&matches)
	}
}

/// Three lines per match, matches separated by a blank line.
pub fn format_context(matches: &[ScoredRecord<'_>]) -> String {
	matches
		.iter()
		.map(|scored| {
			format!(
				"Context Tag: [{}]\nSimilar Previous User Input: \"{}\" (Similarity: {:.2})\nVerified Therapeutic Responses: \"{}\"",
				scored.record.tag,
				scored.record.matched_pattern,
				scored.score,
				scored.record.responses.join(" | "),
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}
