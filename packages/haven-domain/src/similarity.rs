use std::cmp::Ordering;

pub const DEFAULT_TOP_K: usize = 3;

/// One corpus entry. Identified by its position in the loaded corpus.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingRecord {
	pub text: String,
	pub tag: String,
	pub responses: Vec<String>,
	pub matched_pattern: String,
	pub vector: Vec<f32>,
}

#[derive(Clone, Copy, Debug)]
pub struct ScoredRecord<'a> {
	pub index: usize,
	pub record: &'a EmbeddingRecord,
	pub score: f32,
}

/// Returns `None` when the similarity is undefined: empty or mismatched inputs, or a vector
/// with zero magnitude.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f64;
	let mut lhs_norm = 0.0_f64;
	let mut rhs_norm = 0.0_f64;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		let (l, r) = (f64::from(*l), f64::from(*r));

		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm == 0.0 || rhs_norm == 0.0 || !lhs_norm.is_finite() || !rhs_norm.is_finite() {
		return None;
	}

	let similarity = dot / (lhs_norm.sqrt() * rhs_norm.sqrt());

	similarity.is_finite().then(|| similarity.clamp(-1.0, 1.0) as f32)
}

/// Ranks `corpus` against `query`, best first.
///
/// Records whose similarity is undefined are never selected. Equal scores keep corpus order.
pub fn top_k<'a>(query: &[f32], corpus: &'a [EmbeddingRecord], k: usize) -> Vec<ScoredRecord<'a>> {
	if corpus.is_empty() || k == 0 {
		return Vec::new();
	}

	let mut scored: Vec<ScoredRecord<'a>> = corpus
		.iter()
		.enumerate()
		.filter_map(|(index, record)| {
			cosine_similarity(query, &record.vector)
				.map(|score| ScoredRecord { index, record, score })
		})
		.collect();

	scored.sort_by(|lhs, rhs| rhs.score.partial_cmp(&lhs.score).unwrap_or(Ordering::Equal));
	scored.truncate(k);

	scored
}

#[cfg(test)]
mod tests {
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
	fn zero_magnitude_is_undefined() {
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), None);
	}

	#[test]
	fn mismatched_lengths_are_undefined() {
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), None);
		assert_eq!(cosine_similarity(&[], &[]), None);
	}

	#[test]
	fn ties_keep_corpus_order() {
		let corpus = vec![
			record("first", vec![1.0, 0.0]),
			record("second", vec![2.0, 0.0]),
			record("third", vec![0.0, 1.0]),
		];
		let ranked = top_k(&[1.0, 0.0], &corpus, 3);
		let tags: Vec<&str> = ranked.iter().map(|scored| scored.record.tag.as_str()).collect();

		assert_eq!(tags, vec!["first", "second", "third"]);
		assert_eq!(ranked[0].index, 0);
		assert_eq!(ranked[1].index, 1);
	}

	#[test]
	fn zero_vectors_are_never_selected() {
		let corpus = vec![record("empty", vec![0.0, 0.0]), record("opposite", vec![-1.0, 0.0])];
		let ranked = top_k(&[1.0, 0.0], &corpus, 3);

		assert_eq!(ranked.len(), 1);
		assert_eq!(ranked[0].record.tag, "opposite");
		assert!((ranked[0].score + 1.0).abs() < 1e-6);
	}
}
