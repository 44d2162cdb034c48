use time::macros::datetime;

use haven_domain::{
	Role,
	history::{self, TurnRole},
	report::{self, Report},
	sentiment::{self, Trend, TrendPolicy},
	similarity::{self, EmbeddingRecord},
};

fn sample_vectors() -> Vec<Vec<f32>> {
	vec![
		vec![1.0, 0.0, 0.0],
		vec![0.3, -0.7, 2.5],
		vec![-4.0, 0.25, 1.0],
		vec![0.001, 0.002, 0.003],
		vec![9.5, 9.5, -9.5],
	]
}

fn corpus(vectors: &[Vec<f32>]) -> Vec<EmbeddingRecord> {
	vectors
		.iter()
		.enumerate()
		.map(|(index, vector)| EmbeddingRecord {
			text: format!("pattern {index}"),
			tag: format!("tag{index}"),
			responses: vec![format!("response {index}")],
			matched_pattern: format!("pattern {index}"),
			vector: vector.clone(),
		})
		.collect()
}

#[test]
fn self_similarity_is_one() {
	let extremes = [vec![1e-4, 0.0], vec![1e-20, 3e-20, 0.0], vec![1e20, 1e20], vec![3e38, -3e38]];

	for vector in sample_vectors().into_iter().chain(extremes) {
		let similarity =
			similarity::cosine_similarity(&vector, &vector).expect("Nonzero vector must compare.");

		assert!((similarity - 1.0).abs() < 1e-5, "Unexpected self similarity {similarity}.");
	}
}

#[test]
fn similarity_is_symmetric() {
	let vectors = sample_vectors();

	for lhs in &vectors {
		for rhs in &vectors {
			assert_eq!(
				similarity::cosine_similarity(lhs, rhs),
				similarity::cosine_similarity(rhs, lhs)
			);
		}
	}
}

#[test]
fn top_k_length_and_order() {
	let vectors = sample_vectors();
	let records = corpus(&vectors);
	let query = [0.5, -0.5, 1.0];

	for k in 0..=7 {
		let ranked = similarity::top_k(&query, &records, k);

		assert_eq!(ranked.len(), k.min(records.len()));

		for pair in ranked.windows(2) {
			assert!(pair[0].score >= pair[1].score, "Results must be sorted descending.");
		}
	}

	assert_eq!(similarity::top_k(&query, &records, similarity::DEFAULT_TOP_K).len(), 3);
}

#[test]
fn top_k_on_empty_corpus_is_empty() {
	assert!(similarity::top_k(&[1.0, 0.0], &[], 3).is_empty());
}

#[test]
fn sanitize_alternates_roles() {
	let logs: Vec<Vec<(Role, &str)>> = vec![
		vec![],
		vec![(Role::User, "a")],
		vec![(Role::Assistant, "a")],
		vec![(Role::User, "a"), (Role::User, "b"), (Role::Assistant, "c")],
		vec![(Role::Assistant, "a"), (Role::Assistant, "b"), (Role::User, "c"), (Role::User, "d")],
		vec![(Role::User, "a"), (Role::Assistant, "b"), (Role::User, "c")],
	];

	for log in logs {
		let ends_with_user = log.last().map(|(role, _)| *role == Role::User).unwrap_or(false);
		let turns = history::sanitize(log.iter().copied());

		assert_eq!(turns.is_empty(), log.is_empty());

		for pair in turns.windows(2) {
			assert_ne!(pair[0].role, pair[1].role, "Consecutive turns must alternate.");
		}

		if ends_with_user {
			assert_eq!(turns.last().map(|turn| turn.role), Some(TurnRole::Model));
		}
	}
}

#[test]
fn sanitize_merges_user_follow_ups() {
	let turns = history::sanitize([(Role::User, "I can't sleep."), (Role::User, "Again.")]);

	assert_eq!(turns.len(), 2);
	assert_eq!(turns[0].text, "I can't sleep.\n\n(Follow-up): Again.");
	assert_eq!(turns[1].text, history::MODEL_PLACEHOLDER);
}

#[test]
fn trend_classification_examples() {
	let policy = TrendPolicy::default();

	assert_eq!(sentiment::aggregate(&[0.2, 0.2, 0.8], &policy).trend, Trend::Improving);
	assert_eq!(sentiment::aggregate(&[0.8, 0.5, 0.2], &policy).trend, Trend::Declining);
	assert_eq!(sentiment::aggregate(&[0.5, 0.5, 0.5], &policy).trend, Trend::Stable);
	assert_eq!(sentiment::aggregate(&[], &policy).trend, Trend::Stable);
}

#[test]
fn aggregate_timeline_uses_signed_scale() {
	let aggregate = sentiment::aggregate(&[0.2, 0.2, 0.8], &TrendPolicy::default());
	let timeline = aggregate.timeline();

	assert_eq!(timeline.len(), 3);
	assert!((timeline[0].score + 0.6).abs() < 1e-5);
	assert_eq!(timeline[0].sentiment, "negative");
	assert!((timeline[2].score - 0.6).abs() < 1e-5);
	assert_eq!(timeline[2].sentiment, "positive");
}

#[test]
fn template_parses_as_report() {
	let raw = format!("```json\n{}\n```", report::report_template());
	let parsed = report::parse_report(&raw, Trend::Declining).expect("Template must parse.");

	assert_eq!(parsed.user_sentiment_overview.trend, Trend::Declining);
	assert_eq!(parsed.sentiment_timeline.len(), 3);
	assert!(parsed.metadata.recommended_follow_up);
}

#[test]
fn fallback_report_round_trips_through_schema() {
	let fallback = Report::fallback();
	let raw = serde_json::to_string(&fallback).expect("Fallback must serialize.");
	let parsed = report::parse_report(&raw, Trend::Improving).expect("Fallback must parse.");

	assert_eq!(parsed, fallback);
	assert!(fallback.validate().is_ok());
}

#[test]
fn missing_report_section_is_rejected() {
	let mut template = report::report_template();

	template.as_object_mut().expect("Template must be an object.").remove("metadata");

	assert!(report::parse_report(&template.to_string(), Trend::Stable).is_err());
}

#[test]
fn transcript_lines_carry_timestamp_and_role() {
	let transcript = report::render_transcript([
		(datetime!(2026-01-02 03:04:05 UTC), Role::User, "hello"),
		(datetime!(2026-01-02 03:04:09 UTC), Role::Assistant, "hi there"),
	]);

	assert_eq!(
		transcript,
		"[2026-01-02T03:04:05Z] USER: hello\n[2026-01-02T03:04:09Z] ASSISTANT: hi there"
	);
}
