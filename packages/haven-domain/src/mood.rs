use serde::Deserialize;
use serde_json::Value;
use time::{Date, OffsetDateTime, UtcOffset, error::ComponentRange};

use crate::{ParseError, payload::strip_code_fences};

pub const DEFAULT_SUPPORTIVE_TEXT: &str = "Thanks for sharing. Be kind to yourself.";
pub const DEFAULT_MOOD_SCORE: u8 = 3;
pub const DEFAULT_SCORE_CONFIDENCE: f32 = 0.5;
pub const MIN_MOOD_SCORE: u8 = 1;
pub const MAX_MOOD_SCORE: u8 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct MoodAnalysis {
	pub supportive_text: String,
	/// 1 (very negative) to 5 (very positive).
	pub mood_score: u8,
	pub score_confidence: f32,
}
impl Default for MoodAnalysis {
	fn default() -> Self {
		Self {
			supportive_text: DEFAULT_SUPPORTIVE_TEXT.to_string(),
			mood_score: DEFAULT_MOOD_SCORE,
			score_confidence: DEFAULT_SCORE_CONFIDENCE,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMoodAnalysis {
	quote: Option<String>,
	author: Option<String>,
	sentiment_score: Option<f64>,
	sentiment_confidence: Option<f64>,
}

pub fn fixed_offset(utc_offset_minutes: i32) -> Result<UtcOffset, ComponentRange> {
	UtcOffset::from_whole_seconds(utc_offset_minutes * 60)
}

/// Calendar day of `now` in the given fixed offset.
pub fn local_day(now: OffsetDateTime, offset: UtcOffset) -> Date {
	now.to_offset(offset).date()
}

pub fn credits_for_score(score: u8) -> u32 {
	match score {
		2 => 1,
		3 | 4 => 3,
		5 => 5,
		_ => 0,
	}
}

/// Parses the mood check-in answer. Fields the model left out keep their defaults.
pub fn parse_mood_analysis(raw: &str) -> Result<MoodAnalysis, ParseError> {
	let cleaned = strip_code_fences(raw);

	if cleaned.is_empty() {
		return Err(ParseError::Empty);
	}

	let wire: WireMoodAnalysis = serde_json::from_str(&cleaned)?;
	let mut analysis = MoodAnalysis::default();

	if let (Some(quote), Some(author)) = (wire.quote.as_deref(), wire.author.as_deref())
		&& !quote.trim().is_empty()
		&& !author.trim().is_empty()
	{
		analysis.supportive_text = format!("\"{}\" — {}", quote.trim(), author.trim());
	}
	if let Some(score) = wire.sentiment_score.filter(|score| score.is_finite()) {
		analysis.mood_score =
			score.round().clamp(MIN_MOOD_SCORE as f64, MAX_MOOD_SCORE as f64) as u8;
	}
	if let Some(confidence) = wire.sentiment_confidence.filter(|value| value.is_finite()) {
		analysis.score_confidence = (confidence as f32).clamp(0.0, 1.0);
	}

	Ok(analysis)
}

/// Structured-output schema sent with the mood check-in request.
pub fn mood_schema() -> Value {
	serde_json::json!({
		"type": "object",
		"properties": {
			"quote": {
				"type": "string",
				"description": "A famous quote matching the mood."
			},
			"author": {
				"type": "string",
				"description": "The author of the quote."
			},
			"sentimentScore": {
				"type": "number",
				"description": "Sentiment score from 1 (very negative) to 5 (very positive)."
			},
			"sentimentConfidence": {
				"type": "number",
				"description": "Confidence of the sentiment analysis from 0.0 to 1.0."
			}
		},
		"required": ["quote", "author", "sentimentScore", "sentimentConfidence"]
	})
}

#[cfg(test)]
mod tests {
	use time::macros::{date, datetime};

	use super::*;

	#[test]
	fn late_utc_evening_is_next_day_in_positive_offset() {
		let offset = fixed_offset(330).expect("offset");
		let day = local_day(datetime!(2026-03-01 20:00 UTC), offset);

		assert_eq!(day, date!(2026-03-02));
	}

	#[test]
	fn credits_follow_score_table() {
		let credits: Vec<u32> = (0..=6).map(credits_for_score).collect();

		assert_eq!(credits, vec![0, 0, 1, 3, 3, 5, 0]);
	}

	#[test]
	fn quote_without_author_keeps_default_text() {
		let analysis =
			parse_mood_analysis(r#"{"quote": "Keep going.", "sentimentScore": 4.6}"#).expect("parse");

		assert_eq!(analysis.supportive_text, DEFAULT_SUPPORTIVE_TEXT);
		assert_eq!(analysis.mood_score, 5);
		assert_eq!(analysis.score_confidence, DEFAULT_SCORE_CONFIDENCE);
	}

	#[test]
	fn score_is_clamped_into_range() {
		let analysis = parse_mood_analysis(
			r#"{"quote": "Q", "author": "A", "sentimentScore": -3, "sentimentConfidence": 2}"#,
		)
		.expect("parse");

		assert_eq!(analysis.supportive_text, "\"Q\" — A");
		assert_eq!(analysis.mood_score, MIN_MOOD_SCORE);
		assert_eq!(analysis.score_confidence, 1.0);
	}
}
