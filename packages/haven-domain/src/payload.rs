use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

pub const NEUTRAL_SCORE: f32 = 0.5;
pub const NEUTRAL_EMOTION: &str = "neutral";

static CODE_FENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"```[A-Za-z]*").ok());

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("Generator output is empty.")]
	Empty,
	#[error("Generator output is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("{0}")]
	Invalid(String),
}

/// What the generator is asked to return for every chat turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnPayload {
	pub response: String,
	/// In `[0, 1]`.
	pub sentiment_score: f32,
	pub emotion: String,
}
impl TurnPayload {
	/// Treats the whole generator output as the reply, with neutral sentiment.
	pub fn from_raw_text(raw: &str) -> Self {
		Self {
			response: raw.trim().to_string(),
			sentiment_score: NEUTRAL_SCORE,
			emotion: NEUTRAL_EMOTION.to_string(),
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTurnPayload {
	#[serde(alias = "responseText")]
	response: String,
	sentiment_score: Option<f64>,
	#[serde(alias = "emotionLabel")]
	emotion: Option<String>,
}

/// Removes markdown code fences (with or without a language tag) and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
	match CODE_FENCE.as_ref() {
		Some(re) => re.replace_all(raw, "").trim().to_string(),
		None => raw.replace("```", "").trim().to_string(),
	}
}

pub fn parse_turn_payload(raw: &str) -> Result<TurnPayload, ParseError> {
	let cleaned = strip_code_fences(raw);

	if cleaned.is_empty() {
		return Err(ParseError::Empty);
	}

	let wire: WireTurnPayload = serde_json::from_str(&cleaned)?;
	let response = wire.response.trim();

	if response.is_empty() {
		return Err(ParseError::Invalid("Turn payload response is empty.".to_string()));
	}

	let sentiment_score = wire
		.sentiment_score
		.map(|score| (score as f32).clamp(0.0, 1.0))
		.unwrap_or(NEUTRAL_SCORE);
	let emotion = wire
		.emotion
		.map(|label| label.trim().to_lowercase())
		.filter(|label| !label.is_empty())
		.unwrap_or_else(|| NEUTRAL_EMOTION.to_string());

	Ok(TurnPayload { response: response.to_string(), sentiment_score, emotion })
}
