use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
	ParseError, Role,
	payload::strip_code_fences,
	sentiment::{Phase, Trend},
};

/// End-of-session report. Field names serialize in camelCase to match the stored document.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
	pub session_summary: SessionSummary,
	pub user_sentiment_overview: SentimentOverview,
	pub sentiment_timeline: Vec<SentimentTimelinePoint>,
	pub key_emotional_moments: Vec<KeyMoment>,
	pub detailed_analysis: String,
	pub personalized_tips: Vec<String>,
	pub final_assessment: String,
	pub metadata: ReportMetadata,
}
impl Report {
	/// Schema-valid report used when the generator cannot supply one.
	pub fn fallback() -> Self {
		Self {
			session_summary: SessionSummary {
				summary: "Session completed, but report generation failed.".to_string(),
				overall_tone: "Neutral".to_string(),
				ending_emotional_state: "Neutral".to_string(),
			},
			user_sentiment_overview: SentimentOverview {
				start: "Unknown".to_string(),
				middle: "Unknown".to_string(),
				end: "Unknown".to_string(),
				trend: Trend::Stable,
			},
			sentiment_timeline: Vec::new(),
			key_emotional_moments: Vec::new(),
			detailed_analysis: "Analysis unavailable due to an error.".to_string(),
			personalized_tips: vec!["Please try again later.".to_string()],
			final_assessment: "Session recorded.".to_string(),
			metadata: ReportMetadata {
				overall_sentiment: "neutral".to_string(),
				session_impact: "neutral".to_string(),
				dominant_emotions: Vec::new(),
				recommended_follow_up: false,
			},
		}
	}

	pub fn validate(&self) -> Result<(), ParseError> {
		if self.session_summary.summary.trim().is_empty() {
			return Err(ParseError::Invalid("Report summary is empty.".to_string()));
		}

		for point in &self.sentiment_timeline {
			if !point.score.is_finite() || !(-1.0..=1.0).contains(&point.score) {
				return Err(ParseError::Invalid(format!(
					"Timeline score {} is outside -1.0..=1.0.",
					point.score
				)));
			}
		}

		Ok(())
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
	pub summary: String,
	pub overall_tone: String,
	pub ending_emotional_state: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SentimentOverview {
	pub start: String,
	pub middle: String,
	pub end: String,
	pub trend: Trend,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SentimentTimelinePoint {
	pub phase: Phase,
	pub sentiment: String,
	/// In `[-1, 1]`.
	pub score: f32,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct KeyMoment {
	pub message: String,
	pub change: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
	pub overall_sentiment: String,
	pub session_impact: String,
	pub dominant_emotions: Vec<String>,
	pub recommended_follow_up: bool,
}

/// Parses generator output into a [`Report`].
///
/// A trend label the model phrased loosely is normalized; one that matches no trend is
/// replaced with `computed_trend`.
pub fn parse_report(raw: &str, computed_trend: Trend) -> Result<Report, ParseError> {
	let cleaned = strip_code_fences(raw);

	if cleaned.is_empty() {
		return Err(ParseError::Empty);
	}

	let mut value: Value = serde_json::from_str(&cleaned)?;

	if let Some(overview) =
		value.get_mut("userSentimentOverview").and_then(|overview| overview.as_object_mut())
	{
		let trend = overview
			.get("trend")
			.and_then(Value::as_str)
			.and_then(|label| label.parse::<Trend>().ok())
			.unwrap_or(computed_trend);

		overview.insert("trend".to_string(), Value::String(trend.as_str().to_string()));
	}

	let report: Report = serde_json::from_value(value)?;

	report.validate()?;

	Ok(report)
}

/// Renders `[timestamp] ROLE: content` lines in the given order.
pub fn render_transcript<'a, I>(messages: I) -> String
where
	I: IntoIterator<Item = (OffsetDateTime, Role, &'a str)>,
{
	messages
		.into_iter()
		.map(|(created_at, role, content)| {
			let stamp = created_at.format(&Rfc3339).unwrap_or_else(|_| created_at.to_string());

			format!("[{stamp}] {}: {content}", role.as_str().to_uppercase())
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// JSON shape the generator is asked to fill in.
pub fn report_template() -> Value {
	serde_json::json!({
		"sessionSummary": {
			"summary": "Concise summary (4-6 lines)",
			"overallTone": "Overall emotional tone",
			"endingEmotionalState": "How the user ended the session emotionally"
		},
		"userSentimentOverview": {
			"start": "Emotional state at START",
			"middle": "Emotional state at MIDDLE",
			"end": "Emotional state at END",
			"trend": "Improving / Declining / Fluctuating / Stable"
		},
		"sentimentTimeline": [
			{ "phase": "Start", "sentiment": "negative", "score": -0.6 },
			{ "phase": "Middle", "sentiment": "neutral", "score": 0.0 },
			{ "phase": "End", "sentiment": "positive", "score": 0.7 }
		],
		"keyEmotionalMoments": [
			{ "message": "Quote or summary of message", "change": "What emotion changed and why" }
		],
		"detailedAnalysis": "Detailed emotional trends, stress/relief/confidence patterns.",
		"personalizedTips": ["Tip 1", "Tip 2"],
		"finalAssessment": "Clear concluding paragraph.",
		"metadata": {
			"overallSentiment": "positive",
			"sessionImpact": "helpful",
			"dominantEmotions": ["emotion1", "emotion2"],
			"recommendedFollowUp": true
		}
	})
}
