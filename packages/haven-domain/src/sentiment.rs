use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{UnknownVariant, payload::NEUTRAL_SCORE, report::SentimentTimelinePoint};

const LABEL_THRESHOLD: f32 = 0.2;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Phase {
	#[serde(alias = "start")]
	Start,
	#[serde(alias = "middle")]
	Middle,
	#[serde(alias = "end")]
	End,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Trend {
	Improving,
	Declining,
	Fluctuating,
	Stable,
}
impl Trend {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Improving => "Improving",
			Self::Declining => "Declining",
			Self::Fluctuating => "Fluctuating",
			Self::Stable => "Stable",
		}
	}
}
impl FromStr for Trend {
	type Err = UnknownVariant;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"improving" => Ok(Self::Improving),
			"declining" => Ok(Self::Declining),
			"fluctuating" => Ok(Self::Fluctuating),
			"stable" => Ok(Self::Stable),
			_ => Err(UnknownVariant { kind: "trend", value: value.to_string() }),
		}
	}
}
impl fmt::Display for Trend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy, Debug)]
pub struct TrendPolicy {
	pub epsilon: f32,
	pub fluctuation_variance: f32,
}
impl Default for TrendPolicy {
	fn default() -> Self {
		Self { epsilon: 0.1, fluctuation_variance: 0.04 }
	}
}

/// Phase averages on the 0-1 sentiment scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SentimentAggregate {
	pub start: f32,
	pub middle: f32,
	pub end: f32,
	pub trend: Trend,
	pub scored_turns: usize,
}
impl SentimentAggregate {
	pub fn phase_score(&self, phase: Phase) -> f32 {
		match phase {
			Phase::Start => self.start,
			Phase::Middle => self.middle,
			Phase::End => self.end,
		}
	}

	pub fn timeline(&self) -> Vec<SentimentTimelinePoint> {
		[Phase::Start, Phase::Middle, Phase::End]
			.into_iter()
			.map(|phase| {
				let score = to_signed(self.phase_score(phase));

				SentimentTimelinePoint { phase, sentiment: label_for(score).to_string(), score }
			})
			.collect()
	}
}

pub fn aggregate(scores: &[f32], policy: &TrendPolicy) -> SentimentAggregate {
	let (start, middle, end) = phase_averages(scores);
	let trend = classify_trend(start, end, scores, policy);

	SentimentAggregate { start, middle, end, trend, scored_turns: scores.len() }
}

pub fn classify_trend(start: f32, end: f32, scores: &[f32], policy: &TrendPolicy) -> Trend {
	if end - start >= policy.epsilon {
		return Trend::Improving;
	}
	if start - end >= policy.epsilon {
		return Trend::Declining;
	}
	if variance(scores) > policy.fluctuation_variance {
		return Trend::Fluctuating;
	}

	Trend::Stable
}

/// Maps a 0-1 score onto the report's -1..1 scale.
pub fn to_signed(score: f32) -> f32 {
	(score.clamp(0.0, 1.0) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

pub fn label_for(signed_score: f32) -> &'static str {
	if signed_score < -LABEL_THRESHOLD {
		"negative"
	} else if signed_score > LABEL_THRESHOLD {
		"positive"
	} else {
		"neutral"
	}
}

fn phase_averages(scores: &[f32]) -> (f32, f32, f32) {
	let n = scores.len();

	match n {
		0 => (NEUTRAL_SCORE, NEUTRAL_SCORE, NEUTRAL_SCORE),
		1 | 2 => {
			let nearest = |phase: usize| {
				let index = (phase as f32 * (n - 1) as f32 / 2.0).round() as usize;

				scores[index.min(n - 1)]
			};

			(nearest(0), nearest(1), nearest(2))
		},
		_ => {
			let first = (n + 1) / 3;
			let second = (2 * n + 1) / 3;

			(mean(&scores[..first]), mean(&scores[first..second]), mean(&scores[second..]))
		},
	}
}

fn mean(values: &[f32]) -> f32 {
	if values.is_empty() {
		return NEUTRAL_SCORE;
	}

	values.iter().sum::<f32>() / values.len() as f32
}

fn variance(values: &[f32]) -> f32 {
	if values.len() < 2 {
		return 0.0;
	}

	let avg = mean(values);

	values.iter().map(|value| (value - avg).powi(2)).sum::<f32>() / values.len() as f32
}
