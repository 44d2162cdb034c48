use time::OffsetDateTime;
use uuid::Uuid;

use haven_domain::mood::{self, MoodAnalysis};
use haven_providers::generation::GenerationRequest;
use haven_storage::models::MoodEntry;

use crate::{Error, HavenService, Result, prompts};

#[derive(Clone, Debug)]
pub struct MoodCheckIn {
	pub entry: MoodEntry,
	/// Model that produced the analysis; `None` when defaults were used.
	pub model: Option<String>,
}

impl HavenService {
	pub async fn submit_mood(&self, user_id: &str, mood_text: &str) -> Result<MoodCheckIn> {
		self.submit_mood_at(user_id, mood_text, OffsetDateTime::now_utc()).await
	}

	/// Records the user's mood for the calendar day of `now` in the configured offset. One entry
	/// per user and day.
	pub async fn submit_mood_at(
		&self,
		user_id: &str,
		mood_text: &str,
		now: OffsetDateTime,
	) -> Result<MoodCheckIn> {
		let user_id = user_id.trim();
		let mood_text = mood_text.trim();

		if user_id.is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must not be empty.".to_string() });
		}
		if mood_text.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Mood text must not be empty.".to_string(),
			});
		}

		let offset = mood::fixed_offset(self.cfg.mood.utc_offset_minutes).map_err(|err| {
			Error::Config { message: format!("mood.utc_offset_minutes is out of range: {err}.") }
		})?;
		let day = mood::local_day(now, offset);

		// Saves a generator call; the insert below is what enforces uniqueness.
		if self.store.mood_exists(user_id, day).await? {
			return Err(Error::Conflict { message: format!("Mood already entered for {day}.") });
		}

		let (analysis, model) = self.analyze_mood(mood_text).await;
		let credits = mood::credits_for_score(analysis.mood_score);
		let entry = MoodEntry {
			mood_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			mood_text: mood_text.to_string(),
			supportive_text: analysis.supportive_text,
			mood_score: i16::from(analysis.mood_score),
			score_confidence: analysis.score_confidence,
			credits: i32::try_from(credits).unwrap_or(i32::MAX),
			day,
			created_at: now,
		};

		self.store.insert_mood(&entry).await?;

		tracing::info!(
			user_id,
			%day,
			mood_score = entry.mood_score,
			credits = entry.credits,
			model = model.as_deref().unwrap_or("default"),
			"Mood check-in stored."
		);

		Ok(MoodCheckIn { entry, model })
	}

	async fn analyze_mood(&self, mood_text: &str) -> (MoodAnalysis, Option<String>) {
		let prompt = prompts::mood_prompt(mood_text);

		for model in &self.cfg.mood.models {
			let request = GenerationRequest::new(model.clone(), prompt.clone())
				.with_schema(mood::mood_schema());

			match self.generate(&request).await {
				Ok(raw) => {
					let analysis = mood::parse_mood_analysis(&raw).unwrap_or_else(|err| {
						tracing::warn!(model = %model, error = %err, "Mood analysis is malformed.");

						MoodAnalysis::default()
					});

					return (analysis, Some(model.clone()));
				},
				Err(err) if err.is_config() => {
					tracing::warn!(
						error = %err,
						"Mood analysis skipped; generation is not configured."
					);

					break;
				},
				Err(err) => {
					tracing::warn!(
						model = %model,
						error = %err,
						"Mood model failed; trying the next one."
					);
				},
			}
		}

		tracing::warn!("No mood model answered; using default analysis.");

		(MoodAnalysis::default(), None)
	}
}
