use haven_domain::{
	report::{self, Report},
	sentiment::SentimentAggregate,
};
use haven_providers::generation::GenerationRequest;
use haven_storage::models::{ConversationMessage, ConversationSession};

use crate::{HavenService, prompts};

impl HavenService {
	/// Builds the end-of-session report. Never fails: generator or parse problems yield
	/// [`Report::fallback`].
	pub async fn synthesize(
		&self,
		session: &ConversationSession,
		messages: &[ConversationMessage],
		aggregate: &SentimentAggregate,
	) -> Report {
		let transcript = report::render_transcript(messages.iter().map(|message| {
			(message.created_at, message.role, message.content.as_str())
		}));
		let model = self
			.cfg
			.session
			.report_model
			.clone()
			.unwrap_or_else(|| self.cfg.providers.generation.model.clone());
		let request = GenerationRequest::new(
			model.clone(),
			prompts::report_prompt(&session.mood_description, &transcript, aggregate),
		)
		.with_system(prompts::report_system());
		let raw = match self.generate(&request).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(
					session_id = %session.session_id,
					model = %model,
					error = %err,
					"Report generation failed; using the fallback report."
				);

				return Report::fallback();
			},
		};

		match report::parse_report(&raw, aggregate.trend) {
			Ok(report) => report,
			Err(err) => {
				tracing::warn!(
					session_id = %session.session_id,
					model = %model,
					error = %err,
					"Report output is malformed; using the fallback report."
				);

				Report::fallback()
			},
		}
	}
}
