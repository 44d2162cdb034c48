use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use haven_domain::{
	Role, SessionStatus,
	history,
	payload::{self, TurnPayload},
	report::Report,
	sentiment::{self, TrendPolicy},
};
use haven_providers::generation::GenerationRequest;
use haven_storage::models::{ConversationMessage, ConversationSession};

use crate::{Error, HavenService, Result, prompts};

/// Reply used when the generator cannot be reached for a turn.
pub const FALLBACK_REPLY: &str = "I'm here with you. I had trouble putting my thoughts \
together just now. Could you tell me a little more about how you're feeling?";

#[derive(Clone, Debug, Serialize)]
pub struct AssistantTurn {
	pub message_id: Uuid,
	pub response: String,
	pub sentiment_score: f32,
	pub emotion: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
	pub session_id: Uuid,
	pub mood_description: String,
	pub status: SessionStatus,
	#[serde(with = "crate::time_serde")]
	pub started_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub ended_at: Option<OffsetDateTime>,
	pub report: Option<Report>,
}

impl HavenService {
	pub async fn create_session(
		&self,
		user_id: &str,
		mood_description: &str,
	) -> Result<ConversationSession> {
		self.create_session_at(user_id, mood_description, OffsetDateTime::now_utc()).await
	}

	pub async fn create_session_at(
		&self,
		user_id: &str,
		mood_description: &str,
		now: OffsetDateTime,
	) -> Result<ConversationSession> {
		let user_id = require_user(user_id)?;
		let session = ConversationSession::start(user_id, mood_description, now);

		self.store.insert_session(&session).await?;

		tracing::info!(session_id = %session.session_id, user_id, "Session started.");

		Ok(session)
	}

	/// Stores the user's message, asks the generator for a reply, and stores the reply with its
	/// sentiment score. Upstream failures produce a fallback reply rather than an error; a missing
	/// generation credential is a configuration error and stores nothing.
	pub async fn record_turn(&self, session_id: Uuid, user_text: &str) -> Result<AssistantTurn> {
		let user_text = user_text.trim();

		if user_text.is_empty() {
			return Err(Error::InvalidRequest { message: "Message must not be empty.".to_string() });
		}

		let _guard = self.lock_session(session_id).await;
		let session = self.active_session(session_id).await?;

		self.cfg.providers.generation.api_key()?;

		let prior =
			self.store.list_messages(session_id, Some(self.cfg.session.history_limit)).await?;
		let last_at = prior.last().map(|message| message.created_at);
		let user_at = not_before(OffsetDateTime::now_utc(), last_at);
		let user_message = ConversationMessage::user(session_id, user_text, user_at);

		self.store.append_message(&user_message).await?;

		let turns =
			history::sanitize(prior.iter().map(|message| (message.role, message.content.as_str())));
		let context = self.context_for(user_text).await;
		let elapsed_minutes = (user_at - session.started_at).whole_minutes().max(0);
		let request = GenerationRequest::new(
			self.cfg.providers.generation.model.clone(),
			prompts::turn_prompt(&session.mood_description, elapsed_minutes, user_text),
		)
		.with_system(prompts::turn_system(&context))
		.with_history(turns)
		.with_schema(prompts::turn_schema());
		let payload = match self.generate(&request).await {
			Ok(raw) => match payload::parse_turn_payload(&raw) {
				Ok(payload) => payload,
				Err(err) => {
					tracing::warn!(
						session_id = %session_id,
						error = %err,
						"Turn payload is not structured; using the raw reply."
					);

					TurnPayload::from_raw_text(&raw)
				},
			},
			Err(err) if err.is_config() => return Err(err.into()),
			Err(err) => {
				tracing::warn!(session_id = %session_id, error = %err, "Turn generation failed.");

				TurnPayload::from_raw_text(FALLBACK_REPLY)
			},
		};
		let assistant_at = not_before(OffsetDateTime::now_utc(), Some(user_at));
		let assistant_message = ConversationMessage::assistant(
			session_id,
			&payload.response,
			payload.sentiment_score,
			assistant_at,
		);

		self.store.append_message(&assistant_message).await?;

		tracing::info!(
			session_id = %session_id,
			score = payload.sentiment_score,
			emotion = %payload.emotion,
			"Turn recorded."
		);

		Ok(AssistantTurn {
			message_id: assistant_message.message_id,
			response: payload.response,
			sentiment_score: payload.sentiment_score,
			emotion: payload.emotion,
		})
	}

	/// Completes the session and stores its report. A session can be ended once.
	pub async fn end_session(&self, session_id: Uuid) -> Result<Report> {
		let guard = self.lock_session(session_id).await;
		let Some(session) = self.store.fetch_session(session_id).await? else {
			return Err(Error::NotFound { message: format!("Session {session_id} not found.") });
		};

		if !session.is_active() {
			return Err(Error::Conflict {
				message: format!("Session {session_id} has already ended."),
			});
		}

		let messages = self.store.list_messages(session_id, None).await?;
		let scores = messages
			.iter()
			.filter(|message| message.role == Role::Assistant)
			.filter_map(|message| message.sentiment_score)
			.collect::<Vec<_>>();
		let policy = TrendPolicy {
			epsilon: self.cfg.session.trend_epsilon,
			fluctuation_variance: self.cfg.session.fluctuation_variance,
		};
		let aggregate = sentiment::aggregate(&scores, &policy);
		let report = self.synthesize(&session, &messages, &aggregate).await;
		let value = serde_json::to_value(&report)
			.map_err(|err| Error::Parse { message: format!("Failed to encode report: {err}.") })?;
		let last_at = messages.last().map_or(session.started_at, |message| message.created_at);
		let ended_at = not_before(OffsetDateTime::now_utc(), Some(last_at.max(session.started_at)));

		self.store.complete_session(session_id, ended_at, &value).await?;

		drop(guard);

		tracing::info!(
			session_id = %session_id,
			trend = %aggregate.trend,
			scored_turns = aggregate.scored_turns,
			"Session completed."
		);

		Ok(report)
	}

	/// The user's sessions, newest first.
	pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
		let user_id = require_user(user_id)?;
		let sessions = self.store.list_sessions(user_id).await?;

		Ok(sessions.into_iter().map(summarize).collect())
	}

	pub async fn session_report(&self, session_id: Uuid) -> Result<Report> {
		let Some(session) = self.store.fetch_session(session_id).await? else {
			return Err(Error::NotFound { message: format!("Session {session_id} not found.") });
		};
		let Some(value) = session.report else {
			return Err(Error::InvalidRequest {
				message: format!("Session {session_id} has not ended yet."),
			});
		};

		serde_json::from_value(value).map_err(|err| Error::Parse {
			message: format!("Stored report for session {session_id} is malformed: {err}."),
		})
	}

	async fn active_session(&self, session_id: Uuid) -> Result<ConversationSession> {
		match self.store.fetch_session(session_id).await? {
			Some(session) if session.is_active() => Ok(session),
			Some(_) => Err(Error::NotFound {
				message: format!("Session {session_id} is not active."),
			}),
			None => Err(Error::NotFound { message: format!("Session {session_id} not found.") }),
		}
	}
}

fn require_user(user_id: &str) -> Result<&str> {
	let trimmed = user_id.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest { message: "user_id must not be empty.".to_string() });
	}

	Ok(trimmed)
}

/// Keeps stored timestamps monotonic within a session.
fn not_before(now: OffsetDateTime, floor: Option<OffsetDateTime>) -> OffsetDateTime {
	match floor {
		Some(floor) if floor > now => floor,
		_ => now,
	}
}

fn summarize(session: ConversationSession) -> SessionSummary {
	let report = session.report.and_then(|value| match serde_json::from_value(value) {
		Ok(report) => Some(report),
		Err(err) => {
			tracing::warn!(
				session_id = %session.session_id,
				error = %err,
				"Stored report does not match the report schema."
			);

			None
		},
	});

	SessionSummary {
		session_id: session.session_id,
		mood_description: session.mood_description,
		status: session.status,
		started_at: session.started_at,
		ended_at: session.ended_at,
		report,
	}
}
