use serde_json::Value;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use haven_domain::{Role, SessionStatus};

use crate::{Error, Result};

/// `ended_at` and `report` are set exactly when `status` is `Completed`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationSession {
	pub session_id: Uuid,
	pub user_id: String,
	pub mood_description: String,
	pub status: SessionStatus,
	pub started_at: OffsetDateTime,
	pub ended_at: Option<OffsetDateTime>,
	pub report: Option<Value>,
}
impl ConversationSession {
	pub fn start(user_id: &str, mood_description: &str, now: OffsetDateTime) -> Self {
		Self {
			session_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			mood_description: mood_description.trim().to_string(),
			status: SessionStatus::Active,
			started_at: now,
			ended_at: None,
			report: None,
		}
	}

	pub fn is_active(&self) -> bool {
		self.status == SessionStatus::Active
	}

	pub(crate) fn complete(&mut self, ended_at: OffsetDateTime, report: Value) {
		self.status = SessionStatus::Completed;
		self.ended_at = Some(ended_at);
		self.report = Some(report);
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConversationMessage {
	pub message_id: Uuid,
	pub session_id: Uuid,
	pub role: Role,
	pub content: String,
	/// Only set on assistant turns produced by the generator.
	pub sentiment_score: Option<f32>,
	pub created_at: OffsetDateTime,
}
impl ConversationMessage {
	pub fn user(session_id: Uuid, content: &str, now: OffsetDateTime) -> Self {
		Self {
			message_id: Uuid::new_v4(),
			session_id,
			role: Role::User,
			content: content.to_string(),
			sentiment_score: None,
			created_at: now,
		}
	}

	pub fn assistant(
		session_id: Uuid,
		content: &str,
		sentiment_score: f32,
		now: OffsetDateTime,
	) -> Self {
		Self {
			message_id: Uuid::new_v4(),
			session_id,
			role: Role::Assistant,
			content: content.to_string(),
			sentiment_score: Some(sentiment_score.clamp(0.0, 1.0)),
			created_at: now,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoodEntry {
	pub mood_id: Uuid,
	pub user_id: String,
	pub mood_text: String,
	pub supportive_text: String,
	pub mood_score: i16,
	pub score_confidence: f32,
	pub credits: i32,
	pub day: Date,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SessionRow {
	pub session_id: Uuid,
	pub user_id: String,
	pub mood_description: String,
	pub status: String,
	pub started_at: OffsetDateTime,
	pub ended_at: Option<OffsetDateTime>,
	pub report: Option<Value>,
}
impl TryFrom<SessionRow> for ConversationSession {
	type Error = Error;

	fn try_from(row: SessionRow) -> Result<Self> {
		let status: SessionStatus = row.status.parse()?;
		let completed = status == SessionStatus::Completed;

		if completed != row.ended_at.is_some() || completed != row.report.is_some() {
			return Err(Error::InvalidData(format!(
				"Session {} has status {status} with inconsistent terminal fields.",
				row.session_id
			)));
		}

		Ok(Self {
			session_id: row.session_id,
			user_id: row.user_id,
			mood_description: row.mood_description,
			status,
			started_at: row.started_at,
			ended_at: row.ended_at,
			report: row.report,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MessageRow {
	pub message_id: Uuid,
	pub session_id: Uuid,
	pub role: String,
	pub content: String,
	pub sentiment_score: Option<f32>,
	pub created_at: OffsetDateTime,
}
impl TryFrom<MessageRow> for ConversationMessage {
	type Error = Error;

	fn try_from(row: MessageRow) -> Result<Self> {
		Ok(Self {
			message_id: row.message_id,
			session_id: row.session_id,
			role: row.role.parse()?,
			content: row.content,
			sentiment_score: row.sentiment_score,
			created_at: row.created_at,
		})
	}
}
