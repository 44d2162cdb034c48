use serde_json::Value;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{ConversationMessage, ConversationSession, MessageRow, MoodEntry, SessionRow},
	store::{BoxFuture, Store},
};

const SESSION_COLUMNS: &str =
	"session_id, user_id, mood_description, status, started_at, ended_at, report";

impl Store for Db {
	fn insert_session<'a>(&'a self, session: &'a ConversationSession) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO conversation_sessions (
	session_id,
	user_id,
	mood_description,
	status,
	started_at,
	ended_at,
	report
)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
			)
			.bind(session.session_id)
			.bind(session.user_id.as_str())
			.bind(session.mood_description.as_str())
			.bind(session.status.as_str())
			.bind(session.started_at)
			.bind(session.ended_at)
			.bind(session.report.as_ref())
			.execute(&self.pool)
			.await?;

			Ok(())
		})
	}

	fn fetch_session(
		&self,
		session_id: Uuid,
	) -> BoxFuture<'_, Result<Option<ConversationSession>>> {
		Box::pin(async move {
			let sql = format!(
				"SELECT {SESSION_COLUMNS} FROM conversation_sessions WHERE session_id = $1"
			);
			let row: Option<SessionRow> =
				sqlx::query_as(&sql).bind(session_id).fetch_optional(&self.pool).await?;

			row.map(ConversationSession::try_from).transpose()
		})
	}

	fn list_sessions<'a>(
		&'a self,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<ConversationSession>>> {
		Box::pin(async move {
			let sql = format!(
				"SELECT {SESSION_COLUMNS} FROM conversation_sessions WHERE user_id = $1 \
				 ORDER BY started_at DESC, session_id"
			);
			let rows: Vec<SessionRow> =
				sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?;

			rows.into_iter().map(ConversationSession::try_from).collect()
		})
	}

	fn append_message<'a>(&'a self, message: &'a ConversationMessage) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut tx = self.pool.begin().await?;
			// Row lock serializes appends against a concurrent completion of the same session.
			let status: Option<String> = sqlx::query_scalar(
				"SELECT status FROM conversation_sessions WHERE session_id = $1 FOR UPDATE",
			)
			.bind(message.session_id)
			.fetch_optional(&mut *tx)
			.await?;
			let Some(status) = status else {
				return Err(Error::NotFound(format!("Session {} not found.", message.session_id)));
			};

			if status != haven_domain::SessionStatus::Active.as_str() {
				return Err(Error::Conflict(format!(
					"Session {} is {status}; messages can no longer be added.",
					message.session_id
				)));
			}

			sqlx::query(
				"\
INSERT INTO conversation_messages (
	message_id,
	session_id,
	role,
	content,
	sentiment_score,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6)",
			)
			.bind(message.message_id)
			.bind(message.session_id)
			.bind(message.role.as_str())
			.bind(message.content.as_str())
			.bind(message.sentiment_score)
			.bind(message.created_at)
			.execute(&mut *tx)
			.await?;

			tx.commit().await?;

			Ok(())
		})
	}

	fn list_messages(
		&self,
		session_id: Uuid,
		recent: Option<u32>,
	) -> BoxFuture<'_, Result<Vec<ConversationMessage>>> {
		Box::pin(async move {
			let limit = recent.map(i64::from);
			// Take the newest `limit` rows, then flip them back into chronological order.
			let rows: Vec<MessageRow> = sqlx::query_as(
				"\
SELECT message_id, session_id, role, content, sentiment_score, created_at
FROM (
	SELECT message_id, session_id, role, content, sentiment_score, created_at, seq
	FROM conversation_messages
	WHERE session_id = $1
	ORDER BY created_at DESC, seq DESC
	LIMIT $2
) recent
ORDER BY created_at ASC, seq ASC",
			)
			.bind(session_id)
			.bind(limit)
			.fetch_all(&self.pool)
			.await?;

			rows.into_iter().map(ConversationMessage::try_from).collect()
		})
	}

	fn complete_session<'a>(
		&'a self,
		session_id: Uuid,
		ended_at: OffsetDateTime,
		report: &'a Value,
	) -> BoxFuture<'a, Result<ConversationSession>> {
		Box::pin(async move {
			let sql = format!(
				"UPDATE conversation_sessions SET status = 'completed', ended_at = $2, report = $3 \
				 WHERE session_id = $1 AND status = 'active' RETURNING {SESSION_COLUMNS}"
			);
			let row: Option<SessionRow> = sqlx::query_as(&sql)
				.bind(session_id)
				.bind(ended_at)
				.bind(report)
				.fetch_optional(&self.pool)
				.await?;

			if let Some(row) = row {
				return ConversationSession::try_from(row);
			}

			match self.fetch_session(session_id).await? {
				Some(session) => Err(Error::Conflict(format!(
					"Session {session_id} is already {}.",
					session.status
				))),
				None => Err(Error::NotFound(format!("Session {session_id} not found."))),
			}
		})
	}

	fn insert_mood<'a>(&'a self, entry: &'a MoodEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let result = sqlx::query(
				"\
INSERT INTO mood_entries (
	mood_id,
	user_id,
	mood_text,
	supportive_text,
	mood_score,
	score_confidence,
	credits,
	day,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT (user_id, day) DO NOTHING",
			)
			.bind(entry.mood_id)
			.bind(entry.user_id.as_str())
			.bind(entry.mood_text.as_str())
			.bind(entry.supportive_text.as_str())
			.bind(entry.mood_score)
			.bind(entry.score_confidence)
			.bind(entry.credits)
			.bind(entry.day)
			.bind(entry.created_at)
			.execute(&self.pool)
			.await?;

			if result.rows_affected() == 0 {
				return Err(Error::Conflict(format!(
					"User {} already checked in on {}.",
					entry.user_id, entry.day
				)));
			}

			Ok(())
		})
	}

	fn mood_exists<'a>(&'a self, user_id: &'a str, day: Date) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let exists: bool = sqlx::query_scalar(
				"SELECT EXISTS (SELECT 1 FROM mood_entries WHERE user_id = $1 AND day = $2)",
			)
			.bind(user_id)
			.bind(day)
			.fetch_one(&self.pool)
			.await?;

			Ok(exists)
		})
	}
}
