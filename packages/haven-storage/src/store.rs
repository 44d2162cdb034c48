use std::{future::Future, pin::Pin};

use serde_json::Value;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
	Result,
	models::{ConversationMessage, ConversationSession, MoodEntry},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence for sessions, their message logs, and daily mood entries.
///
/// Implementations must reject writes that would violate the session lifecycle: appending to
/// or completing a session that is no longer active is a [`crate::Error::Conflict`], and an
/// unknown session is a [`crate::Error::NotFound`].
pub trait Store
where
	Self: Send + Sync,
{
	fn insert_session<'a>(&'a self, session: &'a ConversationSession) -> BoxFuture<'a, Result<()>>;

	fn fetch_session(&self, session_id: Uuid) -> BoxFuture<'_, Result<Option<ConversationSession>>>;

	/// Sessions owned by `user_id`, most recently started first.
	fn list_sessions<'a>(
		&'a self,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<ConversationSession>>>;

	fn append_message<'a>(&'a self, message: &'a ConversationMessage) -> BoxFuture<'a, Result<()>>;

	/// Messages in chronological order. With `recent`, only the last `recent` messages.
	fn list_messages(
		&self,
		session_id: Uuid,
		recent: Option<u32>,
	) -> BoxFuture<'_, Result<Vec<ConversationMessage>>>;

	/// Moves an active session to completed, storing `report`, in one atomic step.
	fn complete_session<'a>(
		&'a self,
		session_id: Uuid,
		ended_at: OffsetDateTime,
		report: &'a Value,
	) -> BoxFuture<'a, Result<ConversationSession>>;

	/// Fails with [`crate::Error::Conflict`] when the user already has an entry for that day.
	fn insert_mood<'a>(&'a self, entry: &'a MoodEntry) -> BoxFuture<'a, Result<()>>;

	fn mood_exists<'a>(&'a self, user_id: &'a str, day: Date) -> BoxFuture<'a, Result<bool>>;
}
