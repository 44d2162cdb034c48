//! In-process [`Store`] used by the terminal client's `memory` backend and by tests.

use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard},
};

use serde_json::Value;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{ConversationMessage, ConversationSession, MoodEntry},
	store::{BoxFuture, Store},
};

#[derive(Default)]
struct State {
	sessions: HashMap<Uuid, ConversationSession>,
	messages: HashMap<Uuid, Vec<ConversationMessage>>,
	moods: HashMap<(String, Date), MoodEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<State>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}

impl Store for MemoryStore {
	fn insert_session<'a>(&'a self, session: &'a ConversationSession) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.lock();

			if state.sessions.contains_key(&session.session_id) {
				return Err(Error::Conflict(format!(
					"Session {} already exists.",
					session.session_id
				)));
			}

			state.sessions.insert(session.session_id, session.clone());

			Ok(())
		})
	}

	fn fetch_session(
		&self,
		session_id: Uuid,
	) -> BoxFuture<'_, Result<Option<ConversationSession>>> {
		Box::pin(async move { Ok(self.lock().sessions.get(&session_id).cloned()) })
	}

	fn list_sessions<'a>(
		&'a self,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<ConversationSession>>> {
		Box::pin(async move {
			let state = self.lock();
			let mut sessions = state
				.sessions
				.values()
				.filter(|session| session.user_id == user_id)
				.cloned()
				.collect::<Vec<_>>();

			sessions.sort_by(|a, b| {
				b.started_at.cmp(&a.started_at).then_with(|| a.session_id.cmp(&b.session_id))
			});

			Ok(sessions)
		})
	}

	fn append_message<'a>(&'a self, message: &'a ConversationMessage) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.lock();
			let Some(session) = state.sessions.get(&message.session_id) else {
				return Err(Error::NotFound(format!("Session {} not found.", message.session_id)));
			};

			if !session.is_active() {
				return Err(Error::Conflict(format!(
					"Session {} is {}; messages can no longer be added.",
					message.session_id, session.status
				)));
			}

			state.messages.entry(message.session_id).or_default().push(message.clone());

			Ok(())
		})
	}

	fn list_messages(
		&self,
		session_id: Uuid,
		recent: Option<u32>,
	) -> BoxFuture<'_, Result<Vec<ConversationMessage>>> {
		Box::pin(async move {
			let state = self.lock();
			let mut messages = state.messages.get(&session_id).cloned().unwrap_or_default();

			// Stable sort keeps insertion order for equal timestamps.
			messages.sort_by_key(|message| message.created_at);

			if let Some(recent) = recent {
				let keep = recent as usize;

				if messages.len() > keep {
					messages.drain(..messages.len() - keep);
				}
			}

			Ok(messages)
		})
	}

	fn complete_session<'a>(
		&'a self,
		session_id: Uuid,
		ended_at: OffsetDateTime,
		report: &'a Value,
	) -> BoxFuture<'a, Result<ConversationSession>> {
		Box::pin(async move {
			let mut state = self.lock();
			let Some(session) = state.sessions.get_mut(&session_id) else {
				return Err(Error::NotFound(format!("Session {session_id} not found.")));
			};

			if !session.is_active() {
				return Err(Error::Conflict(format!(
					"Session {session_id} is already {}.",
					session.status
				)));
			}

			session.complete(ended_at, report.clone());

			Ok(session.clone())
		})
	}

	fn insert_mood<'a>(&'a self, entry: &'a MoodEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.lock();
			let key = (entry.user_id.clone(), entry.day);

			if state.moods.contains_key(&key) {
				return Err(Error::Conflict(format!(
					"User {} already checked in on {}.",
					entry.user_id, entry.day
				)));
			}

			state.moods.insert(key, entry.clone());

			Ok(())
		})
	}

	fn mood_exists<'a>(&'a self, user_id: &'a str, day: Date) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let state = self.lock();

			Ok(state.moods.contains_key(&(user_id.to_string(), day)))
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use time::macros::datetime;

	use super::*;

	#[tokio::test]
	async fn recent_window_keeps_newest_in_order() {
		let store = MemoryStore::new();
		let now = datetime!(2026-03-02 10:00 UTC);
		let session = ConversationSession::start("u1", "tired", now);

		store.insert_session(&session).await.expect("insert session");

		for idx in 0..5 {
			let message = ConversationMessage::user(session.session_id, &format!("m{idx}"), now);

			store.append_message(&message).await.expect("append");
		}

		let recent = store.list_messages(session.session_id, Some(2)).await.expect("list");
		let texts = recent.iter().map(|message| message.content.as_str()).collect::<Vec<_>>();

		assert_eq!(texts, vec!["m3", "m4"]);

		let all = store.list_messages(session.session_id, None).await.expect("list");

		assert_eq!(all.len(), 5);
	}

	#[tokio::test]
	async fn completed_session_rejects_writes() {
		let store = MemoryStore::new();
		let now = datetime!(2026-03-02 10:00 UTC);
		let session = ConversationSession::start("u1", "", now);

		store.insert_session(&session).await.expect("insert session");

		let done = store
			.complete_session(session.session_id, now, &json!({ "ok": true }))
			.await
			.expect("complete");

		assert!(!done.is_active());
		assert_eq!(done.ended_at, Some(now));

		let err = store
			.append_message(&ConversationMessage::user(session.session_id, "late", now))
			.await
			.expect_err("append after completion");

		assert!(matches!(err, Error::Conflict(_)));

		let err = store
			.complete_session(session.session_id, now, &json!({}))
			.await
			.expect_err("second completion");

		assert!(matches!(err, Error::Conflict(_)));
	}

	#[tokio::test]
	async fn unknown_session_is_not_found() {
		let store = MemoryStore::new();
		let now = datetime!(2026-03-02 10:00 UTC);
		let err = store
			.append_message(&ConversationMessage::user(Uuid::new_v4(), "hi", now))
			.await
			.expect_err("unknown session");

		assert!(matches!(err, Error::NotFound(_)));
	}
}
