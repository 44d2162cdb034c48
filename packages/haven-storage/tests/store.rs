use serde_json::json;
use time::{Duration, macros::{date, datetime}};
use uuid::Uuid;

use haven_config::Postgres;
use haven_storage::{
	Error,
	db::Db,
	memory::MemoryStore,
	models::{ConversationMessage, ConversationSession, MoodEntry},
	store::Store,
};
use haven_testkit::with_test_db;

fn mood_entry(user_id: &str, day: time::Date) -> MoodEntry {
	MoodEntry {
		mood_id: Uuid::new_v4(),
		user_id: user_id.to_string(),
		mood_text: "Slept badly but the walk helped.".to_string(),
		supportive_text: "A walk is a good start.".to_string(),
		mood_score: 3,
		score_confidence: 0.7,
		credits: 3,
		day,
		created_at: datetime!(2026-03-02 08:00 UTC),
	}
}

async fn exercise_lifecycle(store: &dyn Store) {
	let start = datetime!(2026-03-02 09:00 UTC);
	let older = ConversationSession::start("alice", "anxious", start);
	let newer = ConversationSession::start("alice", "calmer", start + Duration::hours(2));
	let other = ConversationSession::start("bob", "", start + Duration::hours(1));

	for session in [&older, &newer, &other] {
		store.insert_session(session).await.expect("Failed to insert session.");
	}

	let listed = store.list_sessions("alice").await.expect("Failed to list sessions.");
	let ids = listed.iter().map(|session| session.session_id).collect::<Vec<_>>();

	assert_eq!(ids, vec![newer.session_id, older.session_id]);

	let user = ConversationMessage::user(older.session_id, "I can't sleep.", start);
	let reply = ConversationMessage::assistant(
		older.session_id,
		"That sounds exhausting.",
		0.4,
		start + Duration::seconds(1),
	);

	store.append_message(&user).await.expect("Failed to append user message.");
	store.append_message(&reply).await.expect("Failed to append assistant message.");

	let messages = store.list_messages(older.session_id, None).await.expect("Failed to list.");

	assert_eq!(messages.len(), 2);
	assert_eq!(messages[0].content, "I can't sleep.");
	assert_eq!(messages[1].sentiment_score, Some(0.4));

	let report = json!({ "summary": "short" });
	let completed = store
		.complete_session(older.session_id, start + Duration::minutes(30), &report)
		.await
		.expect("Failed to complete session.");

	assert_eq!(completed.report, Some(report));

	let err = store
		.append_message(&ConversationMessage::user(older.session_id, "one more", start))
		.await
		.expect_err("Append after completion must fail.");

	assert!(matches!(err, Error::Conflict(_)));

	let err = store
		.complete_session(Uuid::new_v4(), start, &json!({}))
		.await
		.expect_err("Unknown session must fail.");

	assert!(matches!(err, Error::NotFound(_)));
}

async fn exercise_mood(store: &dyn Store) {
	let day = date!(2026-03-02);

	assert!(!store.mood_exists("alice", day).await.expect("Failed to check mood."));

	store.insert_mood(&mood_entry("alice", day)).await.expect("Failed to insert mood.");

	assert!(store.mood_exists("alice", day).await.expect("Failed to check mood."));

	let err = store
		.insert_mood(&mood_entry("alice", day))
		.await
		.expect_err("Second entry on the same day must fail.");

	assert!(matches!(err, Error::Conflict(_)));

	store
		.insert_mood(&mood_entry("alice", date!(2026-03-03)))
		.await
		.expect("Next day must be accepted.");
}

#[tokio::test]
async fn memory_store_session_lifecycle() {
	exercise_lifecycle(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_store_one_mood_per_day() {
	exercise_mood(&MemoryStore::new()).await;
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HAVEN_PG_DSN to run."]
async fn postgres_store_session_lifecycle() {
	let Some(base_dsn) = haven_testkit::env_dsn() else {
		eprintln!("Skipping postgres_store_session_lifecycle; set HAVEN_PG_DSN to run this test.");

		return;
	};

	with_test_db(&base_dsn, |test_db| {
		let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };

		async move {
			let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

			db.ensure_schema().await.expect("Failed to ensure schema.");

			exercise_lifecycle(&db).await;
			exercise_mood(&db).await;

			db.pool.close().await;

			Ok(())
		}
	})
	.await
	.expect("Failed to run against a test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HAVEN_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = haven_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set HAVEN_PG_DSN to run this test.");

		return;
	};

	with_test_db(&base_dsn, |test_db| {
		let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };

		async move {
			let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

			db.ensure_schema().await.expect("Failed to ensure schema.");
			db.ensure_schema().await.expect("Failed to re-run schema.");

			let count: i64 = sqlx::query_scalar(
				"SELECT count(*) FROM information_schema.tables WHERE table_name = 'mood_entries'",
			)
			.fetch_one(&db.pool)
			.await
			.expect("Failed to query schema tables.");

			assert_eq!(count, 1);

			db.pool.close().await;

			Ok(())
		}
	})
	.await
	.expect("Failed to run against a test database.");
}
