use std::{fs, io::Write, path::Path};

use color_eyre::eyre::WrapErr;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use haven_service::{HavenService, IntentsDocument};

pub const END_COMMAND: &str = "/end";

pub async fn chat(
	service: &HavenService,
	user_id: &str,
	mood: Option<&str>,
) -> color_eyre::Result<()> {
	let session = service.create_session(user_id, mood.unwrap_or_default()).await?;
	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	println!("Session {} started. Type {END_COMMAND} to finish.", session.session_id);

	loop {
		print!("> ");
		std::io::stdout().flush()?;

		let Some(line) = lines.next_line().await? else {
			break;
		};
		let line = line.trim();

		if line.is_empty() {
			continue;
		}
		if line == END_COMMAND {
			break;
		}

		let turn = service.record_turn(session.session_id, line).await?;

		println!("{}", turn.response);
	}

	let report = service.end_session(session.session_id).await?;

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

pub async fn mood(service: &HavenService, user_id: &str, text: &str) -> color_eyre::Result<()> {
	let checkin = service.submit_mood(user_id, text).await?;
	let entry = &checkin.entry;

	println!("{}", entry.supportive_text);
	println!(
		"Mood {}/5 (confidence {:.2}) on {}; {} credits earned.",
		entry.mood_score, entry.score_confidence, entry.day, entry.credits
	);

	Ok(())
}

pub async fn history(service: &HavenService, user_id: &str) -> color_eyre::Result<()> {
	let sessions = service.list_sessions(user_id).await?;

	println!("{}", serde_json::to_string_pretty(&sessions)?);

	Ok(())
}

pub async fn report(service: &HavenService, session_id: Uuid) -> color_eyre::Result<()> {
	let report = service.session_report(session_id).await?;

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

pub async fn index(service: &HavenService, intents: &Path, out: &Path) -> color_eyre::Result<()> {
	let raw = fs::read_to_string(intents)
		.wrap_err_with(|| format!("Failed to read intents file {}.", intents.display()))?;
	let document: IntentsDocument = serde_json::from_str(&raw)
		.wrap_err_with(|| format!("Failed to parse intents file {}.", intents.display()))?;
	let entries = service.build_corpus(&document).await?;

	if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		fs::create_dir_all(parent)?;
	}

	fs::write(out, serde_json::to_string(&entries)?)
		.wrap_err_with(|| format!("Failed to write corpus file {}.", out.display()))?;

	tracing::info!(entries = entries.len(), out = %out.display(), "Corpus file written.");

	Ok(())
}
