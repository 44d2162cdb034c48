pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_conversation_sessions.sql" => out
					.push_str(include_str!("../../../sql/tables/001_conversation_sessions.sql")),
				"tables/002_conversation_messages.sql" => out
					.push_str(include_str!("../../../sql/tables/002_conversation_messages.sql")),
				"tables/003_mood_entries.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_mood_entries.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS conversation_sessions"));
		assert!(sql.contains("CONSTRAINT mood_entries_one_per_day UNIQUE (user_id, day)"));
	}
}
