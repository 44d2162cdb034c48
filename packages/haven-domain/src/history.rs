use serde::{Deserialize, Serialize};

use crate::Role;

pub const FOLLOW_UP_MARKER: &str = "\n\n(Follow-up): ";
pub const MODEL_PLACEHOLDER: &str = "...";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
	User,
	Model,
}
impl TurnRole {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Model => "model",
		}
	}
}
impl From<Role> for TurnRole {
	fn from(role: Role) -> Self {
		match role {
			Role::User => Self::User,
			Role::Assistant => Self::Model,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Turn {
	pub role: TurnRole,
	pub text: String,
}

/// Folds a chronological message log into strictly alternating turns.
///
/// Consecutive messages from the same side are merged into one turn. A log that ends on a
/// user turn gets a placeholder model turn appended, so the caller's next submission is always
/// the user's.
pub fn sanitize<'a, I>(messages: I) -> Vec<Turn>
where
	I: IntoIterator<Item = (Role, &'a str)>,
{
	let mut turns: Vec<Turn> = Vec::new();

	for (role, content) in messages {
		let role = TurnRole::from(role);

		match turns.last_mut() {
			Some(last) if last.role == role => {
				last.text.push_str(FOLLOW_UP_MARKER);
				last.text.push_str(content);
			},
			_ => turns.push(Turn { role, text: content.to_string() }),
		}
	}

	if turns.last().map(|turn| turn.role == TurnRole::User).unwrap_or(false) {
		turns.push(Turn { role: TurnRole::Model, text: MODEL_PLACEHOLDER.to_string() });
	}

	turns
}
