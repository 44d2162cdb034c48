use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("Unknown {kind} value {value:?}.")]
pub struct UnknownVariant {
	pub kind: &'static str,
	pub value: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	User,
	Assistant,
}
impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Assistant => "assistant",
		}
	}
}
impl FromStr for Role {
	type Err = UnknownVariant;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"user" => Ok(Self::User),
			"assistant" => Ok(Self::Assistant),
			_ => Err(UnknownVariant { kind: "role", value: value.to_string() }),
		}
	}
}
impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	Active,
	Completed,
}
impl SessionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Active => "active",
			Self::Completed => "completed",
		}
	}
}
impl FromStr for SessionStatus {
	type Err = UnknownVariant;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"active" => Ok(Self::Active),
			"completed" => Ok(Self::Completed),
			_ => Err(UnknownVariant { kind: "session status", value: value.to_string() }),
		}
	}
}
impl fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
