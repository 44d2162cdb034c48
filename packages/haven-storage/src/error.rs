#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Invalid stored data: {0}")]
	InvalidData(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl From<haven_domain::UnknownVariant> for Error {
	fn from(err: haven_domain::UnknownVariant) -> Self {
		Self::InvalidData(err.to_string())
	}
}
