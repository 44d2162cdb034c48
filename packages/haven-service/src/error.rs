pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Config { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Parse error: {message}")]
	Parse { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}

impl From<haven_storage::Error> for Error {
	fn from(err: haven_storage::Error) -> Self {
		match err {
			haven_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			haven_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			haven_storage::Error::InvalidData(message) => Self::Storage { message },
			haven_storage::Error::NotFound(message) => Self::NotFound { message },
			haven_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<haven_config::Error> for Error {
	fn from(err: haven_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}

impl From<haven_providers::Error> for Error {
	fn from(err: haven_providers::Error) -> Self {
		if err.is_config() {
			Self::Config { message: err.to_string() }
		} else {
			Self::Provider { message: err.to_string() }
		}
	}
}

impl From<haven_domain::ParseError> for Error {
	fn from(err: haven_domain::ParseError) -> Self {
		Self::Parse { message: err.to_string() }
	}
}
