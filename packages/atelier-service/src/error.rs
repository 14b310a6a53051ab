use atelier_domain::{compose::CombineError, constraint::FilterParseError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	/// A malformed filter or soft-constraint tree, with the JSON path of the offending node.
	#[error("Invalid request at {path}: {message}")]
	InvalidFilter { path: String, message: String },
	#[error("Degenerate query: {message}")]
	DegenerateQuery { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl From<atelier_storage::Error> for Error {
	fn from(err: atelier_storage::Error) -> Self {
		match err {
			atelier_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			atelier_storage::Error::InvalidArgument(message) => Self::Storage { message },
			atelier_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<FilterParseError> for Error {
	fn from(err: FilterParseError) -> Self {
		Self::InvalidFilter { path: err.path, message: err.message }
	}
}

impl From<CombineError> for Error {
	fn from(err: CombineError) -> Self {
		match err {
			CombineError::DimensionMismatch { expected, found } => Self::InvalidRequest {
				message: format!(
					"Signal embeddings disagree on dimension: expected {expected}, found {found}."
				),
			},
			CombineError::ZeroLength => Self::DegenerateQuery {
				message: "Soft constraints cancel out to a zero-length query vector.".to_string(),
			},
		}
	}
}
