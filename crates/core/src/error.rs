//! Error taxonomy of the automation core.

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Missing credentials or identifiers. Never retried.
	#[error("{0}")]
	Config(String),

	/// Malformed caller input (rating out of range, empty list, ...).
	#[error("{0}")]
	Validation(String),

	/// An expected page affordance was absent after every strategy was tried.
	#[error("{0}")]
	NotFound(String),

	/// Credentials were submitted but the application did not sign in.
	#[error("{0}")]
	Auth(String),

	/// The page's structure contradicts the request.
	#[error("Expected {expected} {what}, got {actual}")]
	Mismatch { what: String, expected: usize, actual: usize },

	/// Driver or provider failure (transient page error).
	#[error(transparent)]
	Page(#[from] sessionize_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Stable machine-readable classification used in output envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	ConfigError,
	ValidationError,
	NotFound,
	AuthFailed,
	Mismatch,
	PageError,
	IoError,
	InternalError,
}

impl ErrorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorKind::ConfigError => "CONFIG_ERROR",
			ErrorKind::ValidationError => "VALIDATION_ERROR",
			ErrorKind::NotFound => "NOT_FOUND",
			ErrorKind::AuthFailed => "AUTH_FAILED",
			ErrorKind::Mismatch => "MISMATCH",
			ErrorKind::PageError => "PAGE_ERROR",
			ErrorKind::IoError => "IO_ERROR",
			ErrorKind::InternalError => "INTERNAL_ERROR",
		}
	}
}

impl std::fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Config(_) => ErrorKind::ConfigError,
			Error::Validation(_) => ErrorKind::ValidationError,
			Error::NotFound(_) => ErrorKind::NotFound,
			Error::Auth(_) => ErrorKind::AuthFailed,
			Error::Mismatch { .. } => ErrorKind::Mismatch,
			Error::Page(_) => ErrorKind::PageError,
			Error::Io(_) => ErrorKind::IoError,
			Error::Json(_) => ErrorKind::InternalError,
		}
	}

	pub(crate) fn config(msg: impl Into<String>) -> Self {
		Error::Config(msg.into())
	}

	pub(crate) fn validation(msg: impl Into<String>) -> Self {
		Error::Validation(msg.into())
	}

	pub(crate) fn not_found(msg: impl Into<String>) -> Self {
		Error::NotFound(msg.into())
	}
}
