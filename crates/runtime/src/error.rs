//! Error types for the sessionize runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the hosted browser.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to open the control WebSocket.
	#[error("Failed to connect to {endpoint}: {reason}")]
	ConnectionFailed { endpoint: String, reason: String },

	/// WebSocket-level failure after the connection was established.
	#[error("Transport error: {0}")]
	Transport(String),

	/// The browser answered a command with an error object.
	#[error("{method} failed: {message}")]
	Protocol { method: String, message: String },

	/// JavaScript threw while being evaluated in the page.
	#[error("Evaluation failed: {0}")]
	Evaluation(String),

	/// Navigation was rejected by the browser (DNS failure, aborted, ...).
	#[error("Navigation to '{url}' failed: {reason}")]
	Navigation { url: String, reason: String },

	/// A bounded wait expired.
	#[error("Timeout after {ms}ms waiting for {what}")]
	Timeout { what: String, ms: u64 },

	/// The connection went away while a command was in flight.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// The browser exposes no page target to attach to.
	#[error("No page target available in the remote browser")]
	NoPageTarget,

	/// Non-success response from the session REST API.
	#[error("Session API returned HTTP {status}: {body}")]
	Http { status: u16, body: String },

	/// HTTP client error.
	#[error("HTTP error: {0}")]
	Request(#[from] reqwest::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}

	/// Returns true if the remote API reported the resource as missing.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Error::Http { status: 404, .. })
	}
}
