//! Result envelope printed on stdout for every command.
//!
//! ## Output Contract
//!
//! On success the command's payload is flattened next to the flag:
//!
//! ```json
//! { "success": true, "session": { ... } }
//! ```
//!
//! On failure:
//!
//! ```json
//! { "success": false, "error": "Missing required: query", "code": "VALIDATION_ERROR" }
//! ```
//!
//! `debug` carries the error's debug rendering when `--debug` or `DEBUG` is set.
//! The process exits 1 whenever `success` is false.


use std::io::{self, Write};

use serde::Serialize;
use sessionize::{Error, ErrorKind};

#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
	pub success: bool,
	#[serde(flatten)]
	pub payload: T,
}

#[derive(Debug, Serialize)]
pub struct Failure {
	pub success: bool,
	pub error: String,
	pub code: ErrorKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub debug: Option<String>,
}

impl Failure {
	pub fn from_error(err: &Error, debug: bool) -> Self {
		Self {
			success: false,
			error: err.to_string(),
			code: err.kind(),
			debug: debug.then(|| format!("{err:?}")),
		}
	}
}

/// A finished command: its payload and whether it counts as a success.
///
/// `auth login` may complete without error yet report `success: false`.
#[derive(Debug)]
pub struct Reply {
	pub success: bool,
	pub payload: serde_json::Value,
}

impl Reply {
	pub fn ok(payload: impl Serialize) -> sessionize::Result<Self> {
		Ok(Self {
			success: true,
			payload: serde_json::to_value(payload)?,
		})
	}

	pub fn with_success(mut self, success: bool) -> Self {
		self.success = success;
		self
	}

	pub fn envelope(&self) -> Success<&serde_json::Value> {
		Success {
			success: self.success,
			payload: &self.payload,
		}
	}
}

/// Pretty-prints `value` as one JSON document on stdout.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
	let mut stdout = io::stdout().lock();
	serde_json::to_writer_pretty(&mut stdout, value)?;
	writeln!(stdout)?;
	stdout.flush()
}
