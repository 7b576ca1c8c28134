//! Request/response bodies of the hosted-browser session REST API.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Body of `POST /v1/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
	pub project_id: String,
	/// Keeps the browser alive after the control connection drops.
	pub keep_alive: bool,
}

/// Lifecycle status reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
	Running,
	Error,
	TimedOut,
	Completed,
	Other(String),
}

impl SessionStatus {
	pub fn as_str(&self) -> &str {
		match self {
			SessionStatus::Running => "RUNNING",
			SessionStatus::Error => "ERROR",
			SessionStatus::TimedOut => "TIMED_OUT",
			SessionStatus::Completed => "COMPLETED",
			SessionStatus::Other(s) => s,
		}
	}

	pub fn is_running(&self) -> bool {
		matches!(self, SessionStatus::Running)
	}
}

impl From<&str> for SessionStatus {
	fn from(s: &str) -> Self {
		match s {
			"RUNNING" => SessionStatus::Running,
			"ERROR" => SessionStatus::Error,
			"TIMED_OUT" => SessionStatus::TimedOut,
			"COMPLETED" => SessionStatus::Completed,
			other => SessionStatus::Other(other.to_string()),
		}
	}
}

impl fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for SessionStatus {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for SessionStatus {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Ok(SessionStatus::from(s.as_str()))
	}
}

/// Session object returned by create and retrieve.
///
/// Retrieve responses may omit `connectUrl`; callers derive it in that case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connect_url: Option<String>,
	#[serde(default = "default_status")]
	pub status: SessionStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub project_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<String>,
}

fn default_status() -> SessionStatus {
	SessionStatus::Running
}
