//! Durable cross-invocation state.
//!
//! A single JSON record holding the remote session id, the login flag and the
//! "current session" cursor. Every change is a read-merge-write of the whole
//! file with no locking; concurrent processes race and the last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

pub const STATE_FILE_NAME: &str = ".sessionize-cli-state.json";

/// Overrides the state file location.
pub const STATE_FILE_ENV: &str = "SESSIONIZE_STATE_FILE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
	#[serde(alias = "browserbaseSessionId")]
	pub remote_session_id: Option<String>,
	pub logged_in: bool,
	pub current_session_id: Option<String>,
	pub event_id: Option<String>,
	pub evaluation_id: Option<String>,
}

/// Fields to change in a [`PersistedState`]; `None` leaves a field untouched.
///
/// Nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
	pub remote_session_id: Option<Option<String>>,
	pub logged_in: Option<bool>,
	pub current_session_id: Option<Option<String>>,
	pub event_id: Option<Option<String>>,
	pub evaluation_id: Option<Option<String>>,
}

impl StatePatch {
	pub fn remote_session_id(mut self, id: Option<String>) -> Self {
		self.remote_session_id = Some(id);
		self
	}

	pub fn logged_in(mut self, logged_in: bool) -> Self {
		self.logged_in = Some(logged_in);
		self
	}

	pub fn current_session_id(mut self, id: Option<String>) -> Self {
		self.current_session_id = Some(id);
		self
	}

	pub fn event_id(mut self, id: Option<String>) -> Self {
		self.event_id = Some(id);
		self
	}

	pub fn evaluation_id(mut self, id: Option<String>) -> Self {
		self.evaluation_id = Some(id);
		self
	}

	pub fn apply_to(self, state: &mut PersistedState) {
		if let Some(v) = self.remote_session_id {
			state.remote_session_id = v;
		}
		if let Some(v) = self.logged_in {
			state.logged_in = v;
		}
		if let Some(v) = self.current_session_id {
			state.current_session_id = v;
		}
		if let Some(v) = self.event_id {
			state.event_id = v;
		}
		if let Some(v) = self.evaluation_id {
			state.evaluation_id = v;
		}
	}
}

#[derive(Debug, Clone)]
pub struct StateStore {
	path: PathBuf,
}

impl StateStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `$SESSIONIZE_STATE_FILE`, else `~/.sessionize-cli-state.json`.
	pub fn from_env() -> Self {
		match std::env::var_os(STATE_FILE_ENV) {
			Some(path) if !path.is_empty() => Self::new(path),
			_ => Self::new(Self::default_path()),
		}
	}

	pub fn default_path() -> PathBuf {
		dirs::home_dir()
			.unwrap_or_else(std::env::temp_dir)
			.join(STATE_FILE_NAME)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the record. A missing or unreadable file yields the default record.
	pub fn load(&self) -> PersistedState {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(_) => return PersistedState::default(),
		};
		match serde_json::from_str(&content) {
			Ok(state) => state,
			Err(e) => {
				warn!(path = %self.path.display(), error = %e, "state file is corrupt; using defaults");
				PersistedState::default()
			}
		}
	}

	pub fn save(&self, state: &PersistedState) -> Result<()> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(state)?)?;
		Ok(())
	}

	/// Merges `patch` over the stored record and writes it back.
	pub fn update(&self, patch: StatePatch) -> Result<PersistedState> {
		let mut state = self.load();
		debug!(?patch, "updating state");
		patch.apply_to(&mut state);
		self.save(&state)?;
		Ok(state)
	}

	pub fn reset(&self) -> Result<PersistedState> {
		let state = PersistedState::default();
		self.save(&state)?;
		Ok(state)
	}
}
