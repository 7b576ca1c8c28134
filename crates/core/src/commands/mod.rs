//! Command flows.
//!
//! Each flow connects, makes sure the organizer is logged in (except the
//! `auth` flows that manage login themselves), does its page work, updates
//! the state file and disconnects, on failure as well as on success. Flows
//! return serializable payloads; the caller wraps them in an output envelope.

pub mod auth;
pub mod session;
pub mod speaker;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::debug;

use crate::auth::require_login;
use crate::error::Result;
use crate::options::Options;
use crate::page::PageLike;
use crate::remote::{BrowserDriver, Connected, SessionManager, SessionProvider};
use crate::state::StateStore;

/// Everything a flow needs: merged options, the state file and the collaborators.
pub struct CommandContext {
	pub options: Options,
	pub state: StateStore,
	provider: Arc<dyn SessionProvider>,
	driver: Arc<dyn BrowserDriver>,
}

impl CommandContext {
	pub fn new(options: Options, state: StateStore, provider: Arc<dyn SessionProvider>, driver: Arc<dyn BrowserDriver>) -> Self {
		Self {
			options,
			state,
			provider,
			driver,
		}
	}

	/// Connects to the remote browser, optionally ensuring a login.
	async fn open(&self, login: bool) -> Result<Connection> {
		let mut manager = SessionManager::new(Arc::clone(&self.provider), Arc::clone(&self.driver), self.state.clone());
		let connected = manager
			.connect(self.options.api_key.as_deref(), self.options.project_id.as_deref())
			.await?;
		let connection = Connection { manager, connected };
		if login {
			let verified = match connection.page() {
				Ok(page) => require_login(page, &self.options.credentials(), &self.state).await,
				Err(e) => Err(e),
			};
			if let Err(e) = verified {
				connection.close().await;
				return Err(e);
			}
		}
		Ok(connection)
	}
}

/// A live remote session for the duration of one flow.
struct Connection {
	manager: SessionManager,
	connected: Connected,
}

impl Connection {
	fn page(&self) -> Result<&dyn PageLike> {
		self.manager.require_page()
	}

	/// Passes `result` through after disconnecting.
	async fn finish<T>(self, result: Result<T>) -> Result<T> {
		self.close().await;
		result
	}

	async fn close(mut self) {
		debug!(session_id = %self.connected.session_id, "closing flow connection");
		self.manager.disconnect().await;
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.trim().is_empty())
}
