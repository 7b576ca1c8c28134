//! Acquisition and reuse of the hosted remote browser.
//!
//! [`SessionManager::connect`] reuses the persisted remote session when the
//! provider still reports it running, and otherwise creates a keep-alive
//! session. Exactly one page handle is live at a time.

use std::sync::Arc;

use async_trait::async_trait;
use sessionize_protocol::SessionStatus;
use sessionize_runtime::{BrowserbaseClient, CdpConnection, CdpPage};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::page::PageLike;
use crate::state::{StatePatch, StateStore};

/// A browser instance hosted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
	pub id: String,
	pub connect_endpoint: String,
	pub status: SessionStatus,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
	async fn create(&self, project_id: &str, keep_alive: bool) -> Result<RemoteSession>;

	async fn retrieve(&self, id: &str) -> Result<RemoteSession>;
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
	/// Attaches to the first page of the browser behind `connect_endpoint`.
	async fn attach(&self, connect_endpoint: &str) -> Result<Box<dyn PageLike>>;
}

#[async_trait]
impl SessionProvider for BrowserbaseClient {
	async fn create(&self, project_id: &str, keep_alive: bool) -> Result<RemoteSession> {
		let session = self.create_session(project_id, keep_alive).await?;
		Ok(RemoteSession {
			connect_endpoint: self.connect_url_for(&session)?,
			id: session.id,
			status: session.status,
		})
	}

	async fn retrieve(&self, id: &str) -> Result<RemoteSession> {
		let session = self.retrieve_session(id).await?;
		Ok(RemoteSession {
			connect_endpoint: self.connect_url_for(&session)?,
			id: session.id,
			status: session.status,
		})
	}
}

/// Drives the hosted browser over the DevTools protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdpDriver;

#[async_trait]
impl BrowserDriver for CdpDriver {
	async fn attach(&self, connect_endpoint: &str) -> Result<Box<dyn PageLike>> {
		let connection = Arc::new(CdpConnection::connect(connect_endpoint).await?);
		match CdpPage::attach(Arc::clone(&connection)).await {
			Ok(page) => Ok(Box::new(page)),
			Err(e) => {
				connection.close().await;
				Err(e.into())
			}
		}
	}
}

/// Outcome of [`SessionManager::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
	pub session_id: String,
	pub reused: bool,
}

struct Active {
	page: Box<dyn PageLike>,
	session_id: String,
}

pub struct SessionManager {
	provider: Arc<dyn SessionProvider>,
	driver: Arc<dyn BrowserDriver>,
	state: StateStore,
	active: Option<Active>,
}

impl SessionManager {
	pub fn new(provider: Arc<dyn SessionProvider>, driver: Arc<dyn BrowserDriver>, state: StateStore) -> Self {
		Self {
			provider,
			driver,
			state,
			active: None,
		}
	}

	pub fn state(&self) -> &StateStore {
		&self.state
	}

	/// Reuses the persisted session if it is still running, else creates one.
	///
	/// Any failure while retrieving or attaching to the persisted session
	/// means "session gone": the persisted id and login flag are cleared and
	/// a fresh keep-alive session is created.
	pub async fn connect(&mut self, api_key: Option<&str>, project_id: Option<&str>) -> Result<Connected> {
		let (Some(_), Some(project_id)) = (non_empty(api_key), non_empty(project_id)) else {
			return Err(Error::config("Missing required: --api-key and --project-id"));
		};

		self.disconnect().await;

		if let Some(previous) = self.state.load().remote_session_id {
			match self.try_reuse(&previous).await {
				Ok(page) => {
					info!(session_id = %previous, "reusing remote browser session");
					self.state.update(StatePatch::default().remote_session_id(Some(previous.clone())))?;
					self.active = Some(Active {
						page,
						session_id: previous.clone(),
					});
					return Ok(Connected {
						session_id: previous,
						reused: true,
					});
				}
				Err(e) => {
					warn!(session_id = %previous, error = %e, "persisted session unusable; starting a new one");
					self.state
						.update(StatePatch::default().remote_session_id(None).logged_in(false))?;
				}
			}
		}

		let session = self.provider.create(project_id, true).await?;
		info!(session_id = %session.id, "created remote browser session");
		self.state
			.update(StatePatch::default().remote_session_id(Some(session.id.clone())))?;

		let page = self.driver.attach(&session.connect_endpoint).await?;
		self.active = Some(Active {
			page,
			session_id: session.id.clone(),
		});
		Ok(Connected {
			session_id: session.id,
			reused: false,
		})
	}

	async fn try_reuse(&self, id: &str) -> Result<Box<dyn PageLike>> {
		let session = self.provider.retrieve(id).await?;
		if !session.status.is_running() {
			return Err(Error::not_found(format!("remote session {id} is {}", session.status)));
		}
		self.driver.attach(&session.connect_endpoint).await
	}

	/// The page of the active session, if connected.
	pub fn page(&self) -> Option<&dyn PageLike> {
		self.active.as_ref().map(|a| a.page.as_ref())
	}

	/// Like [`page`](Self::page), for flows that require a connection.
	pub fn require_page(&self) -> Result<&dyn PageLike> {
		self.page().ok_or_else(|| Error::config("Not connected to a remote browser session"))
	}

	pub fn session_id(&self) -> Option<&str> {
		self.active.as_ref().map(|a| a.session_id.as_str())
	}

	/// Closes the local control connection. The remote session stays alive.
	pub async fn disconnect(&mut self) {
		if let Some(active) = self.active.take() {
			active.page.close().await;
			debug!(session_id = %active.session_id, "disconnected from remote session");
		}
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;
	use crate::state::PersistedState;
	use crate::testing::{MockAction, MockDriver, MockPage, MockProvider, ProviderCall};

	struct Fixture {
		_dir: TempDir,
		provider: Arc<MockProvider>,
		driver: Arc<MockDriver>,
		page: MockPage,
		manager: SessionManager,
	}

	fn fixture() -> Fixture {
		let dir = TempDir::new().unwrap();
		let provider = Arc::new(MockProvider::new());
		let page = MockPage::new();
		let driver = Arc::new(MockDriver::new(page.clone()));
		let manager = SessionManager::new(
			provider.clone(),
			driver.clone(),
			StateStore::new(dir.path().join("state.json")),
		);
		Fixture {
			_dir: dir,
			provider,
			driver,
			page,
			manager,
		}
	}

	#[tokio::test]
	async fn missing_credentials_is_config_error() {
		let mut fx = fixture();
		let err = fx.manager.connect(None, Some("proj")).await.unwrap_err();
		assert!(matches!(err, Error::Config(_)));
		let err = fx.manager.connect(Some("key"), Some("  ")).await.unwrap_err();
		assert!(matches!(err, Error::Config(_)));
		assert!(fx.provider.calls().is_empty());
	}

	#[tokio::test]
	async fn fresh_connect_creates_keep_alive_session_and_persists_id() {
		let mut fx = fixture();
		let connected = fx.manager.connect(Some("key"), Some("proj")).await.unwrap();

		assert!(!connected.reused);
		assert_eq!(
			fx.provider.calls(),
			vec![ProviderCall::Create {
				project_id: "proj".into(),
				keep_alive: true
			}]
		);
		assert_eq!(
			fx.manager.state().load().remote_session_id.as_deref(),
			Some(connected.session_id.as_str())
		);
		assert!(fx.manager.page().is_some());
	}

	#[tokio::test]
	async fn running_session_is_reused() {
		let mut fx = fixture();
		fx.provider.insert("bb-7", SessionStatus::Running);
		fx.manager
			.state()
			.save(&PersistedState {
				remote_session_id: Some("bb-7".into()),
				logged_in: true,
				..Default::default()
			})
			.unwrap();

		let connected = fx.manager.connect(Some("key"), Some("proj")).await.unwrap();

		assert_eq!(
			connected,
			Connected {
				session_id: "bb-7".into(),
				reused: true
			}
		);
		assert_eq!(fx.provider.calls(), vec![ProviderCall::Retrieve("bb-7".into())]);
		assert!(fx.manager.state().load().logged_in);
	}

	#[tokio::test]
	async fn non_running_session_is_replaced_on_next_connect() {
		let mut fx = fixture();
		let first = fx.manager.connect(Some("key"), Some("proj")).await.unwrap();
		fx.manager.state().update(StatePatch::default().logged_in(true)).unwrap();
		fx.manager.disconnect().await;

		fx.provider.set_status(&first.session_id, SessionStatus::Completed);
		let second = fx.manager.connect(Some("key"), Some("proj")).await.unwrap();

		assert!(!second.reused);
		assert_ne!(second.session_id, first.session_id);
		let state = fx.manager.state().load();
		assert_eq!(state.remote_session_id.as_deref(), Some(second.session_id.as_str()));
		assert!(!state.logged_in);
		assert_eq!(fx.provider.created(), 2);
	}

	#[tokio::test]
	async fn retrieval_failure_is_treated_as_gone() {
		let mut fx = fixture();
		fx.manager
			.state()
			.update(StatePatch::default().remote_session_id(Some("vanished".into())))
			.unwrap();

		let connected = fx.manager.connect(Some("key"), Some("proj")).await.unwrap();
		assert!(!connected.reused);
		assert_eq!(fx.provider.created(), 1);
	}

	#[tokio::test]
	async fn attach_failure_on_reuse_falls_back_to_new_session() {
		let mut fx = fixture();
		fx.provider.insert("bb-1", SessionStatus::Running);
		fx.manager
			.state()
			.update(StatePatch::default().remote_session_id(Some("bb-1".into())))
			.unwrap();
		fx.driver.fail_next_attach("socket refused");

		let connected = fx.manager.connect(Some("key"), Some("proj")).await.unwrap();
		assert!(!connected.reused);
		assert_eq!(fx.driver.attached().len(), 1);
	}

	#[tokio::test]
	async fn disconnect_is_idempotent_and_closes_page() {
		let mut fx = fixture();
		fx.manager.connect(Some("key"), Some("proj")).await.unwrap();

		fx.manager.disconnect().await;
		fx.manager.disconnect().await;

		assert!(fx.manager.page().is_none());
		let closes = fx.page.actions().into_iter().filter(|a| *a == MockAction::Close).count();
		assert_eq!(closes, 1);
	}
}
