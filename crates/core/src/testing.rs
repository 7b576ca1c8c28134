//! Test doubles for the page, provider and driver seams.
//!
//! - [`MockPage`]: scripted per-script responses, an action log, a fake URL
//!   and instant sleeps
//! - [`MockProvider`]: an in-memory remote-session provider with a call log
//! - [`MockDriver`]: hands out clones of one [`MockPage`]
//!
//! # Example
//!
//! ```ignore
//! use sessionize::testing::MockPage;
//!
//! let page = MockPage::new();
//! page.respond("login-indicators", json!({ "hasLogout": true }));
//! assert!(sessionize::auth::is_logged_in(&page).await?);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sessionize_protocol::SessionStatus;

use crate::error::{Error, Result};
use crate::page::{PageLike, Script};
use crate::remote::{BrowserDriver, RemoteSession, SessionProvider};

type Responder = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Action recorded by [`MockPage`] for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAction {
	Goto(String),
	Evaluate { script: &'static str, args: Value },
	WaitForNetworkIdle(Duration),
	Sleep(Duration),
	Close,
}

#[derive(Default)]
struct PageState {
	url: String,
	queued: HashMap<&'static str, VecDeque<Responder>>,
	responders: HashMap<&'static str, Responder>,
	network_idle_fails: bool,
	actions: Vec<MockAction>,
}

/// Mock page keyed by script name.
///
/// Scripts without a configured response evaluate to `null`. One-shot
/// responses queued with [`respond_once`](Self::respond_once) are consumed
/// before the sticky response. Clones share state, so a test can keep a
/// handle to a page it gave away.
#[derive(Clone)]
pub struct MockPage {
	state: Arc<Mutex<PageState>>,
}

impl Default for MockPage {
	fn default() -> Self {
		Self::new()
	}
}

impl MockPage {
	/// Creates a mock page at `about:blank`.
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(PageState {
				url: "about:blank".to_string(),
				..Default::default()
			})),
		}
	}

	pub fn set_url(&self, url: &str) {
		self.state.lock().url = url.to_string();
	}

	/// Sets the sticky result for `script`.
	pub fn respond(&self, script: &'static str, value: Value) {
		self.respond_with(script, move |_| Ok(value.clone()));
	}

	/// Sets a sticky responder computing the result from the script's arguments.
	pub fn respond_with(&self, script: &'static str, f: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static) {
		self.state.lock().responders.insert(script, Arc::new(f));
	}

	/// Queues a one-shot result for `script`.
	pub fn respond_once(&self, script: &'static str, value: Value) {
		let responder: Responder = Arc::new(move |_| Ok(value.clone()));
		self.state.lock().queued.entry(script).or_default().push_back(responder);
	}

	/// Makes every evaluation of `script` throw.
	pub fn fail_script(&self, script: &'static str, message: &str) {
		let message = message.to_string();
		self.respond_with(script, move |_| {
			Err(sessionize_runtime::Error::Evaluation(message.clone()).into())
		});
	}

	pub fn set_network_idle_fails(&self, fails: bool) {
		self.state.lock().network_idle_fails = fails;
	}

	/// Returns all recorded actions.
	pub fn actions(&self) -> Vec<MockAction> {
		self.state.lock().actions.clone()
	}

	/// Names of evaluated scripts, in order.
	pub fn evaluated(&self) -> Vec<&'static str> {
		self.state
			.lock()
			.actions
			.iter()
			.filter_map(|a| match a {
				MockAction::Evaluate { script, .. } => Some(*script),
				_ => None,
			})
			.collect()
	}

	/// Arguments of every evaluation of `script`.
	pub fn args_for(&self, script: &str) -> Vec<Value> {
		self.state
			.lock()
			.actions
			.iter()
			.filter_map(|a| match a {
				MockAction::Evaluate { script: s, args } if *s == script => Some(args.clone()),
				_ => None,
			})
			.collect()
	}

	/// URLs passed to [`PageLike::goto`], in order.
	pub fn visited(&self) -> Vec<String> {
		self.state
			.lock()
			.actions
			.iter()
			.filter_map(|a| match a {
				MockAction::Goto(url) => Some(url.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn clear_actions(&self) {
		self.state.lock().actions.clear();
	}

	fn record(&self, action: MockAction) {
		self.state.lock().actions.push(action);
	}
}

#[async_trait]
impl PageLike for MockPage {
	async fn goto(&self, url: &str) -> Result<()> {
		let mut state = self.state.lock();
		state.actions.push(MockAction::Goto(url.to_string()));
		state.url = url.to_string();
		Ok(())
	}

	async fn evaluate(&self, script: &Script, args: Value) -> Result<Value> {
		// Responders run outside the lock so they may drive the page.
		let responder = {
			let mut state = self.state.lock();
			state.actions.push(MockAction::Evaluate {
				script: script.name,
				args: args.clone(),
			});
			let queued = state.queued.get_mut(script.name).and_then(VecDeque::pop_front);
			queued.or_else(|| state.responders.get(script.name).cloned())
		};
		match responder {
			Some(f) => f(&args),
			None => Ok(Value::Null),
		}
	}

	async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
		self.record(MockAction::WaitForNetworkIdle(timeout));
		if self.state.lock().network_idle_fails {
			return Err(sessionize_runtime::Error::Timeout {
				what: "network idle".into(),
				ms: timeout.as_millis() as u64,
			}
			.into());
		}
		Ok(())
	}

	async fn sleep(&self, duration: Duration) {
		self.record(MockAction::Sleep(duration));
	}

	async fn current_url(&self) -> Result<String> {
		Ok(self.state.lock().url.clone())
	}

	async fn close(&self) {
		self.record(MockAction::Close);
	}
}

/// Call recorded by [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
	Create { project_id: String, keep_alive: bool },
	Retrieve(String),
}

#[derive(Default)]
struct ProviderState {
	sessions: HashMap<String, SessionStatus>,
	created: usize,
	calls: Vec<ProviderCall>,
}

/// In-memory remote-session provider.
///
/// Unknown ids fail retrieval with HTTP 404, like the hosted API.
#[derive(Default)]
pub struct MockProvider {
	state: Mutex<ProviderState>,
}

impl MockProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, id: &str, status: SessionStatus) {
		self.state.lock().sessions.insert(id.to_string(), status);
	}

	pub fn set_status(&self, id: &str, status: SessionStatus) {
		self.insert(id, status);
	}

	pub fn calls(&self) -> Vec<ProviderCall> {
		self.state.lock().calls.clone()
	}

	/// Number of sessions created so far.
	pub fn created(&self) -> usize {
		self.state.lock().created
	}

	fn endpoint(id: &str) -> String {
		format!("wss://mock.invalid/{id}")
	}
}

#[async_trait]
impl SessionProvider for MockProvider {
	async fn create(&self, project_id: &str, keep_alive: bool) -> Result<RemoteSession> {
		let mut state = self.state.lock();
		state.calls.push(ProviderCall::Create {
			project_id: project_id.to_string(),
			keep_alive,
		});
		state.created += 1;
		let id = format!("mock-session-{}", state.created);
		state.sessions.insert(id.clone(), SessionStatus::Running);
		Ok(RemoteSession {
			connect_endpoint: Self::endpoint(&id),
			id,
			status: SessionStatus::Running,
		})
	}

	async fn retrieve(&self, id: &str) -> Result<RemoteSession> {
		let mut state = self.state.lock();
		state.calls.push(ProviderCall::Retrieve(id.to_string()));
		match state.sessions.get(id) {
			Some(status) => Ok(RemoteSession {
				id: id.to_string(),
				connect_endpoint: Self::endpoint(id),
				status: status.clone(),
			}),
			None => Err(Error::Page(sessionize_runtime::Error::Http {
				status: 404,
				body: "session not found".into(),
			})),
		}
	}
}

/// Driver handing out clones of one [`MockPage`].
pub struct MockDriver {
	page: MockPage,
	attached: Mutex<Vec<String>>,
	fail_next: Mutex<Option<String>>,
}

impl MockDriver {
	pub fn new(page: MockPage) -> Self {
		Self {
			page,
			attached: Mutex::new(Vec::new()),
			fail_next: Mutex::new(None),
		}
	}

	/// Makes the next attach fail with a connection error.
	pub fn fail_next_attach(&self, reason: &str) {
		*self.fail_next.lock() = Some(reason.to_string());
	}

	/// Endpoints successfully attached to, in order.
	pub fn attached(&self) -> Vec<String> {
		self.attached.lock().clone()
	}
}

#[async_trait]
impl BrowserDriver for MockDriver {
	async fn attach(&self, connect_endpoint: &str) -> Result<Box<dyn PageLike>> {
		if let Some(reason) = self.fail_next.lock().take() {
			return Err(Error::Page(sessionize_runtime::Error::ConnectionFailed {
				endpoint: connect_endpoint.to_string(),
				reason,
			}));
		}
		self.attached.lock().push(connect_endpoint.to_string());
		Ok(Box::new(self.page.clone()))
	}
}
