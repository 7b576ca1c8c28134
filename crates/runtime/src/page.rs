//! A single attached page target.
//!
//! [`CdpPage::attach`] picks the first page target of the remote browser (the
//! hosted browser opens one per default context), attaches to it in flattened
//! mode, enables the `Page`, `Runtime` and `Network` domains, and starts a
//! background task that tracks in-flight requests for
//! [`wait_for_network_idle`](CdpPage::wait_for_network_idle).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::{Value, json};
use sessionize_protocol::{
	AttachToTargetResult, CdpEvent, CreateTargetResult, EvaluateResult, GetTargetsResult, NavigateResult, NetworkRequestEvent,
};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::connection::CdpConnection;
use crate::error::{Error, Result};

/// Quiet period with zero in-flight requests that counts as "network idle".
pub const NETWORK_QUIET: Duration = Duration::from_millis(500);

const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct NetworkState {
	inflight: HashSet<String>,
	last_activity: Instant,
}

/// In-flight request bookkeeping shared with the tracker task.
#[derive(Debug)]
pub struct NetworkTracker {
	state: Mutex<NetworkState>,
}

impl NetworkTracker {
	fn new() -> Self {
		Self {
			state: Mutex::new(NetworkState {
				inflight: HashSet::new(),
				last_activity: Instant::now(),
			}),
		}
	}

	fn started(&self, request_id: String) {
		let mut state = self.state.lock();
		state.inflight.insert(request_id);
		state.last_activity = Instant::now();
	}

	fn finished(&self, request_id: &str) {
		let mut state = self.state.lock();
		state.inflight.remove(request_id);
		state.last_activity = Instant::now();
	}

	/// Marks activity without a request (navigation start).
	fn touch(&self) {
		self.state.lock().last_activity = Instant::now();
	}

	fn is_idle(&self, quiet: Duration) -> bool {
		let state = self.state.lock();
		state.inflight.is_empty() && state.last_activity.elapsed() >= quiet
	}

	pub fn inflight(&self) -> usize {
		self.state.lock().inflight.len()
	}
}

/// Attached page target.
pub struct CdpPage {
	connection: Arc<CdpConnection>,
	target_id: String,
	session_id: String,
	network: Arc<NetworkTracker>,
	tracker: JoinHandle<()>,
}

impl CdpPage {
	/// Attaches to the first page target, creating one if the browser has none.
	pub async fn attach(connection: Arc<CdpConnection>) -> Result<Self> {
		let targets: GetTargetsResult = connection.send_as("Target.getTargets", json!({}), None).await?;
		let target_id = match targets.target_infos.into_iter().find(|t| t.kind == "page") {
			Some(target) => target.target_id,
			None => {
				debug!(target: "sessionize::cdp", "no page target found; creating one");
				let created: CreateTargetResult = connection
					.send_as("Target.createTarget", json!({ "url": "about:blank" }), None)
					.await
					.map_err(|_| Error::NoPageTarget)?;
				created.target_id
			}
		};

		let attached: AttachToTargetResult = connection
			.send_as("Target.attachToTarget", json!({ "targetId": target_id, "flatten": true }), None)
			.await?;
		let session_id = attached.session_id;

		let network = Arc::new(NetworkTracker::new());
		let tracker = spawn_network_tracker(&connection, &session_id, Arc::clone(&network));

		for domain in ["Page", "Runtime", "Network"] {
			connection.send(&format!("{domain}.enable"), json!({}), Some(&session_id)).await?;
		}

		debug!(target: "sessionize::cdp", target_id = %target_id, session_id = %session_id, "attached to page target");

		Ok(Self {
			connection,
			target_id,
			session_id,
			network,
			tracker,
		})
	}

	pub fn target_id(&self) -> &str {
		&self.target_id
	}

	pub fn connection(&self) -> &Arc<CdpConnection> {
		&self.connection
	}

	async fn send(&self, method: &str, params: Value) -> Result<Value> {
		self.connection.send(method, params, Some(&self.session_id)).await
	}

	/// Navigates and waits (bounded) for `DOMContentLoaded`.
	///
	/// A navigation the browser rejects is an error; a slow load is not.
	pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
		let mut dom_ready = self.connection.subscribe("Page.domContentEventFired", Some(&self.session_id));
		self.network.touch();

		let value = self.send("Page.navigate", json!({ "url": url })).await?;
		let result: NavigateResult = serde_json::from_value(value)?;
		if let Some(reason) = result.error_text.filter(|t| !t.is_empty()) {
			return Err(Error::Navigation {
				url: url.to_string(),
				reason,
			});
		}

		if tokio::time::timeout(timeout, dom_ready.recv()).await.is_err() {
			debug!(target: "sessionize::cdp", url, timeout_ms = timeout.as_millis() as u64, "DOMContentLoaded not observed; continuing");
		}
		Ok(())
	}

	/// Evaluates `function` (JavaScript function source) applied to `args`.
	///
	/// The function receives `args` as its single argument; promises are awaited
	/// and the result is returned by value. `undefined` becomes `null`.
	pub async fn evaluate(&self, function: &str, args: &Value) -> Result<Value> {
		let expression = format!("({function})({})", serde_json::to_string(args)?);
		let value = self
			.send(
				"Runtime.evaluate",
				json!({
					"expression": expression,
					"returnByValue": true,
					"awaitPromise": true,
				}),
			)
			.await?;
		let result: EvaluateResult = serde_json::from_value(value)?;
		if let Some(details) = result.exception_details {
			return Err(Error::Evaluation(details.message()));
		}
		Ok(result.result.value.unwrap_or(Value::Null))
	}

	/// Waits until no request has been in flight for [`NETWORK_QUIET`].
	pub async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
		let started = Instant::now();
		loop {
			if self.network.is_idle(NETWORK_QUIET) {
				return Ok(());
			}
			if started.elapsed() >= timeout {
				return Err(Error::Timeout {
					what: format!("network idle ({} in flight)", self.network.inflight()),
					ms: timeout.as_millis() as u64,
				});
			}
			tokio::time::sleep(IDLE_POLL).await;
		}
	}

	pub async fn current_url(&self) -> Result<String> {
		let value = self.evaluate("() => window.location.href", &Value::Null).await?;
		Ok(value.as_str().unwrap_or_default().to_string())
	}

	/// Detaches from the target. The browser and its pages stay alive.
	pub async fn detach(&self) {
		self.tracker.abort();
		let _ = self
			.connection
			.send("Target.detachFromTarget", json!({ "sessionId": self.session_id }), None)
			.await;
	}
}

impl Drop for CdpPage {
	fn drop(&mut self) {
		self.tracker.abort();
	}
}

fn spawn_network_tracker(connection: &CdpConnection, session_id: &str, network: Arc<NetworkTracker>) -> JoinHandle<()> {
	let mut sent = connection.subscribe("Network.requestWillBeSent", Some(session_id));
	let mut finished = connection.subscribe("Network.loadingFinished", Some(session_id));
	let mut failed = connection.subscribe("Network.loadingFailed", Some(session_id));

	tokio::spawn(async move {
		loop {
			tokio::select! {
				Some(event) = sent.recv() => {
					if let Some(id) = request_id(&event) {
						trace!(target: "sessionize::cdp", request_id = %id, "request started");
						network.started(id);
					}
				}
				Some(event) = finished.recv() => {
					if let Some(id) = request_id(&event) {
						network.finished(&id);
					}
				}
				Some(event) = failed.recv() => {
					if let Some(id) = request_id(&event) {
						network.finished(&id);
					}
				}
				else => break,
			}
		}
	})
}

fn request_id(event: &CdpEvent) -> Option<String> {
	serde_json::from_value::<NetworkRequestEvent>(event.params.clone())
		.ok()
		.map(|e| e.request_id)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tracker_is_busy_while_requests_in_flight() {
		let tracker = NetworkTracker::new();
		tracker.started("1".into());
		tracker.started("2".into());
		tracker.finished("1");
		assert_eq!(tracker.inflight(), 1);
		assert!(!tracker.is_idle(Duration::ZERO));

		tracker.finished("2");
		assert!(tracker.is_idle(Duration::ZERO));
	}

	#[test]
	fn tracker_requires_quiet_period() {
		let tracker = NetworkTracker::new();
		tracker.touch();
		assert!(!tracker.is_idle(Duration::from_secs(60)));
		assert!(tracker.is_idle(Duration::ZERO));
	}

	#[test]
	fn unknown_request_finish_is_ignored() {
		let tracker = NetworkTracker::new();
		tracker.finished("never-started");
		assert_eq!(tracker.inflight(), 0);
	}
}
