//! CDP connection over the hosted browser's control WebSocket.
//!
//! The socket is split into two tasks:
//! - a writer that owns the sink and drains an outbound channel
//! - a reader that parses every frame as a [`CdpMessage`], completes the
//!   matching pending command, or fans events out to subscribers
//!
//! Page-scoped commands carry the flattened target `sessionId`; subscribers
//! can filter on it so that browser-level and page-level events do not mix.


use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sessionize_protocol::{CdpEvent, CdpMessage, CdpRequest, CdpResponse};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Default per-command response timeout.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>;

struct Listener {
	method: String,
	session_id: Option<String>,
	tx: mpsc::UnboundedSender<CdpEvent>,
}

impl Listener {
	fn wants(&self, event: &CdpEvent) -> bool {
		self.method == event.method && (self.session_id.is_none() || self.session_id == event.session_id)
	}
}

/// A live CDP connection.
///
/// Dropping the connection aborts both socket tasks; [`close`](Self::close)
/// additionally sends a close frame so the remote end sees a clean disconnect.
pub struct CdpConnection {
	endpoint: String,
	outbound: mpsc::Sender<Message>,
	pending: PendingMap,
	listeners: Arc<Mutex<Vec<Listener>>>,
	next_id: AtomicU64,
	closed: Arc<AtomicBool>,
	command_timeout: Duration,
	reader: JoinHandle<()>,
	writer: JoinHandle<()>,
}

impl CdpConnection {
	/// Opens a WebSocket to `ws_url` and starts the reader/writer tasks.
	pub async fn connect(ws_url: &str) -> Result<Self> {
		let (stream, _) = connect_async(ws_url).await.map_err(|e| Error::ConnectionFailed {
			endpoint: redact_endpoint(ws_url),
			reason: e.to_string(),
		})?;
		let (mut sink, mut source) = stream.split();

		let (outbound, mut outbound_rx) = mpsc::channel::<Message>(256);
		let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
		let listeners: Arc<Mutex<Vec<Listener>>> = Arc::new(Mutex::new(Vec::new()));
		let closed = Arc::new(AtomicBool::new(false));

		let writer = tokio::spawn(async move {
			while let Some(msg) = outbound_rx.recv().await {
				let is_close = matches!(msg, Message::Close(_));
				if let Err(e) = sink.send(msg).await {
					warn!(target: "sessionize::cdp", error = %e, "CDP socket write failed");
					break;
				}
				if is_close {
					break;
				}
			}
		});

		let reader_pending = Arc::clone(&pending);
		let reader_listeners = Arc::clone(&listeners);
		let reader_closed = Arc::clone(&closed);
		let reader = tokio::spawn(async move {
			while let Some(frame) = source.next().await {
				match frame {
					Ok(Message::Text(text)) => dispatch(&text, &reader_pending, &reader_listeners),
					Ok(Message::Close(_)) => {
						debug!(target: "sessionize::cdp", "CDP socket closed by remote");
						break;
					}
					Ok(_) => {}
					Err(e) => {
						warn!(target: "sessionize::cdp", error = %e, "CDP socket read failed");
						break;
					}
				}
			}
			reader_closed.store(true, Ordering::SeqCst);
			// Dropping the senders wakes every waiter with ChannelClosed.
			reader_pending.lock().clear();
			reader_listeners.lock().clear();
		});

		debug!(target: "sessionize::cdp", endpoint = %redact_endpoint(ws_url), "CDP connection established");

		Ok(Self {
			endpoint: ws_url.to_string(),
			outbound,
			pending,
			listeners,
			next_id: AtomicU64::new(1),
			closed,
			command_timeout: COMMAND_TIMEOUT,
			reader,
			writer,
		})
	}

	/// Overrides the per-command response timeout.
	pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
		self.command_timeout = timeout;
		self
	}

	/// Endpoint this connection was opened against, with credentials stripped.
	pub fn endpoint(&self) -> String {
		redact_endpoint(&self.endpoint)
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Sends `method` and waits for its result.
	pub async fn send(&self, method: &str, params: Value, session_id: Option<&str>) -> Result<Value> {
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let request = CdpRequest {
			id,
			method: method.to_string(),
			params,
			session_id: session_id.map(str::to_string),
		};
		let payload = serde_json::to_string(&request)?;

		let (tx, rx) = oneshot::channel();
		self.pending.lock().insert(id, tx);

		trace!(target: "sessionize::cdp", id, method, "-> command");
		if self.outbound.send(Message::Text(payload)).await.is_err() {
			self.pending.lock().remove(&id);
			return Err(Error::ChannelClosed);
		}

		let response = match tokio::time::timeout(self.command_timeout, rx).await {
			Ok(Ok(response)) => response,
			Ok(Err(_)) => return Err(Error::ChannelClosed),
			Err(_) => {
				self.pending.lock().remove(&id);
				return Err(Error::Timeout {
					what: format!("response to {method}"),
					ms: self.command_timeout.as_millis() as u64,
				});
			}
		};

		if let Some(error) = response.error {
			return Err(Error::Protocol {
				method: method.to_string(),
				message: error.message,
			});
		}
		Ok(response.result.unwrap_or(Value::Null))
	}

	/// Sends `method` and deserializes the result into `T`.
	pub async fn send_as<T: DeserializeOwned>(&self, method: &str, params: Value, session_id: Option<&str>) -> Result<T> {
		let value = self.send(method, params, session_id).await?;
		Ok(serde_json::from_value(value)?)
	}

	/// Subscribes to `method` events, optionally restricted to one target session.
	pub fn subscribe(&self, method: &str, session_id: Option<&str>) -> mpsc::UnboundedReceiver<CdpEvent> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.listeners.lock().push(Listener {
			method: method.to_string(),
			session_id: session_id.map(str::to_string),
			tx,
		});
		rx
	}

	/// Sends a close frame and stops both socket tasks. Idempotent.
	pub async fn close(&self) {
		if self.closed.swap(true, Ordering::SeqCst) {
			return;
		}
		let _ = self.outbound.send(Message::Close(None)).await;
		// Give the writer a moment to flush the close frame.
		let _ = tokio::time::timeout(Duration::from_millis(500), self.outbound.closed()).await;
		self.reader.abort();
		self.pending.lock().clear();
		self.listeners.lock().clear();
		debug!(target: "sessionize::cdp", endpoint = %self.endpoint(), "CDP connection closed");
	}
}

impl Drop for CdpConnection {
	fn drop(&mut self) {
		self.reader.abort();
		self.writer.abort();
	}
}

fn dispatch(text: &str, pending: &PendingMap, listeners: &Mutex<Vec<Listener>>) {
	let message = match serde_json::from_str::<CdpMessage>(text) {
		Ok(message) => message,
		Err(e) => {
			debug!(target: "sessionize::cdp", error = %e, "ignoring unparseable CDP frame");
			return;
		}
	};

	match message {
		CdpMessage::Response(response) => {
			trace!(target: "sessionize::cdp", id = response.id, "<- response");
			if let Some(tx) = pending.lock().remove(&response.id) {
				let _ = tx.send(response);
			}
		}
		CdpMessage::Event(event) => {
			let mut listeners = listeners.lock();
			listeners.retain(|l| !l.tx.is_closed());
			for listener in listeners.iter().filter(|l| l.wants(&event)) {
				let _ = listener.tx.send(event.clone());
			}
		}
	}
}

/// Strips query-string credentials (`apiKey=...`) from an endpoint for logging.
pub fn redact_endpoint(endpoint: &str) -> String {
	match endpoint.split_once('?') {
		Some((base, _)) => format!("{base}?<redacted>"),
		None => endpoint.to_string(),
	}
}
