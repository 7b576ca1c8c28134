//! REST client for hosted browser sessions.

use std::time::Duration;

use serde::de::DeserializeOwned;
use sessionize_protocol::{CreateSessionRequest, SessionResponse};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.browserbase.com/v1";
pub const DEFAULT_CONNECT_BASE: &str = "wss://connect.browserbase.com";

const API_KEY_HEADER: &str = "X-BB-API-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BrowserbaseClient {
	http: reqwest::Client,
	api_key: String,
	base_url: String,
	connect_base: String,
}

impl BrowserbaseClient {
	pub fn new(api_key: impl Into<String>) -> Result<Self> {
		let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
		Ok(Self {
			http,
			api_key: api_key.into(),
			base_url: DEFAULT_API_BASE.to_string(),
			connect_base: DEFAULT_CONNECT_BASE.to_string(),
		})
	}

	/// Points the client at a different API root (trailing slash optional).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	pub fn with_connect_base(mut self, connect_base: impl Into<String>) -> Self {
		self.connect_base = connect_base.into();
		self
	}

	/// `POST /sessions`.
	pub async fn create_session(&self, project_id: &str, keep_alive: bool) -> Result<SessionResponse> {
		let body = CreateSessionRequest {
			project_id: project_id.to_string(),
			keep_alive,
		};
		let response = self
			.http
			.post(format!("{}/sessions", self.base_url))
			.header(API_KEY_HEADER, &self.api_key)
			.json(&body)
			.send()
			.await?;
		let session: SessionResponse = read_json(response).await?;
		debug!(target: "sessionize::browserbase", id = %session.id, status = %session.status, "created remote session");
		Ok(session)
	}

	/// `GET /sessions/{id}`.
	pub async fn retrieve_session(&self, id: &str) -> Result<SessionResponse> {
		let response = self
			.http
			.get(format!("{}/sessions/{id}", self.base_url))
			.header(API_KEY_HEADER, &self.api_key)
			.send()
			.await?;
		let session: SessionResponse = read_json(response).await?;
		debug!(target: "sessionize::browserbase", id = %session.id, status = %session.status, "retrieved remote session");
		Ok(session)
	}

	/// Control endpoint for `session`: its own `connectUrl`, or one derived
	/// from the API key and session id.
	pub fn connect_url_for(&self, session: &SessionResponse) -> Result<String> {
		if let Some(url) = session.connect_url.as_deref().filter(|u| !u.is_empty()) {
			return Ok(url.to_string());
		}
		let mut url = Url::parse(&self.connect_base).map_err(|e| Error::ConnectionFailed {
			endpoint: self.connect_base.clone(),
			reason: e.to_string(),
		})?;
		url.query_pairs_mut()
			.append_pair("apiKey", &self.api_key)
			.append_pair("sessionId", &session.id);
		Ok(url.into())
	}
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
	let status = response.status();
	if !status.is_success() {
		let body = response.text().await.unwrap_or_default();
		return Err(Error::Http {
			status: status.as_u16(),
			body: truncate(&body, 300),
		});
	}
	let bytes = response.bytes().await?;
	Ok(serde_json::from_slice(&bytes)?)
}

fn truncate(s: &str, max: usize) -> String {
	match s.char_indices().nth(max) {
		Some((idx, _)) => format!("{}...", &s[..idx]),
		None => s.to_string(),
	}
}
