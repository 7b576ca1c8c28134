//! The page capability every automation step runs against.
//!
//! A page exposes navigation, evaluation of an injected function over plain
//! JSON arguments, and wait primitives. Nothing else reaches the remote DOM.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sessionize_runtime::CdpPage;

use crate::error::Result;

/// Upper bound for `DOMContentLoaded` after a navigation.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// A named, self-contained JavaScript function.
///
/// `source` must be a function expression taking at most one argument; it is
/// applied to the JSON-encoded arguments inside the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Script {
	pub name: &'static str,
	pub source: &'static str,
}

impl Script {
	pub const fn new(name: &'static str, source: &'static str) -> Self {
		Self { name, source }
	}
}

#[async_trait]
pub trait PageLike: Send + Sync {
	/// Navigates to `url` and waits for the document to be parsed.
	async fn goto(&self, url: &str) -> Result<()>;

	/// Applies `script` to `args` inside the page and returns its JSON result.
	async fn evaluate(&self, script: &Script, args: Value) -> Result<Value>;

	/// Waits for network quiescence; expiry is an error the caller may ignore.
	async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()>;

	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}

	async fn current_url(&self) -> Result<String>;

	/// Releases the local control connection; the remote browser stays up.
	async fn close(&self) {}
}

/// Evaluates `script` and deserializes the result.
pub async fn evaluate_as<T: DeserializeOwned>(page: &dyn PageLike, script: &Script, args: Value) -> Result<T> {
	let value = page.evaluate(script, args).await?;
	Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl PageLike for CdpPage {
	async fn goto(&self, url: &str) -> Result<()> {
		Ok(self.navigate(url, NAVIGATION_TIMEOUT).await?)
	}

	async fn evaluate(&self, script: &Script, args: Value) -> Result<Value> {
		Ok(CdpPage::evaluate(self, script.source, &args).await?)
	}

	async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
		Ok(CdpPage::wait_for_network_idle(self, timeout).await?)
	}

	async fn current_url(&self) -> Result<String> {
		Ok(CdpPage::current_url(self).await?)
	}

	async fn close(&self) {
		self.detach().await;
		self.connection().close().await;
	}
}
