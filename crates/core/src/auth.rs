//! Login state machine.
//!
//! ```text
//! UNKNOWN -> VERIFYING (url / indicators) -> LOGGED_IN
//!                                         -> LOGIN_REQUIRED -> SUBMITTING -> LOGGED_IN | LOGIN_FAILED
//! ```
//!
//! The persisted `loggedIn` flag is only a cache; [`is_logged_in`] against the
//! live page is the source of truth.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::page::{PageLike, evaluate_as};
use crate::retry::{RetryPolicy, wait_for_stable, with_retry};
use crate::scraper::scripts;
use crate::selector::click_first;
use crate::state::{StatePatch, StateStore};

pub const LOGIN_URL: &str = "https://sessionize.com/login";

/// URL fragment only present inside the authenticated application.
pub const APP_PATH_MARKER: &str = "sessionize.com/app";

/// Pause between filling and submitting the form.
pub const FILL_SETTLE: Duration = Duration::from_millis(500);

/// Pause after submitting while the application signs in.
pub const LOGIN_SETTLE: Duration = Duration::from_millis(5000);

/// Organizer account credentials. Never persisted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
	pub email: Option<String>,
	pub password: Option<String>,
}

impl Credentials {
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: Some(email.into()),
			password: Some(password.into()),
		}
	}

	fn require(&self) -> Result<(&str, &str)> {
		match (non_empty(&self.email), non_empty(&self.password)) {
			(Some(email), Some(password)) => Ok((email, password)),
			_ => Err(Error::validation("Missing required: --email and --password")),
		}
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
	pub success: bool,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

impl LoginOutcome {
	fn ok(message: &str, url: Option<String>) -> Self {
		Self {
			success: true,
			message: message.to_string(),
			url,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Indicators {
	has_logout: bool,
	has_my_events: bool,
	has_organizer: bool,
}

/// True if the URL is inside the app or any logged-in indicator is on the page.
pub async fn is_logged_in(page: &dyn PageLike) -> Result<bool> {
	let url = page.current_url().await?;
	if url.contains(APP_PATH_MARKER) {
		return Ok(true);
	}
	let found: Option<Indicators> = evaluate_as(page, &scripts::LOGIN_INDICATORS, Value::Null).await?;
	let found = found.unwrap_or_default();
	debug!(?found, "login indicators");
	Ok(found.has_logout || found.has_my_events || found.has_organizer)
}

/// Full login through the classic email/password form.
///
/// Returns an unsuccessful outcome, not an error, when the credentials were
/// submitted but the application did not sign in.
pub async fn login(page: &dyn PageLike, credentials: &Credentials, state: &StateStore) -> Result<LoginOutcome> {
	let (email, password) = credentials.require()?;

	page.goto(LOGIN_URL).await?;
	wait_for_stable(page).await;

	if is_logged_in(page).await? {
		state.update(StatePatch::default().logged_in(true))?;
		info!("already logged in");
		return Ok(LoginOutcome::ok("Already logged in", None));
	}

	with_retry(RetryPolicy::default(), |_| async move {
		click_first(page, scripts::CLASSIC_LOGIN, &Value::Null)
			.await
			.ok_or_else(|| Error::not_found("Classic Login button not found"))
	})
	.await?;
	wait_for_stable(page).await;

	let fields = &json!({ "email": email, "password": password });
	with_retry(RetryPolicy::default(), |_| async move {
		click_first(page, scripts::FILL_CREDENTIALS, fields)
			.await
			.ok_or_else(|| Error::not_found("Could not find login fields"))
	})
	.await?;
	page.sleep(FILL_SETTLE).await;

	with_retry(RetryPolicy::default(), |_| async move {
		click_first(page, scripts::SUBMIT_LOGIN, &Value::Null)
			.await
			.ok_or_else(|| Error::not_found("Could not find submit button"))
	})
	.await?;

	page.sleep(LOGIN_SETTLE).await;
	wait_for_stable(page).await;

	let logged_in = is_logged_in(page).await?;
	state.update(StatePatch::default().logged_in(logged_in))?;
	let url = page.current_url().await.ok();
	if logged_in {
		info!("login successful");
		Ok(LoginOutcome::ok("Login successful", url))
	} else {
		warn!("login did not reach the organizer app");
		Ok(LoginOutcome {
			success: false,
			message: "Login failed - check credentials".to_string(),
			url,
		})
	}
}

/// Re-verifies a cached login before trusting it; logs in otherwise.
pub async fn ensure_logged_in(page: &dyn PageLike, credentials: &Credentials, state: &StateStore) -> Result<LoginOutcome> {
	if state.load().logged_in {
		if is_logged_in(page).await? {
			return Ok(LoginOutcome::ok("Session valid", None));
		}
		debug!("persisted login is stale");
		state.update(StatePatch::default().logged_in(false))?;
	}
	login(page, credentials, state).await
}

/// Like [`ensure_logged_in`], turning an unsuccessful outcome into an error.
pub async fn require_login(page: &dyn PageLike, credentials: &Credentials, state: &StateStore) -> Result<()> {
	let outcome = ensure_logged_in(page, credentials, state).await?;
	if outcome.success {
		Ok(())
	} else {
		Err(Error::Auth(outcome.message))
	}
}
