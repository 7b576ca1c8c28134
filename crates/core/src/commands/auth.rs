//! `auth login | status | reset`.

use serde::Serialize;
use tracing::warn;

use super::CommandContext;
use crate::auth::{is_logged_in, login as submit_login};
use crate::error::{Error, Result};
use crate::state::{PersistedState, StatePatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
	/// Lifted into the output envelope by the caller.
	#[serde(skip)]
	pub success: bool,
	pub message: String,
	pub remote_session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
	pub remote_session_id: Option<String>,
	pub logged_in: bool,
	pub current_session_id: Option<String>,
	pub state_file: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub browser_session_valid: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub browser_session_reused: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub actually_logged_in: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub browser_session_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
	pub state: StatusReport,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPayload {
	pub message: String,
	pub state: PersistedState,
}

/// Always runs the full login flow, whatever the state file says.
pub async fn login(ctx: &CommandContext) -> Result<LoginPayload> {
	let connection = ctx.open(false).await?;
	let remote_session_id = connection.connected.session_id.clone();
	let result = async {
		let page = connection.page()?;
		let outcome = submit_login(page, &ctx.options.credentials(), &ctx.state).await?;
		Ok::<_, Error>(LoginPayload {
			success: outcome.success,
			message: outcome.message,
			remote_session_id,
		})
	}
	.await;
	connection.finish(result).await
}

/// Reports the state file, and when a remote session is on record and the
/// provider is configured, whether that session still holds a login.
///
/// Connection problems are reported in the payload, never raised.
pub async fn status(ctx: &CommandContext) -> Result<StatusPayload> {
	let persisted = ctx.state.load();
	let mut report = StatusReport {
		remote_session_id: persisted.remote_session_id.clone(),
		logged_in: persisted.logged_in,
		current_session_id: persisted.current_session_id.clone(),
		state_file: ctx.state.path().display().to_string(),
		browser_session_valid: None,
		browser_session_reused: None,
		actually_logged_in: None,
		browser_session_error: None,
	};
	let mut message = None;

	let configured = ctx.options.api_key.as_deref().is_some_and(|k| !k.is_empty())
		&& ctx.options.project_id.as_deref().is_some_and(|p| !p.is_empty());
	if persisted.remote_session_id.is_none() || !configured {
		return Ok(StatusPayload { state: report, message });
	}

	let probe = async {
		let connection = ctx.open(false).await?;
		let reused = connection.connected.reused;
		let checked = match connection.page() {
			Ok(page) => is_logged_in(page).await,
			Err(e) => Err(e),
		};
		connection.finish(checked.map(|logged_in| (reused, logged_in))).await
	};

	match probe.await {
		Ok((reused, actually_logged_in)) => {
			report.browser_session_valid = Some(true);
			report.browser_session_reused = Some(reused);
			report.actually_logged_in = Some(actually_logged_in);
			// Connecting may itself have replaced the session and cleared the flag.
			let current = ctx.state.load();
			report.remote_session_id = current.remote_session_id;
			if actually_logged_in != current.logged_in {
				ctx.state.update(StatePatch::default().logged_in(actually_logged_in))?;
				message = Some("Login state updated".to_string());
			}
			report.logged_in = actually_logged_in;
		}
		Err(e) => {
			warn!(error = %e, "could not verify remote session");
			report.browser_session_valid = Some(false);
			report.browser_session_error = Some(e.to_string());
		}
	}

	Ok(StatusPayload { state: report, message })
}

pub fn reset(ctx: &CommandContext) -> Result<ResetPayload> {
	let state = ctx.state.reset()?;
	Ok(ResetPayload {
		message: "State reset".to_string(),
		state,
	})
}
