//! `session show | rate | goto | list`.

use serde::Serialize;
use tracing::{debug, info};

use super::{CommandContext, non_empty};
use crate::error::{Error, Result};
use crate::page::PageLike;
use crate::retry::wait_for_stable;
use crate::scraper::{
	self, SessionRecord, SessionSummary, extract_session_details, extract_session_id, navigate_to_session, parse_ratings,
};
use crate::state::StatePatch;
use crate::target::EvaluationTarget;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionPayload {
	pub session: SessionRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedSession {
	pub session_id: Option<String>,
	pub title: Option<String>,
	pub ratings: Vec<f64>,
	pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatePayload {
	pub rated: RatedSession,
	pub next: SessionRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPayload {
	pub count: usize,
	pub sessions: Vec<SessionSummary>,
}

/// Shows `--id`, else the persisted current session, else the queue head.
pub async fn show(ctx: &CommandContext) -> Result<SessionPayload> {
	let target = ctx.options.evaluation_target()?;
	let connection = ctx.open(true).await?;
	let result = async {
		let page = connection.page()?;
		let session_id = non_empty(ctx.options.id.as_deref())
			.map(String::from)
			.or_else(|| ctx.state.load().current_session_id);
		let session = navigate_to_session(page, &target.with_session(session_id)).await?;
		if let Some(id) = &session.session_id {
			ctx.state
				.update(StatePatch::default().current_session_id(Some(id.clone())))?;
		}
		Ok::<_, Error>(SessionPayload { session })
	}
	.await;
	connection.finish(result).await
}

/// Rates the target session, saves, and reports the item the queue advanced to.
///
/// Ratings are validated before any connection is made.
pub async fn rate(ctx: &CommandContext) -> Result<RatePayload> {
	let ratings = parse_ratings(ctx.options.ratings.as_deref().unwrap_or_default())?;
	let target = ctx.options.evaluation_target()?;
	let comment = non_empty(ctx.options.comment.as_deref()).map(String::from);

	let connection = ctx.open(true).await?;
	let result = async {
		let page = connection.page()?;
		let session_id = non_empty(ctx.options.id.as_deref())
			.map(String::from)
			.or_else(|| ctx.state.load().current_session_id);
		let session = navigate_to_session(page, &target.with_session(session_id)).await?;

		scraper::set_ratings(page, &ratings).await?;
		if let Some(text) = &comment {
			scraper::set_comment(page, text).await?;
		}
		scraper::save_and_continue(page).await?;

		let next = next_session(page).await?;
		ctx.state
			.update(StatePatch::default().current_session_id(next.session_id.clone()))?;
		info!(
			rated = session.session_id.as_deref().unwrap_or("?"),
			next = next.session_id.as_deref().unwrap_or("?"),
			"session rated"
		);

		Ok::<_, Error>(RatePayload {
			rated: RatedSession {
				session_id: session.session_id,
				title: session.title,
				ratings,
				comment,
			},
			next,
		})
	}
	.await;
	connection.finish(result).await
}

async fn next_session(page: &dyn PageLike) -> Result<SessionRecord> {
	let mut next = extract_session_details(page).await?;
	next.session_id = extract_session_id(page).await;
	Ok(next)
}

pub async fn goto(ctx: &CommandContext) -> Result<SessionPayload> {
	let Some(session_id) = non_empty(ctx.options.session_id.as_deref()).map(String::from) else {
		return Err(Error::validation("Missing required: sessionId"));
	};
	let target = ctx.options.evaluation_target()?;

	let connection = ctx.open(true).await?;
	let result = async {
		let page = connection.page()?;
		let session = navigate_to_session(page, &target.with_session(Some(session_id))).await?;
		ctx.state
			.update(StatePatch::default().current_session_id(session.session_id.clone()))?;
		Ok::<_, Error>(SessionPayload { session })
	}
	.await;
	connection.finish(result).await
}

/// Session links on the evaluation page, optionally filtered by track.
///
/// `--status` is accepted but not applied: list entries carry no rating state.
pub async fn list(ctx: &CommandContext) -> Result<ListPayload> {
	let target = ctx.options.evaluation_target()?;
	if let Some(status) = non_empty(ctx.options.status.as_deref()) {
		debug!(status, "status filter is not applied to session lists");
	}

	let connection = ctx.open(true).await?;
	let result = async {
		let page = connection.page()?;
		page.goto(&target.url()).await?;
		wait_for_stable(page).await;

		let sessions = filter_by_track(scraper::get_session_list(page).await?, ctx.options.track.as_deref());
		Ok::<_, Error>(ListPayload {
			count: sessions.len(),
			sessions,
		})
	}
	.await;
	connection.finish(result).await
}

fn filter_by_track(sessions: Vec<SessionSummary>, track: Option<&str>) -> Vec<SessionSummary> {
	match non_empty(track) {
		Some(track) => {
			let needle = track.to_lowercase();
			sessions
				.into_iter()
				.filter(|s| s.title.to_lowercase().contains(&needle))
				.collect()
		}
		None => sessions,
	}
}

/// Loads the evaluation page when both ids are configured.
pub(super) async fn open_evaluation_page(page: &dyn PageLike, target: Option<&EvaluationTarget>) -> Result<()> {
	if let Some(target) = target {
		page.goto(&target.url()).await?;
		wait_for_stable(page).await;
	}
	Ok(())
}
