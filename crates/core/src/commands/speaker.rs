//! `speaker search | sessions`.

use serde::Serialize;

use super::session::open_evaluation_page;
use super::{CommandContext, non_empty};
use crate::error::{Error, Result};
use crate::scraper::{SpeakerRecord, SpeakerSession, get_speaker_sessions, search_speakers};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPayload {
	pub query: String,
	pub count: usize,
	pub speakers: Vec<SpeakerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionsPayload {
	pub speaker: String,
	pub count: usize,
	pub sessions: Vec<SpeakerSession>,
}

/// Searches the evaluation page (or whatever page is loaded when no event is
/// configured) for speakers matching `query`.
pub async fn search(ctx: &CommandContext) -> Result<SearchPayload> {
	let Some(query) = non_empty(ctx.options.query.as_deref()).map(String::from) else {
		return Err(Error::validation("Missing required: query"));
	};
	let target = ctx.options.evaluation_target().ok();

	let connection = ctx.open(true).await?;
	let result = async {
		let page = connection.page()?;
		open_evaluation_page(page, target.as_ref()).await?;
		let speakers = search_speakers(page, &query).await?;
		Ok::<_, Error>(SearchPayload {
			count: speakers.len(),
			query,
			speakers,
		})
	}
	.await;
	connection.finish(result).await
}

/// Session links whose surrounding row mentions the speaker.
pub async fn sessions(ctx: &CommandContext) -> Result<SessionsPayload> {
	let Some(speaker) = non_empty(ctx.options.query.as_deref()).map(String::from) else {
		return Err(Error::validation("Missing required: speaker name"));
	};
	let target = ctx.options.evaluation_target().ok();

	let connection = ctx.open(true).await?;
	let result = async {
		let page = connection.page()?;
		open_evaluation_page(page, target.as_ref()).await?;
		let sessions = get_speaker_sessions(page, &speaker).await?;
		Ok::<_, Error>(SessionsPayload {
			count: sessions.len(),
			speaker,
			sessions,
		})
	}
	.await;
	connection.finish(result).await
}
