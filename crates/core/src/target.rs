//! Evaluation page addressing.

use url::Url;

use crate::error::{Error, Result};

pub const EVALUATION_BASE: &str = "https://sessionize.com/app/organizer/event/evaluation/rate/";

/// One organizer rating page: `(eventId, evaluationId)` plus an optional session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationTarget {
	base: Url,
	session_id: Option<String>,
}

impl EvaluationTarget {
	pub fn new(event_id: Option<&str>, evaluation_id: Option<&str>) -> Result<Self> {
		let (Some(event_id), Some(evaluation_id)) = (non_blank(event_id), non_blank(evaluation_id)) else {
			return Err(Error::config("Missing required: --event-id and --evaluation-id"));
		};
		let mut base = Url::parse(EVALUATION_BASE).map_err(|e| Error::config(e.to_string()))?;
		base.path_segments_mut()
			.map_err(|_| Error::config("evaluation base URL cannot carry a path"))?
			.pop_if_empty()
			.push(event_id)
			.push(evaluation_id);
		Ok(Self { base, session_id: None })
	}

	pub fn with_session(mut self, session_id: Option<String>) -> Self {
		self.session_id = session_id.filter(|id| !id.is_empty());
		self
	}

	pub fn base_url(&self) -> &str {
		self.base.as_str()
	}

	pub fn session_id(&self) -> Option<&str> {
		self.session_id.as_deref()
	}

	/// The base URL, with `?sessionId=` when a session is set.
	pub fn url(&self) -> String {
		let mut url = self.base.clone();
		if let Some(id) = &self.session_id {
			url.query_pairs_mut().append_pair("sessionId", id);
		}
		url.into()
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}
