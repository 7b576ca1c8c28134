//! Anchor-based extraction from a session page's rendered text.
//!
//! The evaluation page carries no stable structure for its free-text fields,
//! so each field is located relative to fixed label text ("Talk Outline",
//! "Level", ...) in `document.body.innerText`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const OUTLINE_MAX_CHARS: usize = 5000;

pub const DEFAULT_CRITERIA: [&str; 4] = ["Practical", "Originality", "Relevance", "Clarity"];

const DESCRIPTION_END_MARKERS: &[&str] = &["Talk Outline", "Session format", "Additional Notes", "Level", "Track"];
const OUTLINE_MARKER: &str = "Talk Outline";
const OUTLINE_END_MARKERS: &[&str] = &["Session format", "Additional Notes", "Level", "Track", "All comments"];
const COMMENTS_MARKER: &str = "All comments";
const COMMENTS_END_MARKER: &str = "Save and continue";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[Track \d+\][^\n]+").unwrap());
static TRACK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Track\s*\n\s*([^\n]+)").unwrap());
static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Level\s*\n\s*([^\n]+)").unwrap());
static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)%").unwrap());
static SPEAKER_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"Level\s*\n\s*[^\n]+\s*\n\s*([A-Z][a-z]+ [A-Z][a-z]+)").unwrap());

/// Raw page data collected by the session snapshot script.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSnapshot {
	pub body_text: String,
	pub url: String,
	pub ratings: Vec<f64>,
	pub criteria: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
	Pending,
	Rated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerName {
	pub name: String,
}

/// Structured view of one evaluation page. Produced fresh on every visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	pub session_id: Option<String>,
	pub title: Option<String>,
	pub description: String,
	pub talk_outline: Option<String>,
	pub track: Option<String>,
	pub level: Option<String>,
	pub speaker: Option<SpeakerName>,
	pub progress: Option<f64>,
	/// `None` unless at least one rating is above zero.
	pub ratings: Option<Vec<f64>>,
	pub rating_criteria: Vec<String>,
	pub comments: Option<String>,
	pub status: ReviewStatus,
	pub url: String,
}

impl SessionRecord {
	/// Parses a snapshot. `session_id` is left empty; it comes from a separate probe.
	pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
		let body = snapshot.body_text.as_str();
		let title = extract_title(body);
		let description = title
			.as_deref()
			.map(|t| extract_description(body, t))
			.unwrap_or_default();

		let rated = snapshot.ratings.iter().any(|r| *r > 0.0);
		let rating_criteria = if snapshot.criteria.is_empty() {
			DEFAULT_CRITERIA.iter().map(|c| c.to_string()).collect()
		} else {
			snapshot.criteria.clone()
		};

		Self {
			session_id: None,
			title,
			description,
			talk_outline: extract_outline(body),
			track: labelled_line(&TRACK_RE, body),
			level: labelled_line(&LEVEL_RE, body),
			speaker: extract_speaker(body).map(|name| SpeakerName { name }),
			progress: extract_progress(body),
			ratings: rated.then(|| snapshot.ratings.clone()),
			rating_criteria,
			comments: extract_comments(body),
			status: if rated { ReviewStatus::Rated } else { ReviewStatus::Pending },
			url: snapshot.url.clone(),
		}
	}
}

pub fn extract_title(body: &str) -> Option<String> {
	TITLE_RE.find(body).map(|m| m.as_str().trim().to_string())
}

/// Text after the title up to the earliest description end marker.
pub fn extract_description(body: &str, title: &str) -> String {
	let Some(title_at) = body.find(title) else {
		return String::new();
	};
	let start = title_at + title.len();
	let end = earliest_marker(body, start, DESCRIPTION_END_MARKERS);
	truncate_chars(body[start..end].trim(), DESCRIPTION_MAX_CHARS)
}

pub fn extract_outline(body: &str) -> Option<String> {
	let start = body.find(OUTLINE_MARKER)? + OUTLINE_MARKER.len();
	let end = earliest_marker(body, start, OUTLINE_END_MARKERS);
	let outline = truncate_chars(body[start..end].trim(), OUTLINE_MAX_CHARS);
	(!outline.is_empty()).then_some(outline)
}

pub fn extract_comments(body: &str) -> Option<String> {
	let start = body.find(COMMENTS_MARKER)?;
	let after = start + COMMENTS_MARKER.len();
	let end = after + body[after..].find(COMMENTS_END_MARKER)?;
	let comments = body[after..end].trim();
	(!comments.is_empty()).then(|| comments.to_string())
}

pub fn extract_progress(body: &str) -> Option<f64> {
	PROGRESS_RE.captures(body)?.get(1)?.as_str().parse().ok()
}

pub fn extract_speaker(body: &str) -> Option<String> {
	SPEAKER_RE.captures(body).map(|c| c[1].to_string())
}

fn labelled_line(re: &Regex, body: &str) -> Option<String> {
	re.captures(body).map(|c| c[1].trim().to_string())
}

/// Byte offset of the first marker occurrence strictly after `start`.
///
/// For each marker only its first occurrence at or after `start` counts; an
/// occurrence exactly at `start` disqualifies that marker.
fn earliest_marker(body: &str, start: usize, markers: &[&str]) -> usize {
	markers
		.iter()
		.filter_map(|marker| body[start..].find(marker))
		.filter(|offset| *offset > 0)
		.map(|offset| start + offset)
		.min()
		.unwrap_or(body.len())
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
	match s.char_indices().nth(max) {
		Some((idx, _)) => s[..idx].to_string(),
		None => s.to_string(),
	}
}
