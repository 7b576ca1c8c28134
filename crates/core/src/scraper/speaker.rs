//! Best-effort speaker search on the loaded page.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::scripts;
use crate::error::Result;
use crate::page::{PageLike, evaluate_as};

static SPEAKER_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"speakerId=(\d+)").unwrap());
static SPEAKER_PATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"speaker/(\d+)").unwrap());
static BY_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)by\s+([A-Z][a-z]+ [A-Z][a-z]+)").unwrap());
static SPEAKER_LABEL_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)Speaker:\s*([A-Z][a-z]+ [A-Z][a-z]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerRecord {
	pub name: String,
	pub speaker_id: Option<String>,
	pub url: Option<String>,
}

/// A session link attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerSession {
	pub session_id: Option<String>,
	pub title: String,
	pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpeakerScan {
	pub links: Vec<ProfileLink>,
	pub containers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileLink {
	pub name: String,
	pub href: String,
}

/// Speakers on the current page whose name contains `query` (case-insensitive).
pub async fn search_speakers(page: &dyn PageLike, query: &str) -> Result<Vec<SpeakerRecord>> {
	let scan: SpeakerScan = evaluate_as(page, &scripts::SPEAKER_SCAN, json!({ "query": query })).await?;
	Ok(collect_speakers(query, &scan))
}

/// Profile links first, then names found in matching session containers.
/// Deduplicated by lower-cased name; the first occurrence wins.
pub fn collect_speakers(query: &str, scan: &SpeakerScan) -> Vec<SpeakerRecord> {
	let needle = query.to_lowercase();
	let from_links = scan
		.links
		.iter()
		.filter(|link| !link.name.is_empty() && link.name.to_lowercase().contains(&needle))
		.map(|link| SpeakerRecord {
			name: link.name.clone(),
			speaker_id: speaker_id(&link.href),
			url: Some(link.href.clone()),
		});
	let from_containers = scan
		.containers
		.iter()
		.filter(|text| text.to_lowercase().contains(&needle))
		.filter_map(|text| container_speaker(text))
		.map(|name| SpeakerRecord {
			name,
			speaker_id: None,
			url: None,
		});

	let mut seen = HashSet::new();
	from_links
		.chain(from_containers)
		.filter(|record| seen.insert(record.name.to_lowercase()))
		.collect()
}

fn speaker_id(href: &str) -> Option<String> {
	SPEAKER_ID_RE
		.captures(href)
		.or_else(|| SPEAKER_PATH_RE.captures(href))
		.map(|c| c[1].to_string())
}

fn container_speaker(text: &str) -> Option<String> {
	BY_NAME_RE
		.captures(text)
		.or_else(|| SPEAKER_LABEL_RE.captures(text))
		.map(|c| c[1].to_string())
}

/// Session links whose enclosing container mentions `speaker_name`.
pub async fn get_speaker_sessions(page: &dyn PageLike, speaker_name: &str) -> Result<Vec<SpeakerSession>> {
	evaluate_as(page, &scripts::SPEAKER_SESSIONS, json!({ "name": speaker_name })).await
}
