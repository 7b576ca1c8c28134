//! Session evaluation pages: navigation, extraction, rating, saving.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::scripts;
use super::text::{PageSnapshot, SessionRecord, truncate_chars};
use crate::error::{Error, Result};
use crate::page::{PageLike, evaluate_as};
use crate::retry::wait_for_stable;
use crate::selector::{click_first, find_first};
use crate::target::EvaluationTarget;

/// Pause after saving while the application swaps in the next queue item.
pub const SAVE_SETTLE: Duration = Duration::from_millis(3000);

pub const LIST_TITLE_MAX_CHARS: usize = 150;

pub const MAX_RATING: f64 = 5.0;

/// One session link on the evaluation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
	pub session_id: String,
	pub title: String,
	pub href: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedRating {
	pub index: usize,
	pub rating: f64,
}

#[derive(Debug, Deserialize)]
struct RawLink {
	#[serde(rename = "sessionId")]
	session_id: Option<String>,
	#[serde(default)]
	title: String,
	#[serde(default)]
	href: String,
}

#[derive(Debug, Deserialize)]
struct RatingOutcome {
	widgets: usize,
	scriptable: bool,
	#[serde(default)]
	applied: Vec<AppliedRating>,
}

/// Parses `"4,3,5,4"` into ratings in `[0, 5]`.
pub fn parse_ratings(input: &str) -> Result<Vec<f64>> {
	if input.trim().is_empty() {
		return Err(Error::validation("Missing required: ratings (e.g., 4,3,5,4)"));
	}
	input
		.split(',')
		.map(|raw| {
			let value: f64 = raw
				.trim()
				.parse()
				.map_err(|_| Error::validation(format!("Invalid rating value: {}", raw.trim())))?;
			validate_rating(value).map_err(|_| Error::validation(format!("Invalid rating value: {}", raw.trim())))
		})
		.collect()
}

fn validate_rating(value: f64) -> Result<f64> {
	if value.is_finite() && (0.0..=MAX_RATING).contains(&value) {
		Ok(value)
	} else {
		Err(Error::validation(format!("Rating {value} is outside 0-{MAX_RATING}")))
	}
}

/// Identifier of the session currently shown, if any strategy finds one.
pub async fn extract_session_id(page: &dyn PageLike) -> Option<String> {
	find_first(page, scripts::SESSION_ID, &Value::Null).await
}

pub async fn extract_session_details(page: &dyn PageLike) -> Result<SessionRecord> {
	let snapshot: PageSnapshot = evaluate_as(page, &scripts::SESSION_SNAPSHOT, Value::Null).await?;
	Ok(SessionRecord::from_snapshot(&snapshot))
}

/// Loads `target` and extracts the session it shows.
///
/// Without a session id the application picks the next pending item.
pub async fn navigate_to_session(page: &dyn PageLike, target: &EvaluationTarget) -> Result<SessionRecord> {
	let url = target.url();
	debug!(%url, "navigating to session");
	page.goto(&url).await?;
	wait_for_stable(page).await;

	let session_id = extract_session_id(page).await;
	let mut record = extract_session_details(page).await?;
	record.session_id = session_id;
	Ok(record)
}

/// Session links on the loaded page. No pagination.
pub async fn get_session_list(page: &dyn PageLike) -> Result<Vec<SessionSummary>> {
	let links: Vec<RawLink> = evaluate_as(page, &scripts::SESSION_LINKS, Value::Null).await?;
	Ok(links
		.into_iter()
		.filter_map(|link| {
			Some(SessionSummary {
				session_id: link.session_id.filter(|id| !id.is_empty())?,
				title: truncate_chars(&link.title, LIST_TITLE_MAX_CHARS),
				href: link.href,
			})
		})
		.collect())
}

/// Sets every rating widget, in order, or none of them.
pub async fn set_ratings(page: &dyn PageLike, ratings: &[f64]) -> Result<Vec<AppliedRating>> {
	if ratings.is_empty() {
		return Err(Error::validation("Ratings must be a non-empty list"));
	}
	for rating in ratings {
		validate_rating(*rating)?;
	}

	let outcome: RatingOutcome = evaluate_as(page, &scripts::SET_RATINGS, json!({ "ratings": ratings })).await?;
	if outcome.widgets != ratings.len() {
		return Err(Error::Mismatch {
			what: "ratings".into(),
			expected: outcome.widgets,
			actual: ratings.len(),
		});
	}
	if !outcome.scriptable {
		return Err(Error::not_found("Rating widgets cannot be set on this page"));
	}
	info!(count = outcome.applied.len(), "ratings applied");
	Ok(outcome.applied)
}

/// Writes `text` into the review comment box. Returns `false` for empty text.
pub async fn set_comment(page: &dyn PageLike, text: &str) -> Result<bool> {
	if text.is_empty() {
		return Ok(false);
	}
	match click_first(page, scripts::SET_COMMENT, &json!({ "text": text })).await {
		Some(_) => Ok(true),
		None => Err(Error::not_found("Could not find comment textarea")),
	}
}

pub async fn save_and_continue(page: &dyn PageLike) -> Result<()> {
	if click_first(page, scripts::SAVE_AND_CONTINUE, &Value::Null).await.is_none() {
		return Err(Error::not_found("Could not find save button"));
	}
	page.sleep(SAVE_SETTLE).await;
	wait_for_stable(page).await;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{MockAction, MockPage};

	fn target(session: Option<&str>) -> EvaluationTarget {
		EvaluationTarget::new(Some("22203"), Some("8184"))
			.unwrap()
			.with_session(session.map(String::from))
	}

	/// Mirrors the widget count check of the page script.
	fn page_with_widgets(count: usize) -> MockPage {
		let page = MockPage::new();
		page.respond_with("set-ratings", move |args| {
			let ratings = args["ratings"].as_array().cloned().unwrap_or_default();
			if ratings.len() != count {
				return Ok(json!({ "widgets": count, "scriptable": true, "applied": [] }));
			}
			let applied: Vec<Value> = ratings
				.iter()
				.enumerate()
				.map(|(index, rating)| json!({ "index": index, "rating": rating }))
				.collect();
			Ok(json!({ "widgets": count, "scriptable": true, "applied": applied }))
		});
		page
	}

	#[test]
	fn parses_ratings() {
		assert_eq!(parse_ratings("4,3,5,4").unwrap(), vec![4.0, 3.0, 5.0, 4.0]);
		assert_eq!(parse_ratings(" 4.5 , 0 ").unwrap(), vec![4.5, 0.0]);
	}

	#[test]
	fn rejects_out_of_range_and_garbage() {
		for input in ["6", "-1", "4,x", "", "4,,3", "NaN"] {
			let err = parse_ratings(input).unwrap_err();
			assert!(matches!(err, Error::Validation(_)), "{input:?} gave {err:?}");
		}
	}

	#[tokio::test]
	async fn applies_ratings_positionally() {
		let page = page_with_widgets(4);
		let ratings = parse_ratings("4,3,5,4").unwrap();

		let applied = set_ratings(&page, &ratings).await.unwrap();

		assert_eq!(
			applied,
			vec![
				AppliedRating { index: 0, rating: 4.0 },
				AppliedRating { index: 1, rating: 3.0 },
				AppliedRating { index: 2, rating: 5.0 },
				AppliedRating { index: 3, rating: 4.0 },
			]
		);
	}

	#[tokio::test]
	async fn widget_count_mismatch_applies_nothing() {
		let page = page_with_widgets(4);

		let err = set_ratings(&page, &[4.0, 3.0, 5.0]).await.unwrap_err();

		match err {
			Error::Mismatch { expected, actual, .. } => assert_eq!((expected, actual), (4, 3)),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn no_widgets_is_a_mismatch() {
		let page = page_with_widgets(0);
		let err = set_ratings(&page, &[4.0]).await.unwrap_err();
		assert!(matches!(err, Error::Mismatch { expected: 0, actual: 1, .. }));
	}

	#[tokio::test]
	async fn empty_or_invalid_ratings_never_touch_the_page() {
		let page = page_with_widgets(1);
		assert!(matches!(set_ratings(&page, &[]).await, Err(Error::Validation(_))));
		assert!(matches!(set_ratings(&page, &[6.0]).await, Err(Error::Validation(_))));
		assert!(page.actions().is_empty());
	}

	#[tokio::test]
	async fn unscriptable_widgets_are_not_found() {
		let page = MockPage::new();
		page.respond("set-ratings", json!({ "widgets": 2, "scriptable": false, "applied": [] }));
		let err = set_ratings(&page, &[1.0, 2.0]).await.unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
	}

	#[tokio::test]
	async fn navigate_without_session_id_loads_base_url() {
		let page = MockPage::new();
		page.respond("session-id-url-param", json!(null));
		page.respond("session-id-track-link-html", json!("555"));
		page.respond(
			"session-snapshot",
			json!({ "bodyText": "[Track 1] Queue head\nBody", "url": "https://x", "ratings": [], "criteria": [] }),
		);

		let record = navigate_to_session(&page, &target(None)).await.unwrap();

		assert_eq!(
			page.visited(),
			vec!["https://sessionize.com/app/organizer/event/evaluation/rate/22203/8184".to_string()]
		);
		assert_eq!(record.session_id.as_deref(), Some("555"));
		assert_eq!(record.title.as_deref(), Some("[Track 1] Queue head"));
	}

	#[tokio::test]
	async fn navigate_with_session_id_appends_query() {
		let page = MockPage::new();
		page.respond("session-id-url-param", json!("123"));
		page.respond("session-snapshot", json!({ "bodyText": "", "url": "https://x" }));

		let record = navigate_to_session(&page, &target(Some("123"))).await.unwrap();

		assert_eq!(
			page.visited(),
			vec!["https://sessionize.com/app/organizer/event/evaluation/rate/22203/8184?sessionId=123".to_string()]
		);
		assert_eq!(record.session_id.as_deref(), Some("123"));
		assert!(page.actions().contains(&MockAction::Sleep(crate::retry::SETTLE_DELAY)));
	}

	#[tokio::test]
	async fn session_list_drops_idless_links_and_truncates_titles() {
		let page = MockPage::new();
		let long_title = "x".repeat(200);
		page.respond(
			"session-links",
			json!([
				{ "sessionId": "1", "title": "[Track 1] Short", "href": "https://s/?sessionId=1" },
				{ "sessionId": null, "title": "broken", "href": "https://s/?sessionId=abc" },
				{ "sessionId": "2", "title": long_title, "href": "https://s/?sessionId=2" },
			]),
		);

		let list = get_session_list(&page).await.unwrap();

		assert_eq!(list.len(), 2);
		assert_eq!(list[0].session_id, "1");
		assert_eq!(list[1].title.chars().count(), LIST_TITLE_MAX_CHARS);
	}

	#[tokio::test]
	async fn comment_falls_back_through_strategies() {
		let page = MockPage::new();
		page.respond("comment-sole-textarea", json!(true));

		assert!(set_comment(&page, "Strong proposal").await.unwrap());
		assert_eq!(
			page.evaluated(),
			vec!["comment-by-attribute", "comment-near-label", "comment-sole-textarea"]
		);
		assert_eq!(page.args_for("comment-sole-textarea"), vec![json!({ "text": "Strong proposal" })]);
	}

	#[tokio::test]
	async fn empty_comment_is_a_no_op() {
		let page = MockPage::new();
		assert!(!set_comment(&page, "").await.unwrap());
		assert!(page.actions().is_empty());
	}

	#[tokio::test]
	async fn missing_comment_box_is_not_found() {
		let page = MockPage::new();
		let err = set_comment(&page, "hi").await.unwrap_err();
		assert_eq!(err.to_string(), "Could not find comment textarea");
	}

	#[tokio::test]
	async fn save_waits_for_the_next_item() {
		let page = MockPage::new();
		page.respond("save-continue-text", json!(true));

		save_and_continue(&page).await.unwrap();

		let actions = page.actions();
		assert!(actions.contains(&MockAction::Sleep(SAVE_SETTLE)));
		assert!(!page.evaluated().contains(&"submit-control"));
	}

	#[tokio::test]
	async fn save_without_any_control_fails() {
		let page = MockPage::new();
		let err = save_and_continue(&page).await.unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
		assert_eq!(page.evaluated(), vec!["save-button", "save-continue-text", "submit-control"]);
	}
}
