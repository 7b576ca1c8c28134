use std::sync::Arc;

use serde_json::{Value, json};
use sessionize_protocol::SessionStatus;
use tempfile::TempDir;

use super::*;
use crate::error::Error;
use crate::scraper::AppliedRating;
use crate::state::{PersistedState, StatePatch};
use crate::testing::{MockAction, MockDriver, MockPage, MockProvider};

const BASE: &str = "https://sessionize.com/app/organizer/event/evaluation/rate/22203/8184";

struct Harness {
	_dir: TempDir,
	page: MockPage,
	provider: Arc<MockProvider>,
	state: StateStore,
}

impl Harness {
	fn new() -> Self {
		let dir = TempDir::new().unwrap();
		let page = MockPage::new();
		page.respond("login-indicators", json!({ "hasLogout": true }));
		Self {
			state: StateStore::new(dir.path().join("state.json")),
			_dir: dir,
			page,
			provider: Arc::new(MockProvider::new()),
		}
	}

	fn ctx(&self, options: Options) -> CommandContext {
		CommandContext::new(
			options,
			self.state.clone(),
			self.provider.clone(),
			Arc::new(MockDriver::new(self.page.clone())),
		)
	}

	fn closed(&self) -> bool {
		self.page.actions().contains(&MockAction::Close)
	}
}

fn options() -> Options {
	Options {
		api_key: Some("bb_live_test".into()),
		project_id: Some("proj".into()),
		email: Some("organizer@example.com".into()),
		password: Some("hunter22".into()),
		event_id: Some("22203".into()),
		evaluation_id: Some("8184".into()),
		..Default::default()
	}
}

fn snapshot(title: &str) -> Value {
	json!({ "bodyText": format!("{title}\nSome description"), "url": BASE, "ratings": [], "criteria": [] })
}

fn with_rating_widgets(page: &MockPage, count: usize) {
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
}

#[tokio::test]
async fn out_of_range_rating_fails_before_connecting() {
	let h = Harness::new();
	let ctx = h.ctx(Options {
		ratings: Some("6".into()),
		..options()
	});

	let err = session::rate(&ctx).await.unwrap_err();

	assert!(matches!(err, Error::Validation(_)));
	assert!(h.provider.calls().is_empty());
	assert!(h.page.actions().is_empty());
}

#[tokio::test]
async fn rate_applies_saves_and_advances_the_cursor() {
	let h = Harness::new();
	h.page.respond_once("session-id-url-param", json!("101"));
	h.page.respond_once("session-id-url-param", json!("102"));
	h.page.respond_once("session-snapshot", snapshot("[Track 1] First talk"));
	h.page.respond_once("session-snapshot", snapshot("[Track 2] Second talk"));
	with_rating_widgets(&h.page, 4);
	h.page.respond("comment-by-attribute", json!(true));
	h.page.respond("save-button", json!(true));
	let ctx = h.ctx(Options {
		ratings: Some("4,3,5,4".into()),
		comment: Some("Clear and practical".into()),
		..options()
	});

	let payload = session::rate(&ctx).await.unwrap();

	assert_eq!(payload.rated.session_id.as_deref(), Some("101"));
	assert_eq!(payload.rated.title.as_deref(), Some("[Track 1] First talk"));
	assert_eq!(payload.rated.ratings, vec![4.0, 3.0, 5.0, 4.0]);
	assert_eq!(payload.rated.comment.as_deref(), Some("Clear and practical"));
	assert_eq!(payload.next.session_id.as_deref(), Some("102"));
	assert_eq!(payload.next.title.as_deref(), Some("[Track 2] Second talk"));
	assert_eq!(h.state.load().current_session_id.as_deref(), Some("102"));
	assert_eq!(h.page.args_for("set-ratings"), vec![json!({ "ratings": [4.0, 3.0, 5.0, 4.0] })]);
	assert!(h.closed());

	let json = serde_json::to_value(&payload).unwrap();
	assert_eq!(json["rated"]["sessionId"], "101");
	assert_eq!(json["next"]["status"], "pending");
}

#[tokio::test]
async fn rating_count_mismatch_fails_and_still_disconnects() {
	let h = Harness::new();
	with_rating_widgets(&h.page, 3);
	h.page.respond("session-snapshot", snapshot("[Track 1] Talk"));
	let ctx = h.ctx(Options {
		ratings: Some("4,3,5,4".into()),
		..options()
	});

	let err = session::rate(&ctx).await.unwrap_err();

	assert!(matches!(err, Error::Mismatch { expected: 3, actual: 4, .. }));
	assert!(!h.page.evaluated().contains(&"save-button"));
	assert!(h.closed());
}

#[test]
fn applied_ratings_serialize_positionally() {
	let applied = vec![AppliedRating { index: 0, rating: 4.0 }, AppliedRating { index: 1, rating: 3.0 }];
	assert_eq!(
		serde_json::to_value(applied).unwrap(),
		json!([{ "index": 0, "rating": 4.0 }, { "index": 1, "rating": 3.0 }])
	);
}

#[tokio::test]
async fn show_resumes_from_persisted_cursor() {
	let h = Harness::new();
	h.state
		.update(StatePatch::default().current_session_id(Some("77".into())))
		.unwrap();
	h.page.respond("session-id-url-param", json!("77"));
	h.page.respond("session-snapshot", snapshot("[Track 3] Resumed"));

	let payload = session::show(&h.ctx(options())).await.unwrap();

	assert_eq!(payload.session.session_id.as_deref(), Some("77"));
	assert!(h.page.visited().contains(&format!("{BASE}?sessionId=77")));
}

#[tokio::test]
async fn show_without_cursor_loads_queue_head_and_remembers_it() {
	let h = Harness::new();
	h.page.respond("session-id-first-link", json!("5"));
	h.page.respond("session-snapshot", snapshot("[Track 1] Head"));

	let payload = session::show(&h.ctx(options())).await.unwrap();

	assert!(h.page.visited().contains(&BASE.to_string()));
	assert_eq!(payload.session.session_id.as_deref(), Some("5"));
	assert_eq!(h.state.load().current_session_id.as_deref(), Some("5"));
}

#[tokio::test]
async fn goto_requires_a_session_id() {
	let h = Harness::new();
	let err = session::goto(&h.ctx(options())).await.unwrap_err();
	assert!(matches!(err, Error::Validation(_)));
	assert!(h.provider.calls().is_empty());
}

#[tokio::test]
async fn goto_persists_the_visited_session() {
	let h = Harness::new();
	h.page.respond("session-id-url-param", json!("314"));
	h.page.respond("session-snapshot", snapshot("[Track 1] Pi"));
	let ctx = h.ctx(Options {
		session_id: Some("314".into()),
		..options()
	});

	session::goto(&ctx).await.unwrap();

	assert_eq!(h.state.load().current_session_id.as_deref(), Some("314"));
}

#[tokio::test]
async fn list_filters_by_track_and_ignores_status() {
	let h = Harness::new();
	h.page.respond(
		"session-links",
		json!([
			{ "sessionId": "1", "title": "[Track 1] Alpha", "href": "https://s/?sessionId=1" },
			{ "sessionId": "2", "title": "[Track 2] Beta", "href": "https://s/?sessionId=2" },
		]),
	);
	let ctx = h.ctx(Options {
		track: Some("TRACK 2".into()),
		status: Some("rated".into()),
		..options()
	});

	let payload = session::list(&ctx).await.unwrap();

	assert_eq!(payload.count, 1);
	assert_eq!(payload.sessions[0].session_id, "2");
	assert!(h.page.visited().contains(&BASE.to_string()));
}

#[tokio::test]
async fn missing_provider_credentials_is_config_error() {
	let h = Harness::new();
	let ctx = h.ctx(Options {
		api_key: None,
		..options()
	});
	let err = session::show(&ctx).await.unwrap_err();
	assert_eq!(err.kind(), crate::error::ErrorKind::ConfigError);
}

#[tokio::test(start_paused = true)]
async fn failed_login_aborts_the_flow() {
	let h = Harness::new();
	h.page.respond("login-indicators", json!({}));
	h.page.respond("classic-login-text", json!(true));
	h.page.respond("credentials-by-id", json!(true));
	h.page.respond("form-submit-control", json!(true));

	let err = session::show(&h.ctx(options())).await.unwrap_err();

	assert!(matches!(err, Error::Auth(_)));
	assert!(!h.page.evaluated().contains(&"session-snapshot"));
	assert!(h.closed());
}

#[tokio::test]
async fn speaker_search_requires_query() {
	let h = Harness::new();
	let err = speaker::search(&h.ctx(options())).await.unwrap_err();
	assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn speaker_search_runs_on_evaluation_page() {
	let h = Harness::new();
	h.page.respond(
		"speaker-scan",
		json!({ "links": [], "containers": ["[Track 1] Memory safety by Grace Hopper"] }),
	);
	let ctx = h.ctx(Options {
		query: Some("grace".into()),
		..options()
	});

	let payload = speaker::search(&ctx).await.unwrap();

	assert_eq!(payload.count, 1);
	assert_eq!(payload.speakers[0].name, "Grace Hopper");
	assert!(h.page.visited().contains(&BASE.to_string()));
}

#[tokio::test]
async fn speaker_search_without_event_uses_loaded_page() {
	let h = Harness::new();
	h.page.respond("speaker-scan", json!({ "links": [], "containers": [] }));
	let ctx = h.ctx(Options {
		query: Some("grace".into()),
		event_id: None,
		..options()
	});

	let payload = speaker::search(&ctx).await.unwrap();

	assert_eq!(payload.count, 0);
	assert!(!h.page.visited().contains(&BASE.to_string()));
}

#[tokio::test]
async fn auth_login_reports_remote_session() {
	let h = Harness::new();

	let payload = auth::login(&h.ctx(options())).await.unwrap();

	assert!(payload.success);
	assert_eq!(payload.message, "Already logged in");
	assert_eq!(h.state.load().remote_session_id.as_deref(), Some(payload.remote_session_id.as_str()));
	let json = serde_json::to_value(&payload).unwrap();
	assert!(json.get("success").is_none());
}

#[tokio::test]
async fn auth_status_without_remote_session_stays_offline() {
	let h = Harness::new();

	let payload = auth::status(&h.ctx(options())).await.unwrap();

	assert_eq!(payload.state.browser_session_valid, None);
	assert!(h.provider.calls().is_empty());
	assert_eq!(payload.state.state_file, h.state.path().display().to_string());
}

#[tokio::test]
async fn auth_status_corrects_stale_login_flag() {
	let h = Harness::new();
	h.provider.insert("bb-1", SessionStatus::Running);
	h.state
		.save(&PersistedState {
			remote_session_id: Some("bb-1".into()),
			logged_in: false,
			..Default::default()
		})
		.unwrap();

	let payload = auth::status(&h.ctx(options())).await.unwrap();

	assert_eq!(payload.state.browser_session_valid, Some(true));
	assert_eq!(payload.state.browser_session_reused, Some(true));
	assert_eq!(payload.state.actually_logged_in, Some(true));
	assert_eq!(payload.message.as_deref(), Some("Login state updated"));
	assert!(h.state.load().logged_in);
}

#[tokio::test]
async fn auth_status_reports_connection_errors_in_payload() {
	let h = Harness::new();
	h.state
		.update(StatePatch::default().remote_session_id(Some("bb-gone".into())))
		.unwrap();
	let ctx = CommandContext::new(options(), h.state.clone(), h.provider.clone(), {
		let driver = MockDriver::new(h.page.clone());
		driver.fail_next_attach("refused");
		Arc::new(driver)
	});

	let payload = auth::status(&ctx).await.unwrap();

	assert_eq!(payload.state.browser_session_valid, Some(false));
	assert!(payload.state.browser_session_error.unwrap().contains("refused"));
}

#[test]
fn auth_reset_restores_defaults() {
	let h = Harness::new();
	h.state
		.update(StatePatch::default().logged_in(true).current_session_id(Some("9".into())))
		.unwrap();

	let payload = auth::reset(&h.ctx(options())).unwrap();

	assert_eq!(payload.state, PersistedState::default());
	assert_eq!(h.state.load(), PersistedState::default());
}
