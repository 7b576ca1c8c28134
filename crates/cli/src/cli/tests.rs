use clap::Parser;

use super::*;

fn parse(args: &[&str]) -> Cli {
	Cli::try_parse_from(args).unwrap()
}

#[test]
fn rate_takes_positional_ratings_and_flags() {
	let cli = parse(&["sessionize", "session", "rate", "4,3,5,4", "--id", "1234567", "--comment", "Great talk proposal!"]);

	let options = cli.options();
	assert_eq!(options.ratings.as_deref(), Some("4,3,5,4"));
	assert_eq!(options.id.as_deref(), Some("1234567"));
	assert_eq!(options.comment.as_deref(), Some("Great talk proposal!"));
}

#[test]
fn rate_without_ratings_still_parses() {
	let cli = parse(&["sessionize", "session", "rate"]);
	assert_eq!(cli.options().ratings, None);
}

#[test]
fn connection_flags_are_global() {
	let cli = parse(&["sessionize", "session", "show", "--event-id", "99999", "--evaluation-id", "1"]);

	let options = cli.options();
	assert_eq!(options.event_id.as_deref(), Some("99999"));
	assert_eq!(options.evaluation_id.as_deref(), Some("1"));
	assert_eq!(options.id, None);
}

#[test]
fn goto_positional_is_session_id() {
	let cli = parse(&["sessionize", "session", "goto", "42"]);
	assert_eq!(cli.options().session_id.as_deref(), Some("42"));
	assert_eq!(cli.options().id, None);
}

#[test]
fn speaker_name_travels_as_query() {
	let cli = parse(&["sessionize", "speaker", "sessions", "Grace Hopper"]);
	assert_eq!(cli.options().query.as_deref(), Some("Grace Hopper"));
}

#[test]
fn list_filters() {
	let cli = parse(&["sessionize", "session", "list", "--track", "Track 2", "--status", "rated"]);
	let options = cli.options();
	assert_eq!(options.track.as_deref(), Some("Track 2"));
	assert_eq!(options.status.as_deref(), Some("rated"));
}

#[test]
fn verbosity_counts() {
	let cli = parse(&["sessionize", "-vv", "auth", "status"]);
	assert_eq!(cli.verbose, 2);
	assert!(matches!(cli.command, Commands::Auth(AuthArgs { action: AuthAction::Status })));
}

#[test]
fn missing_subcommand_is_rejected() {
	assert!(Cli::try_parse_from(["sessionize", "session"]).is_err());
	assert!(Cli::try_parse_from(["sessionize", "config", "edit"]).is_err());
}
