#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sessionize::Options;

/// Root CLI for the organizer tools.
#[derive(Parser, Debug)]
#[command(name = "sessionize")]
#[command(about = "Interact with Sessionize as a conference organizer")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Include error details in failure output
	#[arg(long, global = true, env = "DEBUG", value_parser = clap::builder::FalseyValueParser::new())]
	pub debug: bool,

	/// Config file (default: ~/.sessionize-cli.json)
	#[arg(long, global = true, value_name = "FILE", env = "SESSIONIZE_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(flatten)]
	pub connection: ConnectionArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Flags that override values from the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
	/// Browserbase API key
	#[arg(long, global = true, value_name = "KEY", env = "SESSIONIZE_API_KEY", hide_env_values = true)]
	pub api_key: Option<String>,

	/// Browserbase project ID
	#[arg(long, global = true, value_name = "ID", env = "SESSIONIZE_PROJECT_ID")]
	pub project_id: Option<String>,

	/// Sessionize login email
	#[arg(long, global = true, value_name = "EMAIL", env = "SESSIONIZE_EMAIL")]
	pub email: Option<String>,

	/// Sessionize password
	#[arg(long, global = true, value_name = "PASSWORD", env = "SESSIONIZE_PASSWORD", hide_env_values = true)]
	pub password: Option<String>,

	/// Sessionize event ID
	#[arg(long, global = true, value_name = "ID", env = "SESSIONIZE_EVENT_ID")]
	pub event_id: Option<String>,

	/// Sessionize evaluation ID
	#[arg(long, global = true, value_name = "ID", env = "SESSIONIZE_EVALUATION_ID")]
	pub evaluation_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Read, rate and browse evaluation sessions.
	Session(SessionArgs),
	/// Look up speakers on the evaluation page.
	Speaker(SpeakerArgs),
	/// Log in, inspect or clear the login state.
	Auth(AuthArgs),
	/// Inspect the config file.
	Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct SessionArgs {
	#[command(subcommand)]
	pub action: SessionAction,
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
	/// Show the current or a specific session.
	Show {
		#[arg(long, value_name = "SESSION_ID")]
		id: Option<String>,
	},
	/// Rate a session, e.g. `4,3,5,4`, and move to the next one.
	Rate {
		#[arg(value_name = "RATINGS")]
		ratings: Option<String>,
		#[arg(long, value_name = "SESSION_ID")]
		id: Option<String>,
		#[arg(long, value_name = "TEXT")]
		comment: Option<String>,
	},
	/// Navigate to a specific session.
	Goto {
		#[arg(value_name = "SESSION_ID")]
		session_id: Option<String>,
	},
	/// List sessions on the evaluation page.
	List {
		#[arg(long, value_name = "NAME")]
		track: Option<String>,
		/// Accepted for compatibility; list entries carry no rating state
		#[arg(long, value_name = "pending|rated")]
		status: Option<String>,
	},
}

#[derive(Args, Debug)]
pub struct SpeakerArgs {
	#[command(subcommand)]
	pub action: SpeakerAction,
}

#[derive(Subcommand, Debug)]
pub enum SpeakerAction {
	/// Search for speakers by name.
	Search {
		#[arg(value_name = "QUERY")]
		query: Option<String>,
	},
	/// List the sessions of a speaker.
	Sessions {
		#[arg(value_name = "NAME")]
		name: Option<String>,
	},
}

#[derive(Args, Debug)]
pub struct AuthArgs {
	#[command(subcommand)]
	pub action: AuthAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
	/// Log in to Sessionize.
	Login,
	/// Check the authentication state.
	Status,
	/// Clear all state.
	Reset,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
	#[command(subcommand)]
	pub action: ConfigAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
	/// Show the configuration with the password masked.
	Show,
	/// Show the config file path and whether it exists.
	Path,
}

impl Cli {
	/// Flag values for the core, ready to overlay onto the config file.
	pub fn options(&self) -> Options {
		let c = &self.connection;
		let mut options = Options {
			api_key: c.api_key.clone(),
			project_id: c.project_id.clone(),
			email: c.email.clone(),
			password: c.password.clone(),
			event_id: c.event_id.clone(),
			evaluation_id: c.evaluation_id.clone(),
			..Default::default()
		};
		match &self.command {
			Commands::Session(args) => match &args.action {
				SessionAction::Show { id } => options.id = id.clone(),
				SessionAction::Rate { ratings, id, comment } => {
					options.ratings = ratings.clone();
					options.id = id.clone();
					options.comment = comment.clone();
				}
				SessionAction::Goto { session_id } => options.session_id = session_id.clone(),
				SessionAction::List { track, status } => {
					options.track = track.clone();
					options.status = status.clone();
				}
			},
			Commands::Speaker(args) => match &args.action {
				SpeakerAction::Search { query } => options.query = query.clone(),
				SpeakerAction::Sessions { name } => options.query = name.clone(),
			},
			Commands::Auth(_) | Commands::Config(_) => {}
		}
		options
	}
}
