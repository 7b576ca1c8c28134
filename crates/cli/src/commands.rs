//! Routes parsed arguments to the core command flows.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use sessionize::commands::{auth, session, speaker};
use sessionize::{CdpDriver, CommandContext, Options, Result, StateStore};
use sessionize_runtime::BrowserbaseClient;
use tracing::debug;

use crate::cli::{AuthAction, Cli, Commands, ConfigAction, SessionAction, SpeakerAction};
use crate::config;
use crate::output::Reply;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigShow {
	config_path: PathBuf,
	config: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigPath {
	config_path: PathBuf,
	exists: bool,
}

pub async fn dispatch(cli: Cli) -> Result<Reply> {
	let path = config::config_path(cli.config.as_deref());
	let options = config::load(&path).merged(&cli.options());
	debug!(config = %path.display(), "options loaded");

	match &cli.command {
		Commands::Config(args) => match args.action {
			ConfigAction::Show => Reply::ok(ConfigShow {
				config: present_fields(&options.masked())?,
				config_path: path,
			}),
			ConfigAction::Path => Reply::ok(ConfigPath {
				exists: path.exists(),
				config_path: path,
			}),
		},
		Commands::Auth(args) if args.action == AuthAction::Reset => Reply::ok(auth::reset(&context(options)?)?),
		Commands::Auth(args) => {
			let ctx = context(options)?;
			match args.action {
				AuthAction::Login => {
					let payload = auth::login(&ctx).await?;
					let success = payload.success;
					Ok(Reply::ok(payload)?.with_success(success))
				}
				_ => Reply::ok(auth::status(&ctx).await?),
			}
		}
		Commands::Session(args) => {
			let ctx = context(options)?;
			match args.action {
				SessionAction::Show { .. } => Reply::ok(session::show(&ctx).await?),
				SessionAction::Rate { .. } => Reply::ok(session::rate(&ctx).await?),
				SessionAction::Goto { .. } => Reply::ok(session::goto(&ctx).await?),
				SessionAction::List { .. } => Reply::ok(session::list(&ctx).await?),
			}
		}
		Commands::Speaker(args) => {
			let ctx = context(options)?;
			match args.action {
				SpeakerAction::Search { .. } => Reply::ok(speaker::search(&ctx).await?),
				SpeakerAction::Sessions { .. } => Reply::ok(speaker::sessions(&ctx).await?),
			}
		}
	}
}

fn context(options: Options) -> Result<CommandContext> {
	let provider = BrowserbaseClient::new(options.api_key.clone().unwrap_or_default())?;
	Ok(CommandContext::new(
		options,
		StateStore::from_env(),
		Arc::new(provider),
		Arc::new(CdpDriver),
	))
}

/// The options as a JSON object without unset fields.
fn present_fields(options: &Options) -> Result<Value> {
	let mut value = serde_json::to_value(options)?;
	if let Value::Object(map) = &mut value {
		map.retain(|_, v| !v.is_null());
	}
	Ok(value)
}
