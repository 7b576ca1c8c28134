use anyhow::Context;
use clap::Parser;
use sessionize_cli::{
	cli::Cli,
	commands, logging,
	output::{self, Failure},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let debug = cli.debug;
	let success = match commands::dispatch(cli).await {
		Ok(reply) => {
			output::print_json(&reply.envelope()).context("writing result")?;
			reply.success
		}
		Err(err) => {
			tracing::error!(code = %err.kind(), "{err}");
			output::print_json(&Failure::from_error(&err, debug)).context("writing error")?;
			false
		}
	};

	if !success {
		std::process::exit(1);
	}
	Ok(())
}
