//! The user's config file, `~/.sessionize-cli.json`.

use std::path::{Path, PathBuf};

use sessionize::Options;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = ".sessionize-cli.json";

/// Config file location: `explicit` (from `--config` / `SESSIONIZE_CONFIG`),
/// else the home directory, else the temp directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
	match explicit {
		Some(path) => path.to_path_buf(),
		None => dirs::home_dir().unwrap_or_else(std::env::temp_dir).join(CONFIG_FILE_NAME),
	}
}

/// Loads the config file. A missing or unreadable file yields empty options.
pub fn load(path: &Path) -> Options {
	let data = match std::fs::read_to_string(path) {
		Ok(data) => data,
		Err(e) => {
			debug!(path = %path.display(), error = %e, "no config file");
			return Options::default();
		}
	};
	match serde_json::from_str(&data) {
		Ok(options) => options,
		Err(e) => {
			warn!(path = %path.display(), error = %e, "ignoring corrupt config file");
			Options::default()
		}
	}
}
