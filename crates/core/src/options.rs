//! The flat options record consumed by every command flow.

use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::Credentials;
use crate::error::Result;
use crate::target::EvaluationTarget;

/// Merged configuration and flags. All fields are optional; each flow checks
/// what it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
	#[serde(deserialize_with = "string_or_number")]
	pub api_key: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub project_id: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub email: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub password: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub event_id: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub evaluation_id: Option<String>,
	/// `--id`: explicit session for `session show` / `session rate`.
	#[serde(deserialize_with = "string_or_number")]
	pub id: Option<String>,
	/// Positional session id of `session goto`.
	#[serde(deserialize_with = "string_or_number")]
	pub session_id: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub ratings: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub comment: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub query: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub track: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub status: Option<String>,
}

impl Options {
	/// Overlays every non-empty field of `other` onto `self`.
	pub fn merge(&mut self, other: &Options) {
		fn overlay(dst: &mut Option<String>, src: &Option<String>) {
			if let Some(value) = src.as_ref().filter(|v| !v.is_empty()) {
				*dst = Some(value.clone());
			}
		}
		overlay(&mut self.api_key, &other.api_key);
		overlay(&mut self.project_id, &other.project_id);
		overlay(&mut self.email, &other.email);
		overlay(&mut self.password, &other.password);
		overlay(&mut self.event_id, &other.event_id);
		overlay(&mut self.evaluation_id, &other.evaluation_id);
		overlay(&mut self.id, &other.id);
		overlay(&mut self.session_id, &other.session_id);
		overlay(&mut self.ratings, &other.ratings);
		overlay(&mut self.comment, &other.comment);
		overlay(&mut self.query, &other.query);
		overlay(&mut self.track, &other.track);
		overlay(&mut self.status, &other.status);
	}

	pub fn merged(mut self, other: &Options) -> Self {
		self.merge(other);
		self
	}

	pub fn credentials(&self) -> Credentials {
		Credentials {
			email: self.email.clone(),
			password: self.password.clone(),
		}
	}

	pub fn evaluation_target(&self) -> Result<EvaluationTarget> {
		EvaluationTarget::new(self.event_id.as_deref(), self.evaluation_id.as_deref())
	}

	/// Copy safe to print: the password keeps only its last four characters.
	pub fn masked(&self) -> Options {
		Options {
			password: self.password.as_deref().map(mask_secret),
			..self.clone()
		}
	}
}

/// `***` followed by the last four characters.
pub fn mask_secret(secret: &str) -> String {
	let tail: String = secret
		.chars()
		.rev()
		.take(4)
		.collect::<Vec<_>>()
		.into_iter()
		.rev()
		.collect();
	format!("***{tail}")
}

/// Ids in hand-written config files are often bare numbers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Str(String),
		Num(serde_json::Number),
		Bool(bool),
	}
	Ok(match Option::<Raw>::deserialize(deserializer)? {
		Some(Raw::Str(s)) => Some(s),
		Some(Raw::Num(n)) => Some(n.to_string()),
		Some(Raw::Bool(b)) => Some(b.to_string()),
		None => None,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_prefers_non_empty_overrides() {
		let file = Options {
			api_key: Some("bb_live_file".into()),
			event_id: Some("1".into()),
			email: Some("file@example.com".into()),
			..Default::default()
		};
		let flags = Options {
			event_id: Some("2".into()),
			email: Some(String::new()),
			..Default::default()
		};

		let merged = file.merged(&flags);

		assert_eq!(merged.api_key.as_deref(), Some("bb_live_file"));
		assert_eq!(merged.event_id.as_deref(), Some("2"));
		assert_eq!(merged.email.as_deref(), Some("file@example.com"));
	}

	#[test]
	fn numeric_ids_are_accepted() {
		let options: Options = serde_json::from_str(r#"{"eventId": 22203, "evaluationId": "8184", "password": null}"#).unwrap();
		assert_eq!(options.event_id.as_deref(), Some("22203"));
		assert_eq!(options.evaluation_id.as_deref(), Some("8184"));
		assert_eq!(options.password, None);
	}

	#[test]
	fn password_is_masked() {
		assert_eq!(mask_secret("correct-horse"), "***orse");
		assert_eq!(mask_secret("abc"), "***abc");

		let options = Options {
			password: Some("s3cretpass".into()),
			email: Some("a@b.c".into()),
			..Default::default()
		};
		let masked = options.masked();
		assert_eq!(masked.password.as_deref(), Some("***pass"));
		assert_eq!(masked.email, options.email);
	}

	#[test]
	fn credentials_and_target_come_from_options() {
		let options = Options {
			email: Some("a@b.c".into()),
			password: Some("pw".into()),
			event_id: Some("1".into()),
			evaluation_id: Some("2".into()),
			..Default::default()
		};
		assert_eq!(options.credentials(), Credentials::new("a@b.c", "pw"));
		assert!(options.evaluation_target().unwrap().url().ends_with("/rate/1/2"));
	}
}
