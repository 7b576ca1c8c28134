//! Ordered multi-strategy page probing.
//!
//! The target application's markup is not ours and drifts. Each goal is
//! expressed as a list of [`Script`]s ordered from most specific to most
//! generic; the first one producing a truthy value wins. A strategy that
//! throws counts as a miss.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::page::{PageLike, Script};

/// JavaScript truthiness for JSON values.
pub fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

/// Returns the first truthy strategy result, converted to `T`.
///
/// A result that does not deserialize as `T` is treated like a throw.
pub async fn find_first<T: DeserializeOwned>(page: &dyn PageLike, strategies: &[Script], args: &Value) -> Option<T> {
	for strategy in strategies {
		match page.evaluate(strategy, args.clone()).await {
			Ok(value) if is_truthy(&value) => match serde_json::from_value(value) {
				Ok(found) => {
					debug!(strategy = strategy.name, "strategy matched");
					return Some(found);
				}
				Err(e) => debug!(strategy = strategy.name, error = %e, "strategy returned an unexpected shape"),
			},
			Ok(_) => debug!(strategy = strategy.name, "strategy found nothing"),
			Err(e) => debug!(strategy = strategy.name, error = %e, "strategy failed"),
		}
	}
	None
}

/// Runs mutating strategies until one reports success; returns its name.
pub async fn click_first(page: &dyn PageLike, strategies: &[Script], args: &Value) -> Option<&'static str> {
	for strategy in strategies {
		match page.evaluate(strategy, args.clone()).await {
			Ok(value) if is_truthy(&value) => {
				debug!(strategy = strategy.name, "strategy acted");
				return Some(strategy.name);
			}
			Ok(_) => debug!(strategy = strategy.name, "strategy found nothing"),
			Err(e) => debug!(strategy = strategy.name, error = %e, "strategy failed"),
		}
	}
	None
}
