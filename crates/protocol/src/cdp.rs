//! Chrome DevTools Protocol message envelopes.
//!
//! Commands go out as [`CdpRequest`]; everything that comes back is parsed as
//! [`CdpMessage`], which is either a response (has an `id`) or an event (has a
//! `method`). Page-scoped traffic carries the flattened target `sessionId`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing CDP command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpRequest {
	pub id: u64,
	pub method: String,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Error object attached to a failed command response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CdpErrorPayload {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
}

/// Response to a [`CdpRequest`], correlated by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpResponse {
	pub id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<CdpErrorPayload>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Unsolicited protocol event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpEvent {
	pub method: String,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Any inbound frame.
///
/// Responses are tried first since events never carry an `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CdpMessage {
	Response(CdpResponse),
	Event(CdpEvent),
}

/// Entry of `Target.getTargets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub target_id: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub attached: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub browser_context_id: Option<String>,
}

/// Result of `Target.getTargets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
	#[serde(default)]
	pub target_infos: Vec<TargetInfo>,
}

/// Result of `Target.attachToTarget` with `flatten: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
	pub session_id: String,
}

/// Result of `Target.createTarget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
	pub target_id: String,
}

/// Result of `Page.navigate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
	#[serde(default)]
	pub frame_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_text: Option<String>,
}

/// Mirror of a JavaScript value returned by `Runtime.evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtype: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// Details of an exception thrown during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	#[serde(default)]
	pub text: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best human-readable message: the thrown object's description, else the summary text.
	pub fn message(&self) -> String {
		self.exception
			.as_ref()
			.and_then(|e| e.description.clone())
			.unwrap_or_else(|| self.text.clone())
	}
}

/// Result of `Runtime.evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	pub result: RemoteObject,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception_details: Option<ExceptionDetails>,
}

/// `Network.requestWillBeSent` / `loadingFinished` / `loadingFailed` all carry this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequestEvent {
	pub request_id: String,
}
