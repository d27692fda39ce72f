//! data structures for deserializing incoming alerts
use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// the request body couldn't be parsed as an alertmanager notification
#[derive(Error, Debug)]
#[error("malformed alertmanager notification: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// data from prometheus received by the alertmanager webhook receiver
#[allow(clippy::missing_docs_in_private_items)]
pub struct Data {
	pub version: String,
	pub group_key: String,
	pub truncated_alerts: u64,

	pub receiver: String,
	pub status: String,
	pub alerts: Vec<Alert>,
	pub group_labels: BTreeMap<String, String>,
	pub common_labels: BTreeMap<String, String>,
	pub common_annotations: BTreeMap<String, String>,
	#[serde(rename = "externalURL")]
	pub external_url: String,
}

impl Data {
	/// Parses a webhook request body. Missing fields fall back to their
	/// defaults, broken json doesn't.
	pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
		Ok(serde_json::from_slice(body)?)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct Alert {
	pub status: String,
	pub labels: BTreeMap<String, String>,
	pub annotations: BTreeMap<String, String>,
	pub starts_at: String,
	pub ends_at: String,
	#[serde(rename = "generatorURL")]
	pub generator_url: String,
	pub fingerprint: String,
}

impl Alert {
	/// the `summary` annotation or an empty string
	pub fn summary(&self) -> &str {
		self.annotation("summary")
	}

	/// the `description` annotation or an empty string
	pub fn description(&self) -> &str {
		self.annotation("description")
	}

	fn annotation(&self, key: &str) -> &str {
		self.annotations.get(key).map(String::as_str).unwrap_or_default()
	}
}
