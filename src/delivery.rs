//! Posts rendered messages to the discord webhook.
use std::time::Duration;

use anyhow::{Context, Result};
use http::{header::CONTENT_TYPE, StatusCode};
use thiserror::Error;
use url::Url;

use crate::discord::WebhookMessage;

/// Error occuring while calling the discord webhook. A response with an error
/// status isn't a [DeliveryError], see [DeliveryResult::is_success].
#[derive(Error, Debug)]
pub enum DeliveryError {
	/// the message couldn't be serialized to json
	#[error("failed to serialize discord webhook message")]
	Serialize(#[source] serde_json::Error),
	/// no response was received (connection refused, dns failure, timeout)
	#[error("failed to call discord webhook")]
	Transport(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// response of the discord webhook
pub struct DeliveryResult {
	pub status: StatusCode,
	/// response body, or a description of why it couldn't be read
	pub body: String,
}

impl DeliveryResult {
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}
}

#[derive(Debug, Clone)]
/// http client for the discord webhook. Doesn't retry, a failed call is
/// reported to the caller.
pub struct DeliveryClient {
	/// http client
	client: reqwest::Client,
	/// discord webhook url
	webhook_url: Url,
}

impl DeliveryClient {
	/// construct delivery client
	///
	/// # Arguments
	///
	/// * `webhook_url` - the discord webhook every message is posted to
	///
	/// * `timeout` - deadline of a single webhook call
	pub fn new(webhook_url: Url, timeout: Duration) -> Result<Self> {
		Ok(Self {
			client: reqwest::Client::builder()
				.timeout(timeout)
				.build()
				.context("failed to build reqwest client")?,
			webhook_url,
		})
	}

	/// Posts `message` to the webhook and returns the status and body of the
	/// response.
	pub async fn deliver(&self, message: &WebhookMessage) -> Result<DeliveryResult, DeliveryError> {
		let body = serde_json::to_vec(message).map_err(DeliveryError::Serialize)?;

		let response = self
			.client
			.post(self.webhook_url.clone())
			.header(CONTENT_TYPE, "application/json")
			.body(body)
			.send()
			.await
			.map_err(DeliveryError::Transport)?;

		let status = response.status();
		let body = match response.text().await {
			Ok(body) => body,
			Err(err) => format!("failed to read discord webhook response body: {err}"),
		};

		tracing::info!(http_status = status.as_u16(), %body, "discord webhook response");

		Ok(DeliveryResult { status, body })
	}
}
