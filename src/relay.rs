//! Forwards alertmanager notifications to discord.
//!
//! Notifications are received from
//! [alertmanager_webhook_receiver](crate::alertmanager_webhook_receiver),
//! grouped by status, rendered by [discord](crate::discord) and posted by
//! [delivery](crate::delivery).

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{stream, StreamExt};

use crate::{
	alert::{Alert, Data, DecodeError},
	delivery::{DeliveryClient, DeliveryError, DeliveryResult},
	discord::{self, Presentation},
	metrics::Metrics,
	settings::Settings,
	status_groups::group_by_status,
};

#[derive(Debug)]
/// outcome of forwarding one status group
pub struct GroupOutcome {
	pub status: String,
	/// number of alerts in the group
	pub alerts: usize,
	pub result: Result<DeliveryResult, DeliveryError>,
}

impl GroupOutcome {
	/// the webhook accepted the message
	pub fn delivered(&self) -> bool {
		matches!(&self.result, Ok(response) if response.is_success())
	}
}

#[derive(Debug, Default)]
/// outcomes of all status groups of one notification
pub struct RelayReport {
	pub outcomes: Vec<GroupOutcome>,
}

impl RelayReport {
	pub fn delivered(&self) -> usize {
		self.outcomes.iter().filter(|outcome| outcome.delivered()).count()
	}

	pub fn failed(&self) -> usize {
		self.outcomes.len() - self.delivered()
	}
}

/// Shared by all requests. Holds no per-request state, so concurrent requests
/// don't need synchronization.
pub struct Relay {
	delivery: DeliveryClient,
	metrics: Arc<Metrics>,
	/// number of status groups of one notification delivered at the same time
	max_concurrent_groups: usize,
}

impl Relay {
	/// construct relay from settings
	pub fn new(settings: &Settings, metrics: Arc<Metrics>) -> Result<Self> {
		let delivery = DeliveryClient::new(settings.webhook_url.clone(), settings.delivery.timeout)
			.context("failed to construct delivery client")?;

		Ok(Self::with_client(delivery, metrics, settings.delivery.max_concurrent_groups))
	}

	pub fn with_client(
		delivery: DeliveryClient,
		metrics: Arc<Metrics>,
		max_concurrent_groups: usize,
	) -> Self {
		Self { delivery, metrics, max_concurrent_groups: max_concurrent_groups.max(1) }
	}

	/// Decodes a webhook request body and forwards one discord message per
	/// alert status.
	///
	/// Only a body that isn't a notification is an error. A failed delivery is
	/// recorded in the [RelayReport] and the remaining groups are still sent.
	///
	/// # Arguments
	///
	/// * `body` - raw body of the alertmanager webhook request
	pub async fn relay(&self, body: &[u8]) -> Result<RelayReport, DecodeError> {
		let data = match Data::decode(body) {
			Ok(data) => data,
			Err(err) => {
				self.metrics.rejected_notifications.inc();
				return Err(err);
			}
		};

		let received = data.alerts.len();
		let groups = group_by_status(data.alerts);

		for (status, alerts) in &groups {
			// labelled by presentation, the status itself is arbitrary client input
			self.metrics
				.received_alerts
				.with_label_values(&[Presentation::of(status).as_str()])
				.inc_by(alerts.len() as u64);
		}

		let deliveries: Vec<_> = groups
			.into_iter()
			.map(|(status, alerts)| self.relay_group(status, alerts))
			.collect();

		let outcomes: Vec<GroupOutcome> =
			stream::iter(deliveries).buffered(self.max_concurrent_groups).collect().await;

		let report = RelayReport { outcomes };

		if report.failed() == 0 {
			tracing::info!(
				groups = report.outcomes.len(),
				alerts = received,
				"relayed notification"
			);
		} else {
			let undelivered: Vec<_> = report
				.outcomes
				.iter()
				.filter(|outcome| !outcome.delivered())
				.map(|outcome| format!("{} ({} alerts)", outcome.status, outcome.alerts))
				.collect();

			tracing::warn!(
				groups = report.outcomes.len(),
				delivered = report.delivered(),
				?undelivered,
				"some status groups weren't delivered"
			);
		}

		Ok(report)
	}

	/// render and deliver a single status group
	async fn relay_group(&self, status: String, alerts: Vec<Alert>) -> GroupOutcome {
		let message = discord::build_message(&status, &alerts);

		let timer = self.metrics.delivery_duration.start_timer();
		let result = self.delivery.deliver(&message).await;
		timer.observe_duration();

		let outcome = match &result {
			Ok(response) if response.is_success() => "delivered",
			Ok(response) => {
				tracing::warn!(
					%status,
					http_status = response.status.as_u16(),
					body = %response.body,
					"discord rejected message"
				);
				"rejected"
			}
			Err(err) => {
				tracing::error!(%status, error = ?err, "failed to deliver status group");
				"failed"
			}
		};
		self.metrics.deliveries.with_label_values(&[outcome]).inc();

		GroupOutcome { status, alerts: alerts.len(), result }
	}
}
