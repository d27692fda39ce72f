//! prometheus meters of the relay, exposed by the
//! [telemetry endpoint](crate::telemetry_endpoint)
use prometheus::{
	exponential_buckets, histogram_opts, opts, Histogram, IntCounter, IntCounterVec, Registry,
};

#[derive(Debug, Clone)]
pub struct Metrics {
	/// registry all meters below are registered with
	registry: Registry,
	/// number of decoded alerts by status
	pub received_alerts: IntCounterVec,
	/// number of request bodies that weren't valid notifications
	pub rejected_notifications: IntCounter,
	/// number of discord webhook calls by outcome
	pub deliveries: IntCounterVec,
	/// time spent calling the discord webhook
	pub delivery_duration: Histogram,
}

impl Metrics {
	/// construct and register prometheus meters
	pub fn new() -> Result<Self, prometheus::Error> {
		let registry = Registry::new_custom(Some("alertcord".to_owned()), None)?;

		let received_alerts = IntCounterVec::new(
			opts!("received_alerts", "total number of deserialized alerts")
				.subsystem("alertmanager_webhook"),
			&["status"],
		)?;

		let rejected_notifications = IntCounter::with_opts(
			opts!("rejected_notifications", "number of request bodies that failed to deserialize")
				.subsystem("alertmanager_webhook"),
		)?;

		let deliveries = IntCounterVec::new(
			opts!("deliveries_total", "total number of discord webhook calls").subsystem("discord"),
			&["outcome"],
		)?;

		let delivery_duration = Histogram::with_opts(
			histogram_opts!(
				"delivery_duration_seconds",
				"total time of a discord webhook call in seconds",
				exponential_buckets(0.01, 2., 12)?
			)
			.subsystem("discord"),
		)?;

		registry.register(Box::new(received_alerts.clone()))?;
		registry.register(Box::new(rejected_notifications.clone()))?;
		registry.register(Box::new(deliveries.clone()))?;
		registry.register(Box::new(delivery_duration.clone()))?;

		Ok(Self { registry, received_alerts, rejected_notifications, deliveries, delivery_duration })
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn independent_registries() {
		let first = Metrics::new().unwrap();
		let second = Metrics::new().unwrap();

		first.deliveries.with_label_values(&["delivered"]).inc();

		assert_eq!(first.deliveries.with_label_values(&["delivered"]).get(), 1);
		assert_eq!(second.deliveries.with_label_values(&["delivered"]).get(), 0);
	}

	#[test]
	fn names_are_prefixed() {
		let metrics = Metrics::new().unwrap();
		metrics.rejected_notifications.inc();

		let names: Vec<_> =
			metrics.registry().gather().iter().map(|family| family.get_name().to_owned()).collect();

		assert!(names.contains(&"alertcord_alertmanager_webhook_rejected_notifications".to_owned()));
	}
}
