//! prometheus alertmanager receiver that forwards alerts to a discord webhook
//!
//! Features:
//! - accepts alertmanager webhook notifications on any path
//! - sends one discord message per alert status, one embed per alert
//! - a failed status group doesn't keep the others from being delivered
//! - prometheus metrics about received alerts and webhook calls

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::Metrics;
use relay::Relay;
use settings::Settings;

mod alert;
mod alertmanager_webhook_receiver;
mod delivery;
mod discord;
mod log;
mod metrics;
mod relay;
mod settings;
mod status_groups;
mod telemetry_endpoint;

/// exit the complete program if one thread panics
fn setup_panic_handler() {
	let default_panic = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |info| {
		default_panic(info);
		std::process::exit(1);
	}));
}

/// the entry point of the program
#[tokio::main]
pub async fn main() -> Result<()> {
	setup_panic_handler();

	// tracing isn't set up before the settings are loaded
	let settings = Settings::load().context("failed to load config and command line arguments")?;

	log::setup_logging(&settings.log).context("could not setup logging")?;

	let metrics = Arc::new(Metrics::new().context("failed to register prometheus meters")?);

	let relay = Arc::new(
		Relay::new(&settings, Arc::clone(&metrics)).context("failed to construct relay")?,
	);

	tokio::try_join!(
		alertmanager_webhook_receiver::run_alertmanager_receiver(
			&settings.alert_webhook_receiver,
			relay
		),
		telemetry_endpoint::run_telemetry_endpoint(&settings.telemetry_endpoint, metrics),
	)?;

	Ok(())
}
