use std::{ffi::OsString, time::Duration};

use clap::{Arg, Command};
use config::Config;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use thiserror::Error;
use url::Url;

use crate::{
	alertmanager_webhook_receiver::AlertReceiverSettings, log::LogSettings,
	telemetry_endpoint::TelemetryEndpointSettings,
};

/// environment variable holding the discord webhook url
pub const WEBHOOK_ENV: &str = "DISCORD_WEBHOOK";
/// prefix of environment variables overriding config file entries
const ENV_PREFIX: &str = "ALERTCORD";

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("no discord webhook url, set DISCORD_WEBHOOK or pass --webhook.url")]
	MissingWebhookUrl,
	#[error("can't load config")]
	Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone)]
/// Everything the relay is configured with. Loaded once in `main` and handed
/// to the components that need it.
pub struct Settings {
	pub webhook_url: Url,
	pub alert_webhook_receiver: AlertReceiverSettings,
	pub telemetry_endpoint: TelemetryEndpointSettings,
	pub delivery: DeliverySettings,
	pub log: LogSettings,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct DeliverySettings {
	/// deadline of a single discord webhook call
	#[serde_as(as = "DurationSeconds<f64>")]
	pub timeout: Duration,
	/// number of status groups of one notification sent concurrently
	pub max_concurrent_groups: usize,
}

#[derive(Debug, Deserialize)]
/// [Settings] as read from the config sources, the webhook url is optional
/// until all sources are merged
struct RawSettings {
	webhook_url: Option<Url>,
	alert_webhook_receiver: AlertReceiverSettings,
	telemetry_endpoint: TelemetryEndpointSettings,
	delivery: DeliverySettings,
	log: LogSettings,
}

impl Settings {
	/// load settings from command line arguments, environment and the
	/// optional config file
	pub fn load() -> Result<Self, ConfigError> {
		Self::load_from(std::env::args_os(), std::env::var(WEBHOOK_ENV).ok())
	}

	/// # Arguments
	///
	/// * `args` - command line arguments including the binary name
	///
	/// * `webhook_env` - value of the [WEBHOOK_ENV] environment variable
	pub fn load_from<I, T>(args: I, webhook_env: Option<String>) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = T>,
		T: Into<OsString> + Clone,
	{
		let opts = command().get_matches_from(args);

		let mut builder = Config::builder()
			.set_default("alert_webhook_receiver.bind_address", "0.0.0.0")?
			.set_default("alert_webhook_receiver.port", 9094_i64)?
			.set_default("telemetry_endpoint.bind_address", "0.0.0.0")?
			.set_default("telemetry_endpoint.port", 9095_i64)?
			.set_default("delivery.timeout", 10.0_f64)?
			.set_default("delivery.max_concurrent_groups", 1_i64)?
			.set_default("log.level", "info")?;

		if let Some(config_path) = opts.value_of("config") {
			builder = builder.add_source(config::File::with_name(config_path));
		}

		let conf = builder
			.add_source(config::Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
			.set_override_option("webhook_url", non_empty(webhook_env))?
			.set_override_option("webhook_url", opts.value_of("webhook-url").map(str::to_owned))?
			.set_override_option("log.level", opts.value_of("level").map(str::to_owned))?
			.build()?;

		let raw: RawSettings = conf.try_deserialize()?;

		Ok(Self {
			webhook_url: raw.webhook_url.ok_or(ConfigError::MissingWebhookUrl)?,
			alert_webhook_receiver: raw.alert_webhook_receiver,
			telemetry_endpoint: raw.telemetry_endpoint,
			delivery: raw.delivery,
			log: raw.log,
		})
	}
}

/// an exported but empty variable counts as unset
fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.is_empty())
}

fn command() -> Command<'static> {
	Command::new(clap::crate_name!())
		.version(clap::crate_version!())
		.about(clap::crate_description!())
		.author(clap::crate_authors!())
		.args(&[
			Arg::new("config")
				.help("path of config file")
				.takes_value(true)
				.short('c')
				.long("config"),
			Arg::new("webhook-url")
				.help("discord webhook url, takes precedence over DISCORD_WEBHOOK")
				.takes_value(true)
				.long("webhook.url"),
			Arg::new("level")
				.help("log level")
				.possible_values(["error", "warn", "info", "debug", "trace"])
				.ignore_case(true)
				.takes_value(true)
				.long("log"),
		])
}

#[cfg(test)]
mod tests {
	use std::net::{IpAddr, Ipv4Addr};

	use super::*;

	const URL: &str = "https://discord.com/api/webhooks/1/env";

	#[test]
	fn missing_webhook_url_is_fatal() {
		let err = Settings::load_from(["alertcord"], None).unwrap_err();
		assert!(matches!(err, ConfigError::MissingWebhookUrl));
	}

	#[test]
	fn empty_environment_variable_is_missing() {
		let err = Settings::load_from(["alertcord"], Some(String::new())).unwrap_err();
		assert!(matches!(err, ConfigError::MissingWebhookUrl));
	}

	#[test]
	fn webhook_url_from_environment() {
		let settings = Settings::load_from(["alertcord"], Some(URL.to_owned())).unwrap();

		assert_eq!(settings.webhook_url.as_str(), URL);
		assert_eq!(settings.alert_webhook_receiver.port, 9094);
		assert_eq!(
			settings.alert_webhook_receiver.bind_address,
			IpAddr::V4(Ipv4Addr::UNSPECIFIED)
		);
		assert_eq!(settings.telemetry_endpoint.port, 9095);
		assert_eq!(settings.delivery.timeout, Duration::from_secs(10));
		assert_eq!(settings.delivery.max_concurrent_groups, 1);
		assert_eq!(settings.log.level, "info");
	}

	#[test]
	fn command_line_overrides_environment() {
		let settings = Settings::load_from(
			["alertcord", "--webhook.url", "https://discord.com/api/webhooks/2/cli", "--log", "DEBUG"],
			Some(URL.to_owned()),
		)
		.unwrap();

		assert_eq!(settings.webhook_url.as_str(), "https://discord.com/api/webhooks/2/cli");
		assert_eq!(settings.log.level, "DEBUG");
	}

	#[test]
	fn invalid_webhook_url_is_rejected() {
		let err = Settings::load_from(["alertcord", "--webhook.url", "not a url"], None).unwrap_err();
		assert!(matches!(err, ConfigError::Load(_)));
	}
}
