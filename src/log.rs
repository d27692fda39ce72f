use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::{
	filter::LevelFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
	EnvFilter,
};

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
	pub level: String,
}

impl LogSettings {
	pub fn level(&self) -> Result<tracing::Level> {
		tracing::Level::from_str(self.level.as_str())
			.with_context(|| format!("invalid log level {:?}", self.level))
	}
}

fn filter(settings: &LogSettings) -> Result<EnvFilter> {
	Ok(EnvFilter::default()
		.add_directive(LevelFilter::from_level(settings.level()?).into())
		.add_directive("hyper=warn".parse()?)
		.add_directive("reqwest=warn".parse()?)
		.add_directive("mio=warn".parse()?))
}

pub fn setup_logging(settings: &LogSettings) -> Result<()> {
	let fmt_layer = fmt::layer();

	tracing_subscriber::registry()
		.with(filter(settings)?)
		.with(fmt_layer)
		.try_init()
		.context("a global subscriber is already set")?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_level_case_insensitively() {
		let settings = LogSettings { level: "Debug".to_owned() };
		assert_eq!(settings.level().unwrap(), tracing::Level::DEBUG);
		assert!(filter(&settings).is_ok());
	}

	#[test]
	fn rejects_unknown_level() {
		let settings = LogSettings { level: "loud".to_owned() };
		assert!(settings.level().is_err());
	}
}
