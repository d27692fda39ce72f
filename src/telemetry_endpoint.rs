//! Here we expose prometheus metrics about alertcord
use std::{
	net::{IpAddr, SocketAddr},
	sync::Arc,
};

use anyhow::{Context, Result};
use axum::{extract::Extension, routing::get, Router};
use http::{header::CONTENT_TYPE, HeaderName, StatusCode};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;

use crate::metrics::Metrics;

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryEndpointSettings {
	pub bind_address: IpAddr,
	pub port: u16,
}

impl TelemetryEndpointSettings {
	pub fn to_socket_addr(&self) -> SocketAddr {
		SocketAddr::new(self.bind_address, self.port)
	}
}

async fn metrics_handler(
	Extension(metrics): Extension<Arc<Metrics>>,
) -> Result<([(HeaderName, String); 1], Vec<u8>), StatusCode> {
	let mut buffer = vec![];
	let encoder = TextEncoder::new();
	let metric_families = metrics.registry().gather();

	encoder.encode(&metric_families, &mut buffer).map_err(|err| {
		tracing::error!("failed to encode metrics: {:?}", err);
		StatusCode::INTERNAL_SERVER_ERROR
	})?;

	Ok(([(CONTENT_TYPE, encoder.format_type().to_owned())], buffer))
}

pub fn router(metrics: Arc<Metrics>) -> Router {
	Router::new().route("/metrics", get(metrics_handler)).layer(Extension(metrics))
}

pub async fn run_telemetry_endpoint(
	settings: &TelemetryEndpointSettings,
	metrics: Arc<Metrics>,
) -> Result<()> {
	let addr = settings.to_socket_addr();
	tracing::info!(%addr, "serving metrics");

	axum::Server::bind(&addr)
		.serve(router(metrics).into_make_service())
		.await
		.context("telemetry endpoint crashed")?;

	Ok(())
}
