//! The http endpoint alertmanager posts its webhook notifications to. Every
//! method and path is accepted.
use std::{
	net::{IpAddr, SocketAddr},
	sync::Arc,
};

use anyhow::{Context, Result};
use axum::{extract::Extension, routing::any, Router};
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::Deserialize;

use crate::relay::Relay;

#[derive(Debug, Deserialize, Clone)]
pub struct AlertReceiverSettings {
	pub bind_address: IpAddr,
	pub port: u16,
}

impl AlertReceiverSettings {
	pub fn to_socket_addr(&self) -> SocketAddr {
		SocketAddr::new(self.bind_address, self.port)
	}
}

/// Answers 200 for every notification, whether discord accepted it or not.
/// Only bodies that aren't notifications get a 400.
async fn alertmanager_receiver(
	Extension(relay): Extension<Arc<Relay>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> StatusCode {
	tracing::info!(
		%method,
		%uri,
		?headers,
		body = %String::from_utf8_lossy(&body),
		"request received"
	);

	match relay.relay(&body).await {
		Ok(_) => StatusCode::OK,
		Err(err) => {
			tracing::warn!("failed to deserialize alert: {}", err);
			StatusCode::BAD_REQUEST
		}
	}
}

/// every method and path ends up in [alertmanager_receiver]
pub fn router(relay: Arc<Relay>) -> Router {
	Router::new().fallback(any(alertmanager_receiver).layer(Extension(relay)))
}

pub async fn run_alertmanager_receiver(
	settings: &AlertReceiverSettings,
	relay: Arc<Relay>,
) -> Result<()> {
	let addr = settings.to_socket_addr();
	tracing::info!(%addr, "listening for alertmanager notifications");

	axum::Server::bind(&addr)
		.serve(router(relay).into_make_service())
		.await
		.context("alertmanager endpoint crashed")?;

	Ok(())
}
