// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use std::env;
use std::time::Duration;

use crate::outcome::TransportOutcome;
use crate::request::{MutationRequest, RequestMethod};
use crate::Transport;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A required environment variable was not set.
	#[error("missing environment variable: {0}")]
	MissingEnvVar(String),

	/// A configuration value was empty or invalid.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Configuration for the production HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpConfig {
	/// Base URL of the remote API; queued endpoints are resolved against it.
	pub base_url: String,
	/// Per-request timeout. Elapsing counts as a network-level failure.
	pub timeout: Duration,
}

impl HttpConfig {
	/// Load configuration from environment variables.
	///
	/// # Required Environment Variables
	///
	/// - `COURIER_BASE_URL`: Base URL of the remote API.
	///
	/// # Optional Environment Variables
	///
	/// - `COURIER_TIMEOUT_SECS`: Per-request timeout in seconds (default 30).
	pub fn from_env() -> Result<Self, ConfigError> {
		let base_url = env::var("COURIER_BASE_URL")
			.map_err(|_| ConfigError::MissingEnvVar("COURIER_BASE_URL".to_string()))?;
		if base_url.is_empty() {
			return Err(ConfigError::InvalidConfig(
				"COURIER_BASE_URL must not be empty".to_string(),
			));
		}

		let timeout_secs = match env::var("COURIER_TIMEOUT_SECS") {
			Ok(raw) => raw.parse::<u64>().map_err(|_| {
				ConfigError::InvalidConfig(format!("COURIER_TIMEOUT_SECS is not a number: {raw}"))
			})?,
			Err(_) => DEFAULT_TIMEOUT_SECS,
		};

		Ok(Self {
			base_url,
			timeout: Duration::from_secs(timeout_secs),
		})
	}
}

/// Production [`Transport`] over reqwest.
///
/// Any failure to obtain a response (connect, DNS, timeout) is classified as
/// [`TransportOutcome::Network`]; everything else is classified by status.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	config: HttpConfig,
	http_client: reqwest::Client,
}

impl HttpTransport {
	/// Create a transport with the given configuration.
	///
	/// # Panics
	///
	/// Panics if the HTTP client cannot be built (should never happen in
	/// practice).
	pub fn new(config: HttpConfig) -> Self {
		let http_client = crate::client::builder()
			.timeout(config.timeout)
			.build()
			.expect("failed to build HTTP client");

		Self {
			config,
			http_client,
		}
	}

	/// Create a transport from `COURIER_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Ok(Self::new(HttpConfig::from_env()?))
	}

	fn url_for(&self, endpoint: &str) -> String {
		format!(
			"{}/{}",
			self.config.base_url.trim_end_matches('/'),
			endpoint.trim_start_matches('/')
		)
	}
}

#[async_trait]
impl Transport for HttpTransport {
	#[tracing::instrument(skip(self, request), fields(endpoint = %request.endpoint, method = %request.method.as_str()))]
	async fn send(&self, request: &MutationRequest) -> TransportOutcome {
		let url = self.url_for(&request.endpoint);

		let mut builder = match request.method {
			RequestMethod::Get => self.http_client.get(&url),
			RequestMethod::Post => self.http_client.post(&url),
			RequestMethod::Put => self.http_client.put(&url),
			RequestMethod::Patch => self.http_client.patch(&url),
			RequestMethod::Delete => self.http_client.delete(&url),
		};

		if let Some(headers) = &request.extra_headers {
			for (name, value) in headers {
				builder = builder.header(name, value);
			}
		}

		if let Some(payload) = &request.payload {
			builder = builder.json(payload);
		}

		let response = match builder.send().await {
			Ok(response) => response,
			Err(e) => {
				tracing::debug!(error = %e, "request produced no response");
				return TransportOutcome::Network(e.to_string());
			}
		};

		let status = response.status().as_u16();
		let body = response.json::<serde_json::Value>().await.ok();

		TransportOutcome::classify(status, body)
	}
}
