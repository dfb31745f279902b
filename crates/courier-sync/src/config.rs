// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::env;

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A configuration value was empty or invalid.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Tuning knobs for the sync engine.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
	/// Replay failures a record may accumulate before it is dropped. A
	/// retryable failure that would push the count to this limit removes the
	/// record instead of deferring it.
	pub max_retries: u32,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			max_retries: DEFAULT_MAX_RETRIES,
		}
	}
}

impl SyncConfig {
	/// Load configuration from environment variables.
	///
	/// # Optional Environment Variables
	///
	/// - `COURIER_MAX_RETRIES`: retry limit per record (default 3).
	pub fn from_env() -> Result<Self, ConfigError> {
		let max_retries = match env::var("COURIER_MAX_RETRIES") {
			Ok(raw) => raw.parse::<u32>().map_err(|_| {
				ConfigError::InvalidConfig(format!("COURIER_MAX_RETRIES is not a number: {raw}"))
			})?,
			Err(_) => DEFAULT_MAX_RETRIES,
		};

		Ok(Self { max_retries })
	}
}
