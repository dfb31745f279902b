// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Classification of one delivery attempt.
///
/// The sync engine's retry policy branches entirely on this enum:
/// `Success` and `ClientError` are terminal for a record, `ServerError` and
/// `Network` are retryable.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
	/// 2xx. The real response status and decoded body, passed through to
	/// callers unchanged.
	Success {
		status: u16,
		body: Option<serde_json::Value>,
	},
	/// 4xx. The request can never succeed as-is; retrying is pointless.
	ClientError {
		status: u16,
		body: Option<serde_json::Value>,
	},
	/// 5xx. The remote side failed transiently.
	ServerError { status: u16 },
	/// No response received at all: connection refused, DNS failure,
	/// timeout. The message is diagnostic only.
	Network(String),
}

impl TransportOutcome {
	/// Map a response status (plus decoded body, if any) to an outcome.
	///
	/// 1xx/3xx land in `ServerError`: the pipeline only ever issues JSON
	/// mutations, so anything that is not a definitive 2xx or 4xx answer is
	/// treated as a transient anomaly worth retrying.
	pub fn classify(status: u16, body: Option<serde_json::Value>) -> Self {
		match status {
			200..=299 => TransportOutcome::Success { status, body },
			400..=499 => TransportOutcome::ClientError { status, body },
			_ => TransportOutcome::ServerError { status },
		}
	}

	/// Whether re-attempting later has a plausible chance of success.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			TransportOutcome::ServerError { .. } | TransportOutcome::Network(_)
		)
	}
}
