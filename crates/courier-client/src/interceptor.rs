// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use tokio::sync::watch;

use courier_store::{NewMutation, QueueStore, StoreError};
use courier_transport::{Connectivity, MutationRequest, Transport, TransportOutcome};

/// Per-call options for [`CourierClient::send_with`].
#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
	/// Opt out of queuing for this call. When false, a connectivity failure
	/// is returned to the caller exactly as it would be without the outbox.
	pub queue_on_failure: bool,
}

impl Default for SendOptions {
	fn default() -> Self {
		Self {
			queue_on_failure: true,
		}
	}
}

/// What the caller gets back from an intercepted mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
	/// The remote API answered 2xx; the real response passes through.
	Delivered {
		status: u16,
		body: Option<serde_json::Value>,
	},
	/// The mutation is durably queued, not yet applied. Callers must report
	/// this as "pending sync", never as success.
	Queued { id: String },
}

/// Failures the interceptor propagates instead of queuing.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
	/// The remote API answered with a non-2xx status while reachable.
	#[error("request failed with status {status}")]
	Http {
		status: u16,
		body: Option<serde_json::Value>,
	},

	/// No response received and the call was not eligible for queuing.
	#[error("network failure: {0}")]
	Network(String),

	/// The network call failed and the durability fallback failed too.
	/// Neither happened; the caller must not assume the change is pending.
	#[error("failed to queue mutation: {0}")]
	Store(#[from] StoreError),
}

/// Wraps outgoing mutations, deciding per failed call whether to spool it.
///
/// A call is queued only when all three hold: the caller did not opt out,
/// the failure is connectivity-shaped (network-level error, or the host
/// reports itself offline), and the verb actually mutates state. Read-only
/// calls and genuine API rejections always propagate unchanged.
pub struct CourierClient {
	store: QueueStore,
	transport: Arc<dyn Transport>,
	connectivity: watch::Receiver<Connectivity>,
}

impl CourierClient {
	pub fn new(
		store: QueueStore,
		transport: Arc<dyn Transport>,
		connectivity: watch::Receiver<Connectivity>,
	) -> Self {
		Self {
			store,
			transport,
			connectivity,
		}
	}

	/// Send a mutation with default options (queuing enabled).
	pub async fn send(&self, request: MutationRequest) -> Result<SendOutcome, SendError> {
		self.send_with(request, SendOptions::default()).await
	}

	/// Send a mutation, queuing it on connectivity failure unless opted out.
	#[tracing::instrument(skip(self, request), fields(endpoint = %request.endpoint, method = %request.method.as_str()))]
	pub async fn send_with(
		&self,
		request: MutationRequest,
		options: SendOptions,
	) -> Result<SendOutcome, SendError> {
		match self.transport.send(&request).await {
			TransportOutcome::Success { status, body } => {
				Ok(SendOutcome::Delivered { status, body })
			}
			// A definitive rejection from the API: replaying the same bytes
			// can never succeed, so this is never queued.
			TransportOutcome::ClientError { status, body } => {
				Err(SendError::Http { status, body })
			}
			TransportOutcome::ServerError { status } => {
				if options.queue_on_failure && self.is_offline() {
					self.queue(&request, SendError::Http { status, body: None })
						.await
				} else {
					Err(SendError::Http { status, body: None })
				}
			}
			TransportOutcome::Network(message) => {
				if options.queue_on_failure {
					self.queue(&request, SendError::Network(message)).await
				} else {
					Err(SendError::Network(message))
				}
			}
		}
	}

	/// Spool the failed mutation if its verb is queueable; otherwise return
	/// the original failure unchanged.
	async fn queue(
		&self,
		request: &MutationRequest,
		original: SendError,
	) -> Result<SendOutcome, SendError> {
		let Some(method) = request.method.as_mutation() else {
			// Queuing a read has no useful effect.
			return Err(original);
		};

		let record = self
			.store
			.enqueue(NewMutation {
				endpoint: request.endpoint.clone(),
				method,
				payload: request.payload.clone(),
				extra_headers: request.extra_headers.clone(),
			})
			.await?;

		tracing::info!(id = %record.id, "mutation queued for later sync");
		Ok(SendOutcome::Queued { id: record.id })
	}

	fn is_offline(&self) -> bool {
		!self.connectivity.borrow().is_online()
	}
}
