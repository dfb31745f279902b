// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use tokio::sync::watch;

use courier_store::QueueStore;
use courier_transport::Connectivity;

use crate::error::Result;

/// Point-in-time snapshot for external consumers (UI, health checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
	/// Records currently awaiting replay.
	pub pending_count: u64,
	/// Last observed connectivity signal.
	pub is_online: bool,
}

/// Read-only observability facade over the outbox and connectivity signal.
///
/// Never mutates state and is safe to poll at any time, including while a
/// drain is in flight. It has no rate limit of its own; very frequent
/// pollers should debounce externally.
pub struct QueueStatusService {
	store: QueueStore,
	connectivity: watch::Receiver<Connectivity>,
}

impl QueueStatusService {
	pub fn new(store: QueueStore, connectivity: watch::Receiver<Connectivity>) -> Self {
		Self {
			store,
			connectivity,
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn status(&self) -> Result<QueueStatus> {
		Ok(QueueStatus {
			pending_count: self.store.pending_count().await?,
			is_online: self.connectivity.borrow().is_online(),
		})
	}
}
