// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use courier_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	/// The outbox itself became unusable mid-pass. Individual replay
	/// failures never surface here; they are classified per record.
	#[error("outbox error: {0}")]
	Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
