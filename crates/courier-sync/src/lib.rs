// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The Courier sync engine.
//!
//! [`SyncEngine`] drives eventual delivery of queued mutations: it wakes on
//! the Offline→Online connectivity edge (or an explicit trigger), snapshots
//! the outbox, and replays records strictly in enqueue order, removing,
//! dropping, or deferring each one based on the transport outcome.
//!
//! [`QueueStatusService`] is the read-only facade the UI polls for queue
//! depth and connectivity.

pub mod config;
pub mod engine;
pub mod error;
pub mod status;

pub use config::{ConfigError, SyncConfig};
pub use engine::{DrainReport, DrainStats, EngineState, SyncEngine};
pub use error::{Result, SyncError};
pub use status::{QueueStatus, QueueStatusService};
