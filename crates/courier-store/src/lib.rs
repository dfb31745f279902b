// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable outbox storage for Courier.
//!
//! This crate provides the persistent queue of mutations awaiting replay:
//! records survive process restarts by living in a SQLite database. It also
//! owns the shared domain types (`QueuedMutation`, `MutationMethod`) used by
//! the interceptor and the sync engine.

pub mod error;
pub mod pool;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use pool::create_pool;
pub use store::QueueStore;
pub use types::{MutationMethod, NewMutation, QueuedMutation};
