// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The replay transport contract for Courier.
//!
//! This crate defines:
//! - [`Transport`]: the seam between the pipeline and the remote API. Given a
//!   mutation descriptor it performs the network call and classifies the
//!   result into one of four buckets (success, client error, server error,
//!   network error).
//! - [`HttpTransport`]: the production implementation over `reqwest`.
//! - [`ConnectivityMonitor`]: the two-state reachability signal the host
//!   environment feeds and the rest of the pipeline subscribes to.
//!
//! The transport is fire-and-forget HTTP: it cannot distinguish "the server
//! never saw the request" from "the server applied it but the acknowledgment
//! was lost". Replaying a CREATE in the latter case produces a duplicate
//! resource. That at-least-once limitation is inherent to this contract;
//! remote APIs that care should accept a client-generated idempotency key.

pub mod client;
pub mod connectivity;
pub mod http;
pub mod outcome;
pub mod request;

use async_trait::async_trait;

pub use client::{builder, new_client, user_agent};
pub use connectivity::{Connectivity, ConnectivityMonitor};
pub use http::{ConfigError, HttpConfig, HttpTransport};
pub use outcome::TransportOutcome;
pub use request::{MutationRequest, RequestMethod};

/// Performs one network delivery attempt for a mutation.
///
/// `send` is infallible by design: every failure mode, including "no
/// response at all", is a [`TransportOutcome`] classification rather than an
/// error. Callers branch on the outcome, never on a transport panic.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send(&self, request: &MutationRequest) -> TransportOutcome;
}
