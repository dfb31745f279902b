// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The Courier mutation interceptor.
//!
//! [`CourierClient`] wraps every outgoing mutation. Successful responses and
//! ordinary failures pass through unchanged; a failure consistent with a
//! connectivity problem gets the mutation written to the durable outbox and
//! the caller receives [`SendOutcome::Queued`] — a status deliberately
//! distinct from success, so the user can be told the change is pending
//! rather than applied.

pub mod interceptor;

pub use interceptor::{CourierClient, SendError, SendOptions, SendOutcome};
