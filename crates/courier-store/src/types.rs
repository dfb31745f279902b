// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The closed set of state-changing verbs the outbox accepts.
///
/// Read-only calls are never queued: replaying a stale read has no useful
/// effect, so the pipeline only deals in mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationMethod {
	Create,
	Update,
	Patch,
	Delete,
}

impl MutationMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			MutationMethod::Create => "create",
			MutationMethod::Update => "update",
			MutationMethod::Patch => "patch",
			MutationMethod::Delete => "delete",
		}
	}

	/// The HTTP verb this mutation is sent with on the wire.
	pub fn http_verb(&self) -> &'static str {
		match self {
			MutationMethod::Create => "POST",
			MutationMethod::Update => "PUT",
			MutationMethod::Patch => "PATCH",
			MutationMethod::Delete => "DELETE",
		}
	}
}

impl std::str::FromStr for MutationMethod {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"create" => Ok(MutationMethod::Create),
			"update" => Ok(MutationMethod::Update),
			"patch" => Ok(MutationMethod::Patch),
			"delete" => Ok(MutationMethod::Delete),
			_ => Err(format!("unknown mutation method: {s}")),
		}
	}
}

/// A mutation captured for later replay, as handed to the store.
///
/// The store assigns `id` and `enqueued_at` at insert time.
#[derive(Debug, Clone)]
pub struct NewMutation {
	pub endpoint: String,
	pub method: MutationMethod,
	pub payload: Option<serde_json::Value>,
	pub extra_headers: Option<BTreeMap<String, String>>,
}

/// The unit of durable work: one mutation awaiting replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedMutation {
	/// Unique record id (uuid v4, assigned at enqueue time).
	pub id: String,
	/// Target resource path, relative to the API base URL.
	pub endpoint: String,
	pub method: MutationMethod,
	pub payload: Option<serde_json::Value>,
	/// Headers captured at enqueue time. These are frozen: a record replayed
	/// much later is sent with the headers it was captured with, which can be
	/// stale under token rotation. Callers that need fresh credentials must
	/// re-derive them before triggering a drain.
	pub extra_headers: Option<BTreeMap<String, String>>,
	/// Enqueue timestamp; drains process records oldest-first.
	pub enqueued_at: DateTime<Utc>,
	/// Replay failures so far. Bumped only on a retryable failure; a record
	/// that would reach the configured limit is dropped instead.
	pub retry_count: u32,
}
