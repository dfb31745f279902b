// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use courier_store::{MutationMethod, QueuedMutation};
use std::collections::BTreeMap;

/// HTTP verbs the interceptor accepts. A superset of the mutating verbs:
/// `Get` flows through the interceptor but is never eligible for queuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl RequestMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			RequestMethod::Get => "GET",
			RequestMethod::Post => "POST",
			RequestMethod::Put => "PUT",
			RequestMethod::Patch => "PATCH",
			RequestMethod::Delete => "DELETE",
		}
	}

	/// The queueable mutation verb this maps to, if any.
	pub fn as_mutation(&self) -> Option<MutationMethod> {
		match self {
			RequestMethod::Get => None,
			RequestMethod::Post => Some(MutationMethod::Create),
			RequestMethod::Put => Some(MutationMethod::Update),
			RequestMethod::Patch => Some(MutationMethod::Patch),
			RequestMethod::Delete => Some(MutationMethod::Delete),
		}
	}
}

impl From<MutationMethod> for RequestMethod {
	fn from(method: MutationMethod) -> Self {
		match method {
			MutationMethod::Create => RequestMethod::Post,
			MutationMethod::Update => RequestMethod::Put,
			MutationMethod::Patch => RequestMethod::Patch,
			MutationMethod::Delete => RequestMethod::Delete,
		}
	}
}

/// One outgoing request as the transport sees it, whether it comes fresh
/// from a caller or is being replayed from the outbox.
#[derive(Debug, Clone)]
pub struct MutationRequest {
	pub endpoint: String,
	pub method: RequestMethod,
	pub payload: Option<serde_json::Value>,
	pub extra_headers: Option<BTreeMap<String, String>>,
}

impl From<&QueuedMutation> for MutationRequest {
	fn from(record: &QueuedMutation) -> Self {
		Self {
			endpoint: record.endpoint.clone(),
			method: record.method.into(),
			payload: record.payload.clone(),
			extra_headers: record.extra_headers.clone(),
		}
	}
}
