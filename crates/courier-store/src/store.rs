// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{Result, StoreError};
use crate::types::{NewMutation, QueuedMutation};

type MutationRow = (
	String,
	String,
	String,
	Option<String>,
	Option<String>,
	DateTime<Utc>,
	i64,
);

/// Durable CRUD over queued mutations, keyed by `id`.
///
/// All operations touch the backing SQLite database and nothing else; the
/// store never performs network access. Per-record operations are atomic,
/// which is the only concurrency discipline the pipeline requires of it.
#[derive(Clone)]
pub struct QueueStore {
	pool: SqlitePool,
}

impl QueueStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create the outbox table and its ordering index if they do not exist.
	#[tracing::instrument(skip(self))]
	pub async fn init_schema(&self) -> Result<()> {
		sqlx::query(
			r#"
            CREATE TABLE IF NOT EXISTS queued_mutations (
                id TEXT PRIMARY KEY,
                endpoint TEXT NOT NULL,
                method TEXT NOT NULL,
                payload TEXT,
                extra_headers TEXT,
                enqueued_at TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
		)
		.execute(&self.pool)
		.await?;

		sqlx::query(
			"CREATE INDEX IF NOT EXISTS idx_queued_mutations_enqueued_at ON queued_mutations(enqueued_at)",
		)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Insert a new record, assigning its id and enqueue timestamp.
	///
	/// A failure here means durability was not achieved for this mutation;
	/// the caller must surface that rather than report the change as queued.
	#[tracing::instrument(skip(self, new), fields(endpoint = %new.endpoint, method = %new.method.as_str()))]
	pub async fn enqueue(&self, new: NewMutation) -> Result<QueuedMutation> {
		let record = QueuedMutation {
			id: uuid::Uuid::new_v4().to_string(),
			endpoint: new.endpoint,
			method: new.method,
			payload: new.payload,
			extra_headers: new.extra_headers,
			enqueued_at: Utc::now(),
			retry_count: 0,
		};

		let payload_str = record
			.payload
			.as_ref()
			.map(|p| serde_json::to_string(p))
			.transpose()?;
		let headers_str = record
			.extra_headers
			.as_ref()
			.map(|h| serde_json::to_string(h))
			.transpose()?;

		sqlx::query(
			r#"
            INSERT INTO queued_mutations (id, endpoint, method, payload, extra_headers, enqueued_at, retry_count)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
		)
		.bind(&record.id)
		.bind(&record.endpoint)
		.bind(record.method.as_str())
		.bind(payload_str)
		.bind(headers_str)
		.bind(record.enqueued_at)
		.bind(record.retry_count as i64)
		.execute(&self.pool)
		.await?;

		tracing::debug!(id = %record.id, "mutation queued");
		Ok(record)
	}

	/// Snapshot of all pending records, oldest first.
	///
	/// The id tiebreak keeps enumeration stable when two records share an
	/// enqueue timestamp.
	#[tracing::instrument(skip(self))]
	pub async fn list_all(&self) -> Result<Vec<QueuedMutation>> {
		let rows = sqlx::query_as::<_, MutationRow>(
			r#"
            SELECT id, endpoint, method, payload, extra_headers, enqueued_at, retry_count
            FROM queued_mutations
            ORDER BY enqueued_at ASC, id ASC
            "#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(row_to_mutation).collect()
	}

	/// Remove a record by id. Idempotent: removing a missing id is a no-op.
	#[tracing::instrument(skip(self))]
	pub async fn remove(&self, id: &str) -> Result<()> {
		sqlx::query("DELETE FROM queued_mutations WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	/// Atomically bump a record's retry count by one.
	#[tracing::instrument(skip(self, record), fields(id = %record.id))]
	pub async fn increment_retry(&self, record: &QueuedMutation) -> Result<()> {
		sqlx::query("UPDATE queued_mutations SET retry_count = retry_count + 1 WHERE id = ?")
			.bind(&record.id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	/// Remove every record. Administrative and test use only.
	#[tracing::instrument(skip(self))]
	pub async fn clear(&self) -> Result<()> {
		sqlx::query("DELETE FROM queued_mutations")
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	/// Number of records currently awaiting replay.
	#[tracing::instrument(skip(self))]
	pub async fn pending_count(&self) -> Result<u64> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queued_mutations")
			.fetch_one(&self.pool)
			.await?;

		Ok(count as u64)
	}
}

fn row_to_mutation(row: MutationRow) -> Result<QueuedMutation> {
	let (id, endpoint, method, payload, extra_headers, enqueued_at, retry_count) = row;

	Ok(QueuedMutation {
		id,
		endpoint,
		method: method.parse().map_err(StoreError::Internal)?,
		payload: payload.as_deref().map(serde_json::from_str).transpose()?,
		extra_headers: extra_headers
			.as_deref()
			.map(serde_json::from_str)
			.transpose()?,
		enqueued_at,
		retry_count: retry_count as u32,
	})
}
