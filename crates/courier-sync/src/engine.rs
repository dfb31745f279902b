// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use courier_store::QueueStore;
use courier_transport::{Connectivity, MutationRequest, Transport, TransportOutcome};

use crate::config::SyncConfig;
use crate::error::Result;

/// Drain state machine. `Idle → Draining → Idle`; a trigger that arrives
/// while already `Draining` is coalesced into the pass in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
	Idle,
	Draining,
}

/// Per-pass accounting, one count per record outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DrainStats {
	/// Records in the snapshot this pass replayed.
	pub attempted: u32,
	/// Replayed successfully and removed.
	pub delivered: u32,
	/// Removed without success: rejected by the API or retry-exhausted.
	pub dropped: u32,
	/// Failed retryably; still queued for a future pass.
	pub deferred: u32,
}

/// What a drain trigger produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainReport {
	/// A full pass over the snapshot ran to completion.
	Completed(DrainStats),
	/// A pass was already in flight; this trigger was coalesced.
	Skipped,
}

/// Replays queued mutations once connectivity is plausible.
///
/// One pass works on the snapshot taken at trigger time: records are
/// attempted strictly in enqueue order, one outcome known before the next
/// attempt begins, and each is attempted at most once per pass. Records
/// enqueued mid-pass wait for the next trigger. A record's failure never
/// aborts the rest of the pass.
pub struct SyncEngine {
	store: QueueStore,
	transport: Arc<dyn Transport>,
	config: SyncConfig,
	state: Mutex<EngineState>,
	shutdown_tx: broadcast::Sender<()>,
}

impl SyncEngine {
	pub fn new(store: QueueStore, transport: Arc<dyn Transport>, config: SyncConfig) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			store,
			transport,
			config,
			state: Mutex::new(EngineState::Idle),
			shutdown_tx,
		}
	}

	/// Subscribe to the connectivity signal and drain on every transition
	/// to `Online`. Runs until [`shutdown`](Self::shutdown) or until the
	/// signal source goes away.
	pub fn spawn(self: Arc<Self>, mut connectivity: watch::Receiver<Connectivity>) -> JoinHandle<()> {
		let engine = self;
		let mut shutdown_rx = engine.shutdown_tx.subscribe();

		tokio::spawn(async move {
			loop {
				tokio::select! {
					changed = connectivity.changed() => {
						if changed.is_err() {
							debug!("connectivity source dropped; stopping sync loop");
							break;
						}
						if connectivity.borrow_and_update().is_online() {
							if let Err(e) = engine.drain().await {
								warn!(error = %e, "drain pass failed");
							}
						}
					}
					_ = shutdown_rx.recv() => {
						info!("sync engine shutting down");
						break;
					}
				}
			}
		})
	}

	/// Explicit manual trigger (periodic timer, UI action, tests).
	pub async fn trigger(&self) -> Result<DrainReport> {
		self.drain().await
	}

	/// Run one drain pass unless one is already in flight.
	#[instrument(skip(self))]
	pub async fn drain(&self) -> Result<DrainReport> {
		// The lock is the re-entrancy guard: a second concurrent drain would
		// replay records twice and break ordering.
		let mut state = match self.state.try_lock() {
			Ok(guard) => guard,
			Err(_) => {
				debug!("drain already in progress; trigger coalesced");
				return Ok(DrainReport::Skipped);
			}
		};

		*state = EngineState::Draining;
		let result = self.drain_snapshot().await;
		*state = EngineState::Idle;

		result.map(DrainReport::Completed)
	}

	async fn drain_snapshot(&self) -> Result<DrainStats> {
		let snapshot = self.store.list_all().await?;
		let mut stats = DrainStats::default();

		for record in snapshot {
			stats.attempted += 1;
			let request = MutationRequest::from(&record);

			match self.transport.send(&request).await {
				TransportOutcome::Success { status, .. } => {
					self.store.remove(&record.id).await?;
					stats.delivered += 1;
					debug!(id = %record.id, status, "queued mutation delivered");
				}
				TransportOutcome::ClientError { status, .. } => {
					// The record can never succeed as-is; replaying it again
					// would fail identically.
					self.store.remove(&record.id).await?;
					stats.dropped += 1;
					warn!(id = %record.id, status, endpoint = %record.endpoint, "mutation rejected by the API; dropping");
				}
				outcome @ (TransportOutcome::ServerError { .. } | TransportOutcome::Network(_)) => {
					if record.retry_count + 1 >= self.config.max_retries {
						self.store.remove(&record.id).await?;
						stats.dropped += 1;
						warn!(
							id = %record.id,
							retry_count = record.retry_count,
							endpoint = %record.endpoint,
							?outcome,
							"retry limit reached; dropping mutation"
						);
					} else {
						self.store.increment_retry(&record).await?;
						stats.deferred += 1;
						debug!(id = %record.id, retry_count = record.retry_count + 1, "replay failed; deferred to next pass");
					}
				}
			}
		}

		info!(
			attempted = stats.attempted,
			delivered = stats.delivered,
			dropped = stats.dropped,
			deferred = stats.deferred,
			"drain pass complete"
		);
		Ok(stats)
	}

	/// Current state of the drain state machine.
	pub fn state(&self) -> EngineState {
		match self.state.try_lock() {
			Ok(guard) => *guard,
			Err(_) => EngineState::Draining,
		}
	}

	/// Stop the spawned sync loop. A pass in flight runs its snapshot to
	/// completion; only the subscription stops.
	pub fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use courier_store::{MutationMethod, NewMutation};
	use courier_transport::ConnectivityMonitor;
	use sqlx::SqlitePool;
	use std::collections::VecDeque;
	use std::sync::Mutex as StdMutex;
	use std::time::Duration;

	/// Transport stub: scripted outcomes consumed in order, a fallback once
	/// the script runs out, and a log of the endpoints it was called with.
	struct StubTransport {
		script: StdMutex<VecDeque<TransportOutcome>>,
		fallback: TransportOutcome,
		calls: StdMutex<Vec<String>>,
		delay: Option<Duration>,
	}

	impl StubTransport {
		fn always(outcome: TransportOutcome) -> Arc<Self> {
			Arc::new(Self {
				script: StdMutex::new(VecDeque::new()),
				fallback: outcome,
				calls: StdMutex::new(Vec::new()),
				delay: None,
			})
		}

		fn scripted(outcomes: Vec<TransportOutcome>, fallback: TransportOutcome) -> Arc<Self> {
			Arc::new(Self {
				script: StdMutex::new(outcomes.into()),
				fallback,
				calls: StdMutex::new(Vec::new()),
				delay: None,
			})
		}

		fn slow(outcome: TransportOutcome, delay: Duration) -> Arc<Self> {
			Arc::new(Self {
				script: StdMutex::new(VecDeque::new()),
				fallback: outcome,
				calls: StdMutex::new(Vec::new()),
				delay: Some(delay),
			})
		}

		fn calls(&self) -> Vec<String> {
			self.calls.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl Transport for StubTransport {
		async fn send(&self, request: &MutationRequest) -> TransportOutcome {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			self.calls.lock().unwrap().push(request.endpoint.clone());
			let scripted = self.script.lock().unwrap().pop_front();
			scripted.unwrap_or_else(|| self.fallback.clone())
		}
	}

	fn ok() -> TransportOutcome {
		TransportOutcome::Success {
			status: 200,
			body: None,
		}
	}

	async fn setup_store() -> QueueStore {
		let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
		let store = QueueStore::new(pool);
		store.init_schema().await.unwrap();
		store
	}

	async fn enqueue(store: &QueueStore, endpoint: &str) -> String {
		store
			.enqueue(NewMutation {
				endpoint: endpoint.to_string(),
				method: MutationMethod::Create,
				payload: Some(serde_json::json!({"text": "hi"})),
				extra_headers: None,
			})
			.await
			.unwrap()
			.id
	}

	fn engine(store: QueueStore, transport: Arc<StubTransport>) -> SyncEngine {
		SyncEngine::new(store, transport, SyncConfig::default())
	}

	fn stats(report: DrainReport) -> DrainStats {
		match report {
			DrainReport::Completed(stats) => stats,
			DrainReport::Skipped => panic!("expected a completed pass"),
		}
	}

	#[tokio::test]
	async fn drain_of_empty_queue_completes_with_zero_stats() {
		let store = setup_store().await;
		let engine = engine(store, StubTransport::always(ok()));

		let report = engine.drain().await.unwrap();
		assert_eq!(stats(report), DrainStats::default());
		assert_eq!(engine.state(), EngineState::Idle);
	}

	#[tokio::test]
	async fn successful_replay_empties_the_queue_in_order() {
		let store = setup_store().await;
		enqueue(&store, "/a").await;
		enqueue(&store, "/b").await;
		enqueue(&store, "/c").await;

		let transport = StubTransport::always(ok());
		let engine = engine(store.clone(), transport.clone());

		let report = engine.drain().await.unwrap();
		let stats = stats(report);
		assert_eq!(stats.attempted, 3);
		assert_eq!(stats.delivered, 3);
		assert_eq!(transport.calls(), vec!["/a", "/b", "/c"]);
		assert_eq!(store.pending_count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn client_error_drops_on_the_first_pass() {
		let store = setup_store().await;
		let id = enqueue(&store, "/notes").await;

		let transport = StubTransport::always(TransportOutcome::ClientError {
			status: 400,
			body: None,
		});
		let engine = engine(store.clone(), transport);

		let report = engine.drain().await.unwrap();
		assert_eq!(stats(report).dropped, 1);

		let remaining = store.list_all().await.unwrap();
		assert!(remaining.iter().all(|r| r.id != id));
	}

	#[tokio::test]
	async fn server_error_defers_then_drops_after_retry_limit() {
		let store = setup_store().await;
		let id = enqueue(&store, "/notes").await;

		let transport = StubTransport::always(TransportOutcome::ServerError { status: 500 });
		let engine = engine(store.clone(), transport);

		// Passes 1 and 2 defer with a bumped count.
		for expected_count in [1, 2] {
			let report = engine.drain().await.unwrap();
			assert_eq!(stats(report).deferred, 1);
			let records = store.list_all().await.unwrap();
			assert_eq!(records.len(), 1);
			assert_eq!(records[0].retry_count, expected_count);
		}

		// Pass 3 reaches MAX_RETRIES and drops.
		let report = engine.drain().await.unwrap();
		assert_eq!(stats(report).dropped, 1);
		assert!(store.list_all().await.unwrap().iter().all(|r| r.id != id));
		assert_eq!(store.pending_count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn network_failures_count_against_the_same_retry_limit() {
		let store = setup_store().await;
		enqueue(&store, "/notes").await;

		let transport =
			StubTransport::always(TransportOutcome::Network("connection refused".to_string()));
		let engine = engine(store.clone(), transport);

		engine.drain().await.unwrap();
		engine.drain().await.unwrap();
		engine.drain().await.unwrap();

		assert_eq!(store.pending_count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn one_record_failing_does_not_abort_the_pass() {
		let store = setup_store().await;
		enqueue(&store, "/a").await;
		enqueue(&store, "/b").await;
		enqueue(&store, "/c").await;

		let transport = StubTransport::scripted(
			vec![
				ok(),
				TransportOutcome::ServerError { status: 502 },
				ok(),
			],
			ok(),
		);
		let engine = engine(store.clone(), transport.clone());

		let report = engine.drain().await.unwrap();
		let stats = stats(report);
		assert_eq!(stats.attempted, 3);
		assert_eq!(stats.delivered, 2);
		assert_eq!(stats.deferred, 1);

		// Only the failed record remains, with its count bumped.
		let remaining = store.list_all().await.unwrap();
		assert_eq!(remaining.len(), 1);
		assert_eq!(remaining[0].endpoint, "/b");
		assert_eq!(remaining[0].retry_count, 1);
		assert_eq!(transport.calls(), vec!["/a", "/b", "/c"]);
	}

	#[tokio::test]
	async fn a_record_is_attempted_at_most_once_per_pass() {
		let store = setup_store().await;
		enqueue(&store, "/notes").await;

		let transport = StubTransport::always(TransportOutcome::ServerError { status: 500 });
		let engine = engine(store.clone(), transport.clone());

		engine.drain().await.unwrap();
		assert_eq!(transport.calls().len(), 1);
	}

	#[tokio::test]
	async fn concurrent_trigger_is_coalesced() {
		let store = setup_store().await;
		enqueue(&store, "/slow").await;

		let transport = StubTransport::slow(ok(), Duration::from_millis(300));
		let engine = Arc::new(engine(store.clone(), transport));

		let first = {
			let engine = Arc::clone(&engine);
			tokio::spawn(async move { engine.drain().await.unwrap() })
		};

		tokio::time::sleep(Duration::from_millis(100)).await;
		assert_eq!(engine.state(), EngineState::Draining);

		let second = engine.drain().await.unwrap();
		assert_eq!(second, DrainReport::Skipped);

		let first = first.await.unwrap();
		assert_eq!(stats(first).delivered, 1);
		assert_eq!(engine.state(), EngineState::Idle);
	}

	#[tokio::test]
	async fn records_enqueued_mid_pass_wait_for_the_next_trigger() {
		let store = setup_store().await;
		enqueue(&store, "/first").await;

		let transport = StubTransport::slow(ok(), Duration::from_millis(300));
		let engine = Arc::new(engine(store.clone(), transport.clone()));

		let drain = {
			let engine = Arc::clone(&engine);
			tokio::spawn(async move { engine.drain().await.unwrap() })
		};

		tokio::time::sleep(Duration::from_millis(100)).await;
		enqueue(&store, "/second").await;

		let report = drain.await.unwrap();
		assert_eq!(stats(report).attempted, 1);
		assert_eq!(transport.calls(), vec!["/first"]);
		assert_eq!(store.pending_count().await.unwrap(), 1);

		// The next pass picks it up.
		engine.drain().await.unwrap();
		assert_eq!(store.pending_count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn connectivity_restored_triggers_a_drain() {
		let store = setup_store().await;
		enqueue(&store, "/notes").await;

		let monitor = ConnectivityMonitor::new(Connectivity::Offline);
		let engine = Arc::new(engine(store.clone(), StubTransport::always(ok())));
		let handle = Arc::clone(&engine).spawn(monitor.subscribe());

		monitor.set(Connectivity::Online);

		// The loop drains asynchronously; poll until the queue empties.
		let drained = async {
			loop {
				if store.pending_count().await.unwrap() == 0 {
					break;
				}
				tokio::time::sleep(Duration::from_millis(10)).await;
			}
		};
		tokio::time::timeout(Duration::from_secs(2), drained)
			.await
			.expect("queue never drained after reconnect");

		engine.shutdown();
		handle.await.unwrap();
	}

	#[tokio::test]
	async fn going_offline_does_not_trigger_a_drain() {
		let store = setup_store().await;
		enqueue(&store, "/notes").await;

		let monitor = ConnectivityMonitor::new(Connectivity::Online);
		let transport = StubTransport::always(ok());
		let engine = Arc::new(engine(store.clone(), transport.clone()));
		let handle = Arc::clone(&engine).spawn(monitor.subscribe());

		monitor.set(Connectivity::Offline);
		tokio::time::sleep(Duration::from_millis(100)).await;

		assert!(transport.calls().is_empty());
		assert_eq!(store.pending_count().await.unwrap(), 1);

		engine.shutdown();
		handle.await.unwrap();
	}
}
