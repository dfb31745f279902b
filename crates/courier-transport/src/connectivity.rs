// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use tokio::sync::watch;

/// The two-state connectivity signal supplied by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
	Online,
	Offline,
}

impl Connectivity {
	pub fn is_online(&self) -> bool {
		matches!(self, Connectivity::Online)
	}
}

/// Broadcast point for connectivity transitions.
///
/// The host environment owns one monitor and feeds it "became reachable" /
/// "became unreachable" notifications; the sync engine and the status
/// facade subscribe. A watch channel keeps only the latest state, which is
/// exactly the semantics the signal needs.
#[derive(Debug)]
pub struct ConnectivityMonitor {
	tx: watch::Sender<Connectivity>,
}

impl ConnectivityMonitor {
	pub fn new(initial: Connectivity) -> Self {
		let (tx, _) = watch::channel(initial);
		Self { tx }
	}

	/// Record a connectivity transition. Setting the current state again is
	/// harmless; subscribers only observe changes.
	pub fn set(&self, state: Connectivity) {
		self.tx.send_if_modified(|current| {
			if *current == state {
				false
			} else {
				*current = state;
				true
			}
		});
	}

	pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
		self.tx.subscribe()
	}

	pub fn current(&self) -> Connectivity {
		*self.tx.borrow()
	}
}

impl Default for ConnectivityMonitor {
	fn default() -> Self {
		Self::new(Connectivity::Online)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn subscribers_observe_transitions() {
		let monitor = ConnectivityMonitor::new(Connectivity::Offline);
		let mut rx = monitor.subscribe();

		assert_eq!(*rx.borrow(), Connectivity::Offline);

		monitor.set(Connectivity::Online);
		rx.changed().await.unwrap();
		assert_eq!(*rx.borrow(), Connectivity::Online);
		assert!(monitor.current().is_online());
	}

	#[tokio::test]
	async fn setting_the_same_state_does_not_notify() {
		let monitor = ConnectivityMonitor::new(Connectivity::Online);
		let mut rx = monitor.subscribe();
		rx.mark_unchanged();

		monitor.set(Connectivity::Online);
		assert!(!rx.has_changed().unwrap());
	}
}
