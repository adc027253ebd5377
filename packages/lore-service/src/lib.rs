pub mod network;
pub mod recent;
pub mod stats;

pub use network::{AgentSummary, NetworkResponse};
pub use recent::RecentLearning;
pub use stats::StatsResponse;

use lore_storage::{FetchOutcome, MemorySnapshot, SnapshotChain};

/// Read path over the learning log. Every call fetches a fresh snapshot.
pub struct LoreService {
	pub store: SnapshotChain,
}
impl LoreService {
	pub fn new(store: SnapshotChain) -> Self {
		Self { store }
	}

	async fn snapshot(&self) -> MemorySnapshot {
		let outcome = self.store.fetch().await;

		if let FetchOutcome::Empty { errors } = &outcome {
			tracing::error!(failures = errors.len(), "No snapshot source answered; serving zero values.");
		}

		outcome.into_snapshot()
	}
}
