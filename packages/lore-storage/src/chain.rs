use std::sync::Arc;

use crate::{Error, MemorySnapshot, RemoteTables, Result, SnapshotFile, SnapshotSource};

/// How a snapshot was obtained.
#[derive(Debug)]
pub enum FetchOutcome {
	/// The primary source answered; the fallback was not consulted.
	Primary(MemorySnapshot),
	/// The fallback answered. `primary_error` is `None` when no primary is configured.
	Fallback { snapshot: MemorySnapshot, primary_error: Option<Error> },
	/// Every configured source failed, or none is configured.
	Empty { errors: Vec<Error> },
}
impl FetchOutcome {
	pub fn label(&self) -> &'static str {
		match self {
			Self::Primary(_) => "primary",
			Self::Fallback { .. } => "fallback",
			Self::Empty { .. } => "empty",
		}
	}

	pub fn snapshot(&self) -> Option<&MemorySnapshot> {
		match self {
			Self::Primary(snapshot) | Self::Fallback { snapshot, .. } => Some(snapshot),
			Self::Empty { .. } => None,
		}
	}

	pub fn into_snapshot(self) -> MemorySnapshot {
		match self {
			Self::Primary(snapshot) | Self::Fallback { snapshot, .. } => snapshot,
			Self::Empty { .. } => MemorySnapshot::default(),
		}
	}
}

/// Primary source with an optional degrade-not-fail fallback. Holds no cached state.
#[derive(Clone, Default)]
pub struct SnapshotChain {
	primary: Option<Arc<dyn SnapshotSource>>,
	fallback: Option<Arc<dyn SnapshotSource>>,
}
impl SnapshotChain {
	pub fn new(
		primary: Option<Arc<dyn SnapshotSource>>,
		fallback: Option<Arc<dyn SnapshotSource>>,
	) -> Self {
		Self { primary, fallback }
	}

	pub fn from_config(cfg: &lore_config::Store) -> Result<Self> {
		let primary = match cfg.remote.as_ref() {
			Some(remote) => Some(Arc::new(RemoteTables::new(remote)?) as Arc<dyn SnapshotSource>),
			None => None,
		};
		let fallback = cfg
			.snapshot
			.as_ref()
			.map(|snapshot| Arc::new(SnapshotFile::new(snapshot)) as Arc<dyn SnapshotSource>);

		Ok(Self { primary, fallback })
	}

	pub async fn fetch(&self) -> FetchOutcome {
		let outcome = self.resolve().await;

		tracing::debug!(outcome = outcome.label(), "Snapshot fetched.");

		outcome
	}

	async fn resolve(&self) -> FetchOutcome {
		let mut primary_error = None;

		if let Some(primary) = self.primary.as_ref() {
			match primary.fetch().await {
				Ok(snapshot) => return FetchOutcome::Primary(snapshot),
				Err(err) => {
					tracing::warn!(source = primary.name(), error = %err, "Primary snapshot source failed.");

					primary_error = Some(err);
				},
			}
		}

		let Some(fallback) = self.fallback.as_ref() else {
			return FetchOutcome::Empty { errors: primary_error.into_iter().collect() };
		};

		match fallback.fetch().await {
			Ok(snapshot) => FetchOutcome::Fallback { snapshot, primary_error },
			Err(err) => {
				tracing::warn!(source = fallback.name(), error = %err, "Fallback snapshot source failed.");

				let mut errors: Vec<Error> = primary_error.into_iter().collect();

				errors.push(err);

				FetchOutcome::Empty { errors }
			},
		}
	}
}
