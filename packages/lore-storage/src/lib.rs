pub mod chain;
pub mod models;
pub mod remote;
pub mod snapshot_file;

mod error;

pub use chain::{FetchOutcome, SnapshotChain};
pub use error::Error;
pub use models::{AgentInfo, LearningRecord, MemorySnapshot};
pub use remote::RemoteTables;
pub use snapshot_file::SnapshotFile;

use std::{future::Future, pin::Pin};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A backing store that can produce a full snapshot of the learning log.
pub trait SnapshotSource
where
	Self: Send + Sync,
{
	/// Short label used in logs.
	fn name(&self) -> &str;

	fn fetch(&self) -> BoxFuture<'_, Result<MemorySnapshot>>;
}
