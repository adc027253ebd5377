use std::path::PathBuf;

use serde_json::Value;

use crate::{BoxFuture, Error, MemorySnapshot, Result, SnapshotSource};

/// A single JSON document holding the whole learning log.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
	path: PathBuf,
}
impl SnapshotFile {
	pub fn new(cfg: &lore_config::SnapshotStore) -> Self {
		Self::at(cfg.path.clone())
	}

	pub fn at(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub async fn read(&self) -> Result<MemorySnapshot> {
		let raw = tokio::fs::read(&self.path)
			.await
			.map_err(|err| Error::ReadSnapshot { path: self.path.clone(), source: err })?;
		let document: Value = serde_json::from_slice(&raw)
			.map_err(|err| Error::ParseSnapshot { path: self.path.clone(), source: err })?;

		match document {
			Value::Object(doc) => Ok(MemorySnapshot::from_document(&doc)),
			_ => Err(Error::InvalidResponse {
				message: format!("Snapshot file at {:?} must hold a JSON object.", self.path),
			}),
		}
	}
}
impl SnapshotSource for SnapshotFile {
	fn name(&self) -> &str {
		"snapshot_file"
	}

	fn fetch(&self) -> BoxFuture<'_, Result<MemorySnapshot>> {
		Box::pin(self.read())
	}
}
