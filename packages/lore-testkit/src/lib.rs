mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use serde_json::{Map, Value, json};

/// One learning row as the stores hold it.
pub fn learning(content: &str, learned_from: &str, depth_score: i64) -> Value {
	json!({
		"content": content,
		"learned_from": learned_from,
		"depth_score": depth_score,
		"topic": "general",
	})
}

pub fn learning_at(content: &str, learned_from: &str, depth_score: i64, timestamp: &str) -> Value {
	let mut row = learning(content, learned_from, depth_score);

	row["timestamp"] = Value::String(timestamp.to_string());

	row
}

/// Builder for a snapshot document in the on-disk layout.
#[derive(Debug, Default)]
pub struct SnapshotDocument {
	learnings: Vec<Value>,
	average_depth: f64,
	questions_asked: Vec<Value>,
	interesting_agents: Map<String, Value>,
	submolts_engaged: Map<String, Value>,
}
impl SnapshotDocument {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn learning(mut self, row: Value) -> Self {
		self.learnings.push(row);

		self
	}

	pub fn learnings(mut self, rows: impl IntoIterator<Item = Value>) -> Self {
		self.learnings.extend(rows);

		self
	}

	pub fn average_depth(mut self, value: f64) -> Self {
		self.average_depth = value;

		self
	}

	pub fn question(mut self, text: &str) -> Self {
		self.questions_asked.push(Value::String(text.to_string()));

		self
	}

	pub fn agent(mut self, name: &str, interactions: u64) -> Self {
		self.interesting_agents.insert(name.to_string(), json!({ "interactions": interactions }));

		self
	}

	pub fn submolt(mut self, name: &str) -> Self {
		self.submolts_engaged.insert(name.to_string(), json!({}));

		self
	}

	pub fn into_map(self) -> Map<String, Value> {
		let mut doc = Map::new();

		doc.insert("learnings".to_string(), Value::Array(self.learnings));
		doc.insert("average_depth".to_string(), json!(self.average_depth));
		doc.insert("questions_asked".to_string(), Value::Array(self.questions_asked));
		doc.insert("interesting_agents".to_string(), Value::Object(self.interesting_agents));
		doc.insert("submolts_engaged".to_string(), Value::Object(self.submolts_engaged));

		doc
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.into_map())
	}
}

/// A snapshot file in the temp directory, removed on drop.
#[derive(Debug)]
pub struct TempSnapshotFile {
	path: PathBuf,
}
impl TempSnapshotFile {
	pub fn new(document: &Value) -> Result<Self> {
		Self::raw(&serde_json::to_string_pretty(document)?)
	}

	pub fn raw(contents: &str) -> Result<Self> {
		let path = unique_temp_path("lore_snapshot", "json");

		fs::write(&path, contents)?;

		Ok(Self { path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl Drop for TempSnapshotFile {
	fn drop(&mut self) {
		let _ = fs::remove_file(&self.path);
	}
}

/// A path in the temp directory that no other test in this process will use.
pub fn unique_temp_path(prefix: &str, extension: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();

	env::temp_dir().join(format!("{prefix}_{nanos}_{pid}_{ordinal}.{extension}"))
}
