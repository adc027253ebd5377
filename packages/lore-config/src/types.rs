use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub store: Store,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Backing sources for the learning log. At least one must be configured.
#[derive(Debug, Default, Deserialize)]
pub struct Store {
	/// Authoritative source when present.
	pub remote: Option<RemoteStore>,
	/// Consulted only when the remote source is absent or fails.
	pub snapshot: Option<SnapshotStore>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotStore {
	/// Relative paths are resolved against the directory holding the config file.
	pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct RemoteStore {
	pub url: String,
	/// Optional. When absent or blank, the key is read from `api_key_env` at load time.
	pub api_key: Option<String>,
	#[serde(default = "default_api_key_env")]
	pub api_key_env: String,
	#[serde(default = "default_learnings_table")]
	pub learnings_table: String,
	#[serde(default = "default_stats_table")]
	pub stats_table: String,
	#[serde(default = "default_order_column")]
	pub order_column: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	/// Rows requested per page of the learnings table. The server may cap pages lower.
	#[serde(default = "default_page_size")]
	pub page_size: usize,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_api_key_env() -> String {
	"LORE_REMOTE_API_KEY".to_string()
}

fn default_learnings_table() -> String {
	"learnings".to_string()
}

fn default_stats_table() -> String {
	"agent_stats".to_string()
}

fn default_order_column() -> String {
	"id".to_string()
}

fn default_timeout_ms() -> u64 {
	5_000
}

fn default_page_size() -> usize {
	1_000
}
