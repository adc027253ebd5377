use std::ops::RangeInclusive;

use time::OffsetDateTime;

use lore_domain::time_ago;
use lore_storage::{LearningRecord, MemorySnapshot};

use crate::LoreService;

/// Only the most recent records are considered at all.
pub const RECENT_WINDOW: usize = 20;
/// Depth band that may be shown publicly.
pub const PUBLIC_DEPTH: RangeInclusive<i64> = 5..=6;
pub const RECENT_LIMIT: usize = 5;

const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecentLearning {
	pub content: String,
	pub learned_from: String,
	pub depth_score: i64,
	pub topic: String,
	pub time_ago: String,
}

/// Windows before filtering: a qualifying record older than the window is never shown.
pub fn select_recent(snapshot: &MemorySnapshot, now: OffsetDateTime) -> Vec<RecentLearning> {
	let window = tail(&snapshot.learnings, RECENT_WINDOW);
	let public: Vec<&LearningRecord> =
		window.iter().filter(|record| PUBLIC_DEPTH.contains(&record.depth_score)).collect();

	tail(&public, RECENT_LIMIT).iter().map(|record| to_entry(record, now)).collect()
}

impl LoreService {
	pub async fn recent_learnings(&self) -> Vec<RecentLearning> {
		select_recent(&self.snapshot().await, OffsetDateTime::now_utc())
	}
}

fn tail<T>(items: &[T], len: usize) -> &[T] {
	&items[items.len().saturating_sub(len)..]
}

fn to_entry(record: &LearningRecord, now: OffsetDateTime) -> RecentLearning {
	RecentLearning {
		content: record.content.clone(),
		learned_from: record.learned_from.clone().unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
		depth_score: record.depth_score,
		topic: record.topic.clone(),
		time_ago: time_ago::time_ago(record.timestamp.as_deref(), now),
	}
}
