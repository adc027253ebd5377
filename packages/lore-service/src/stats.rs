use lore_domain::level::{self, IntelligenceLevel};
use lore_storage::MemorySnapshot;

use crate::LoreService;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatsResponse {
	pub total_learnings: usize,
	pub avg_depth: f64,
	pub questions_asked: u64,
	pub interesting_agents: u64,
	pub level: IntelligenceLevel,
	pub submolts: u64,
}

pub fn summarize(snapshot: &MemorySnapshot) -> StatsResponse {
	let total_learnings = snapshot.total_learnings();

	StatsResponse {
		total_learnings,
		avg_depth: lore_domain::round_one_decimal(snapshot.average_depth),
		questions_asked: snapshot.questions_asked,
		interesting_agents: snapshot.interesting_agent_count(),
		level: level::classify(total_learnings),
		submolts: snapshot.submolts_engaged,
	}
}

impl LoreService {
	pub async fn stats(&self) -> StatsResponse {
		summarize(&self.snapshot().await)
	}
}
