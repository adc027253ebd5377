use std::collections::HashMap;

use lore_storage::MemorySnapshot;

use crate::LoreService;

pub const NETWORK_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AgentSummary {
	pub name: String,
	pub learnings: usize,
	#[serde(rename = "avgDepth")]
	pub avg_depth: f64,
	pub interactions: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NetworkResponse {
	pub total_learnings: usize,
	pub agents: Vec<AgentSummary>,
}

#[derive(Default)]
struct Tally {
	count: usize,
	depth_sum: i128,
}

/// Interesting agents ranked by attributable learnings. Agents with none are left out.
pub fn rank_agents(snapshot: &MemorySnapshot) -> NetworkResponse {
	let mut tallies: HashMap<&str, Tally> = HashMap::new();

	for record in &snapshot.learnings {
		if let Some(source) = record.learned_from.as_deref() {
			let tally = tallies.entry(source).or_default();

			tally.count += 1;
			tally.depth_sum += i128::from(record.depth_score);
		}
	}

	let mut agents: Vec<AgentSummary> = snapshot
		.interesting_agents
		.iter()
		.filter_map(|(name, info)| {
			let tally = tallies.get(name.as_str())?;

			Some(AgentSummary {
				name: name.clone(),
				learnings: tally.count,
				avg_depth: lore_domain::round_one_decimal(
					tally.depth_sum as f64 / tally.count as f64,
				),
				interactions: info.interactions,
			})
		})
		.collect();

	// Stable, so ties keep agent-name order.
	agents.sort_by(|a, b| b.learnings.cmp(&a.learnings));
	agents.truncate(NETWORK_LIMIT);

	NetworkResponse { total_learnings: snapshot.total_learnings(), agents }
}

impl LoreService {
	pub async fn network_data(&self) -> NetworkResponse {
		rank_agents(&self.snapshot().await)
	}
}
