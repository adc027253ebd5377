use std::collections::BTreeMap;

use serde_json::{Map, Value};

pub const DEFAULT_TOPIC: &str = "general";

#[derive(Clone, Debug, PartialEq)]
pub struct LearningRecord {
	pub content: String,
	pub learned_from: Option<String>,
	pub depth_score: i64,
	pub topic: String,
	/// Raw ISO-8601 text as stored; it may be malformed.
	pub timestamp: Option<String>,
}
impl LearningRecord {
	/// Decodes one stored record. Absent or mistyped fields take their defaults.
	pub fn from_value(value: &Value) -> Self {
		let field = |key: &str| value.get(key);

		Self {
			content: field("content").and_then(Value::as_str).unwrap_or_default().to_string(),
			learned_from: field("learned_from").and_then(Value::as_str).map(str::to_string),
			depth_score: field("depth_score").and_then(integer_of).unwrap_or(0),
			topic: field("topic")
				.and_then(Value::as_str)
				.unwrap_or(DEFAULT_TOPIC)
				.to_string(),
			// Table rows usually carry `created_at` rather than `timestamp`.
			timestamp: field("timestamp")
				.or_else(|| field("created_at"))
				.and_then(Value::as_str)
				.map(str::to_string),
		}
	}
}
impl Default for LearningRecord {
	fn default() -> Self {
		Self {
			content: String::new(),
			learned_from: None,
			depth_score: 0,
			topic: DEFAULT_TOPIC.to_string(),
			timestamp: None,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentInfo {
	pub interactions: u64,
}
impl AgentInfo {
	pub fn from_value(value: &Value) -> Self {
		Self { interactions: value.get("interactions").and_then(count_of_number).unwrap_or(0) }
	}
}

/// Everything fetched for one request. Records are in insertion (chronological) order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemorySnapshot {
	pub learnings: Vec<LearningRecord>,
	pub average_depth: f64,
	pub questions_asked: u64,
	pub interesting_agents: BTreeMap<String, AgentInfo>,
	/// Set when a source reports the number of interesting agents without listing them.
	pub interesting_agent_count: Option<u64>,
	pub submolts_engaged: u64,
}
impl MemorySnapshot {
	/// Decodes a snapshot document with the keys `learnings`, `average_depth`,
	/// `questions_asked`, `interesting_agents`, and `submolts_engaged`.
	pub fn from_document(doc: &Map<String, Value>) -> Self {
		let learnings = doc
			.get("learnings")
			.and_then(Value::as_array)
			.map(|rows| rows.iter().map(LearningRecord::from_value).collect())
			.unwrap_or_default();
		let (interesting_agents, interesting_agent_count) = agents_of(doc.get("interesting_agents"));

		Self {
			learnings,
			average_depth: doc.get("average_depth").and_then(Value::as_f64).unwrap_or(0.0),
			questions_asked: count_of(doc.get("questions_asked")),
			interesting_agents,
			interesting_agent_count,
			submolts_engaged: count_of(doc.get("submolts_engaged")),
		}
	}

	pub fn total_learnings(&self) -> usize {
		self.learnings.len()
	}

	pub fn interesting_agent_count(&self) -> u64 {
		self.interesting_agent_count.unwrap_or(self.interesting_agents.len() as u64)
	}
}

/// Collections count by size; plain numbers count as themselves.
fn count_of(value: Option<&Value>) -> u64 {
	match value {
		Some(Value::Array(items)) => items.len() as u64,
		Some(Value::Object(entries)) => entries.len() as u64,
		Some(number @ Value::Number(_)) => count_of_number(number).unwrap_or(0),
		_ => 0,
	}
}

fn agents_of(value: Option<&Value>) -> (BTreeMap<String, AgentInfo>, Option<u64>) {
	match value {
		Some(Value::Object(entries)) => (
			entries.iter().map(|(name, info)| (name.clone(), AgentInfo::from_value(info))).collect(),
			None,
		),
		Some(Value::Array(names)) => (
			names
				.iter()
				.filter_map(Value::as_str)
				.map(|name| (name.to_string(), AgentInfo::default()))
				.collect(),
			None,
		),
		Some(number @ Value::Number(_)) => (BTreeMap::new(), count_of_number(number)),
		_ => (BTreeMap::new(), None),
	}
}

fn count_of_number(value: &Value) -> Option<u64> {
	integer_of(value).and_then(|number| u64::try_from(number).ok())
}

/// Accepts integers, integral floats, and numeric strings.
fn integer_of(value: &Value) -> Option<i64> {
	match value {
		Value::Number(number) => number.as_i64().or_else(|| {
			number.as_f64().filter(|float| float.fract() == 0.0 && float.is_finite()).map(|f| f as i64)
		}),
		Value::String(raw) => raw.trim().parse().ok(),
		_ => None,
	}
}
