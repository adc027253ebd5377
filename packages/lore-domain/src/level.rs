use serde::{Serialize, Serializer};

/// Maturity label derived from how many learnings an agent has accumulated.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum IntelligenceLevel {
	BrandNewIntern,
	LearningIntern,
	ExperiencedIntern,
	SeniorIntern,
	AdvancedAgent,
	EvolvedAgent,
}
impl IntelligenceLevel {
	pub fn label(self) -> &'static str {
		match self {
			Self::BrandNewIntern => "brand new intern",
			Self::LearningIntern => "learning intern",
			Self::ExperiencedIntern => "experienced intern",
			Self::SeniorIntern => "senior intern",
			Self::AdvancedAgent => "advanced agent",
			Self::EvolvedAgent => "evolved agent",
		}
	}
}
impl Serialize for IntelligenceLevel {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.label())
	}
}

// Lower bounds are inclusive.
const THRESHOLDS: [(usize, IntelligenceLevel); 5] = [
	(1_000, IntelligenceLevel::EvolvedAgent),
	(500, IntelligenceLevel::AdvancedAgent),
	(150, IntelligenceLevel::SeniorIntern),
	(50, IntelligenceLevel::ExperiencedIntern),
	(10, IntelligenceLevel::LearningIntern),
];

pub fn classify(learning_count: usize) -> IntelligenceLevel {
	THRESHOLDS
		.iter()
		.find(|(lower, _)| learning_count >= *lower)
		.map(|(_, level)| *level)
		.unwrap_or(IntelligenceLevel::BrandNewIntern)
}
