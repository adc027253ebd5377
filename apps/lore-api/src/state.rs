use std::sync::Arc;

use lore_service::LoreService;
use lore_storage::SnapshotChain;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LoreService>,
}
impl AppState {
	pub fn new(config: &lore_config::Config) -> color_eyre::Result<Self> {
		let store = SnapshotChain::from_config(&config.store)?;

		Ok(Self::from_store(store))
	}

	pub fn from_store(store: SnapshotChain) -> Self {
		Self { service: Arc::new(LoreService::new(store)) }
	}
}
