use axum::{
	Json, Router,
	extract::State,
	http::{Method, StatusCode},
	routing::get,
};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};

use crate::state::AppState;
use lore_service::{NetworkResponse, RecentLearning, StatsResponse};

pub fn router(state: AppState) -> Router {
	let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]).allow_headers(Any);

	Router::new()
		.route("/health", get(health))
		.route("/api/stats", get(stats))
		.route("/api/recent-learnings", get(recent_learnings))
		.route("/api/network-data", get(network_data))
		.layer(cors)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
	Json(state.service.stats().await)
}

async fn recent_learnings(State(state): State<AppState>) -> Json<Vec<RecentLearning>> {
	Json(state.service.recent_learnings().await)
}

async fn network_data(State(state): State<AppState>) -> Json<NetworkResponse> {
	Json(state.service.network_data().await)
}
