use std::{
	collections::HashMap,
	future::IntoFuture,
	path::PathBuf,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode, header},
	response::{IntoResponse, Response},
	routing,
};
use serde_json::{Value, json};
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use lore_config::RemoteStore;
use lore_storage::{
	BoxFuture, Error, FetchOutcome, MemorySnapshot, RemoteTables, Result, SnapshotChain,
	SnapshotFile, SnapshotSource,
};
use lore_testkit::{SnapshotDocument, TempSnapshotFile, learning, learning_at};

#[derive(Clone, Default)]
struct TableServer {
	learnings: Value,
	stats: Value,
	status: Option<StatusCode>,
	delay: Option<Duration>,
	/// Rows per response, like PostgREST's `max-rows`.
	max_rows: Option<usize>,
	/// Overrides the table size reported in `Content-Range`.
	reported_total: Option<usize>,
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Clone, Debug)]
struct RecordedRequest {
	table: String,
	params: HashMap<String, String>,
	api_key: Option<String>,
	authorization: Option<String>,
	prefer: Option<String>,
}

async fn start_table_server(server: TableServer) -> (String, Sender<()>) {
	let app = Router::new().route("/rest/v1/{table}", routing::get(table_handler)).with_state(server);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind table server.");
	let addr = listener.local_addr().expect("Failed to read table server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

async fn table_handler(
	State(server): State<TableServer>,
	Path(table): Path<String>,
	Query(params): Query<HashMap<String, String>>,
	headers: HeaderMap,
) -> Response {
	let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);

	let prefer = header("prefer");

	server.requests.lock().unwrap_or_else(|err| err.into_inner()).push(RecordedRequest {
		table: table.clone(),
		params: params.clone(),
		api_key: header("apikey"),
		authorization: header("authorization"),
		prefer: prefer.clone(),
	});

	if let Some(delay) = server.delay {
		tokio::time::sleep(delay).await;
	}
	if let Some(status) = server.status {
		return status.into_response();
	}

	match table.as_str() {
		"learnings" => learnings_page(&server, &params, prefer.as_deref()),
		"agent_stats" => (StatusCode::OK, Json(server.stats.clone())).into_response(),
		_ => StatusCode::NOT_FOUND.into_response(),
	}
}

fn learnings_page(
	server: &TableServer,
	params: &HashMap<String, String>,
	prefer: Option<&str>,
) -> Response {
	let Value::Array(rows) = &server.learnings else {
		return (StatusCode::OK, Json(server.learnings.clone())).into_response();
	};
	let param = |name: &str| params.get(name).and_then(|value| value.parse::<usize>().ok());
	let offset = param("offset").unwrap_or(0).min(rows.len());
	let mut limit = param("limit").unwrap_or(usize::MAX);

	if let Some(max_rows) = server.max_rows {
		limit = limit.min(max_rows);
	}

	let page: Vec<Value> = rows.iter().skip(offset).take(limit).cloned().collect();
	let mut response = (StatusCode::OK, Json(Value::Array(page.clone()))).into_response();

	if prefer.is_some_and(|prefer| prefer.contains("count=exact")) {
		let total = server.reported_total.unwrap_or(rows.len());
		let range = if page.is_empty() {
			format!("*/{total}")
		} else {
			format!("{}-{}/{total}", offset, offset + page.len() - 1)
		};

		response.headers_mut().insert(
			header::CONTENT_RANGE,
			range.parse().expect("Content-Range must be a valid header value."),
		);
	}

	response
}

fn numbered_rows(count: usize) -> Value {
	Value::Array((0..count).map(|index| learning(&format!("row {index}"), "Nova", 5)).collect())
}

fn remote_config(url: String, timeout_ms: u64) -> RemoteStore {
	RemoteStore {
		url,
		api_key: Some("test-key".to_string()),
		api_key_env: "LORE_REMOTE_API_KEY".to_string(),
		learnings_table: "learnings".to_string(),
		stats_table: "agent_stats".to_string(),
		order_column: "id".to_string(),
		timeout_ms,
		page_size: 1_000,
	}
}

fn remote_source(url: String, timeout_ms: u64) -> Arc<dyn SnapshotSource> {
	Arc::new(RemoteTables::new(&remote_config(url, timeout_ms)).expect("Failed to build remote."))
}

fn file_source(path: impl Into<PathBuf>) -> Arc<dyn SnapshotSource> {
	Arc::new(SnapshotFile::at(path))
}

fn file_document() -> SnapshotDocument {
	SnapshotDocument::new()
		.learning(learning("Files are the fallback", "Archivist", 5))
		.average_depth(5.0)
		.agent("Archivist", 2)
}

struct CountingSource {
	calls: Arc<AtomicUsize>,
}
impl SnapshotSource for CountingSource {
	fn name(&self) -> &str {
		"counting"
	}

	fn fetch(&self) -> BoxFuture<'_, Result<MemorySnapshot>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(MemorySnapshot::default()) })
	}
}

#[tokio::test]
async fn remote_reads_learnings_and_stats() {
	let server = TableServer {
		learnings: json!([
			learning_at("Borrowing beats cloning", "Nova", 5, "2025-03-01T10:00:00Z"),
			{ "content": "Row with created_at", "learned_from": "Orbit", "depth_score": 6, "created_at": "2025-03-02T10:00:00Z" }
		]),
		stats: json!([{ "average_depth": 5.46, "questions_asked": 9, "interesting_agents": 4 }]),
		..Default::default()
	};
	let requests = server.requests.clone();
	let (url, shutdown) = start_table_server(server).await;
	let snapshot = RemoteTables::new(&remote_config(url, 1_000))
		.expect("Failed to build remote.")
		.read()
		.await
		.expect("Remote read must succeed.");

	assert_eq!(snapshot.total_learnings(), 2);
	assert_eq!(snapshot.learnings[0].content, "Borrowing beats cloning");
	assert_eq!(snapshot.learnings[1].timestamp.as_deref(), Some("2025-03-02T10:00:00Z"));
	assert_eq!(snapshot.average_depth, 5.46);
	assert_eq!(snapshot.questions_asked, 9);
	assert_eq!(snapshot.interesting_agent_count(), 4);

	let requests = requests.lock().expect("Request log lock poisoned.").clone();

	assert_eq!(requests.len(), 2);
	assert_eq!(requests[0].table, "learnings");
	assert_eq!(requests[0].params.get("order").map(String::as_str), Some("id.asc"));
	assert_eq!(requests[0].params.get("offset").map(String::as_str), Some("0"));
	assert_eq!(requests[0].prefer.as_deref(), Some("count=exact"));
	assert_eq!(requests[1].table, "agent_stats");
	assert_eq!(requests[1].params.get("limit").map(String::as_str), Some("1"));

	for request in &requests {
		assert_eq!(request.api_key.as_deref(), Some("test-key"));
		assert_eq!(request.authorization.as_deref(), Some("Bearer test-key"));
	}

	let _ = shutdown.send(());
}

#[tokio::test]
async fn capped_table_is_read_page_by_page() {
	let server = TableServer {
		learnings: numbered_rows(1_000),
		stats: json!([]),
		max_rows: Some(300),
		..Default::default()
	};
	let requests = server.requests.clone();
	let (url, shutdown) = start_table_server(server).await;
	let mut config = remote_config(url, 1_000);

	config.page_size = 500;

	let snapshot = RemoteTables::new(&config)
		.expect("Failed to build remote.")
		.read()
		.await
		.expect("Remote read must succeed.");

	assert_eq!(snapshot.total_learnings(), 1_000);
	assert_eq!(snapshot.learnings[0].content, "row 0");
	assert_eq!(snapshot.learnings[999].content, "row 999");

	let requests = requests.lock().expect("Request log lock poisoned.").clone();
	let offsets: Vec<&str> = requests
		.iter()
		.filter(|request| request.table == "learnings")
		.filter_map(|request| request.params.get("offset").map(String::as_str))
		.collect();

	assert_eq!(offsets, ["0", "300", "600", "900"]);
	assert!(
		requests
			.iter()
			.filter(|request| request.table == "learnings")
			.all(|request| request.params.get("limit").map(String::as_str) == Some("500"))
	);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn table_ending_short_of_reported_count_falls_back() {
	let server = TableServer {
		learnings: numbered_rows(3),
		stats: json!([]),
		reported_total: Some(5),
		..Default::default()
	};
	let (url, shutdown) = start_table_server(server).await;
	let file = TempSnapshotFile::new(&file_document().into_value()).expect("Failed to write file.");
	let chain = SnapshotChain::new(Some(remote_source(url, 1_000)), Some(file_source(file.path())));

	match chain.fetch().await {
		FetchOutcome::Fallback { snapshot, primary_error } => {
			assert_eq!(snapshot.learnings[0].content, "Files are the fallback");
			let Some(Error::InvalidResponse { message }) = &primary_error else {
				panic!("Unexpected error: {primary_error:?}");
			};

			assert!(message.contains("reported 5 rows"), "Unexpected message: {message}");
		},
		other => panic!("Unexpected outcome: {other:?}"),
	}

	let _ = shutdown.send(());
}

#[tokio::test]
async fn healthy_primary_skips_fallback() {
	let server = TableServer {
		learnings: json!([learning("Remote wins", "Nova", 5)]),
		stats: json!([]),
		..Default::default()
	};
	let (url, shutdown) = start_table_server(server).await;
	let calls = Arc::new(AtomicUsize::new(0));
	let chain = SnapshotChain::new(
		Some(remote_source(url, 1_000)),
		Some(Arc::new(CountingSource { calls: calls.clone() })),
	);
	let outcome = chain.fetch().await;

	assert!(matches!(outcome, FetchOutcome::Primary(_)), "Unexpected outcome: {outcome:?}");
	assert_eq!(outcome.into_snapshot().learnings[0].content, "Remote wins");
	assert_eq!(calls.load(Ordering::SeqCst), 0);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn server_error_falls_back_to_file() {
	let server = TableServer { status: Some(StatusCode::INTERNAL_SERVER_ERROR), ..Default::default() };
	let (url, shutdown) = start_table_server(server).await;
	let file = TempSnapshotFile::new(&file_document().into_value()).expect("Failed to write file.");
	let chain = SnapshotChain::new(Some(remote_source(url, 1_000)), Some(file_source(file.path())));

	match chain.fetch().await {
		FetchOutcome::Fallback { snapshot, primary_error } => {
			assert_eq!(snapshot.learnings[0].content, "Files are the fallback");
			assert!(matches!(primary_error, Some(Error::Reqwest(_))));
		},
		other => panic!("Unexpected outcome: {other:?}"),
	}

	let _ = shutdown.send(());
}

#[tokio::test]
async fn shape_mismatch_falls_back_to_file() {
	let server = TableServer {
		learnings: json!({ "message": "permission denied" }),
		stats: json!([]),
		..Default::default()
	};
	let (url, shutdown) = start_table_server(server).await;
	let file = TempSnapshotFile::new(&file_document().into_value()).expect("Failed to write file.");
	let chain = SnapshotChain::new(Some(remote_source(url, 1_000)), Some(file_source(file.path())));

	match chain.fetch().await {
		FetchOutcome::Fallback { primary_error, .. } => {
			assert!(matches!(primary_error, Some(Error::InvalidResponse { .. })));
		},
		other => panic!("Unexpected outcome: {other:?}"),
	}

	let _ = shutdown.send(());
}

#[tokio::test]
async fn slow_primary_times_out_and_falls_back() {
	let server = TableServer {
		learnings: json!([]),
		stats: json!([]),
		delay: Some(Duration::from_millis(500)),
		..Default::default()
	};
	let (url, shutdown) = start_table_server(server).await;
	let file = TempSnapshotFile::new(&file_document().into_value()).expect("Failed to write file.");
	let chain = SnapshotChain::new(Some(remote_source(url, 50)), Some(file_source(file.path())));

	match chain.fetch().await {
		FetchOutcome::Fallback { primary_error: Some(Error::Reqwest(err)), .. } => {
			assert!(err.is_timeout(), "Expected a timeout, got {err}");
		},
		other => panic!("Unexpected outcome: {other:?}"),
	}

	let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_primary_and_missing_file_is_empty() {
	let chain = SnapshotChain::new(
		Some(remote_source("http://127.0.0.1:1".to_string(), 200)),
		Some(file_source("/nonexistent/lore/memory.json")),
	);
	let outcome = chain.fetch().await;

	match &outcome {
		FetchOutcome::Empty { errors } => {
			assert_eq!(errors.len(), 2);
			assert!(matches!(errors[1], Error::ReadSnapshot { .. }));
		},
		other => panic!("Unexpected outcome: {other:?}"),
	}

	assert!(outcome.snapshot().is_none());
	assert_eq!(outcome.into_snapshot(), MemorySnapshot::default());
}

#[tokio::test]
async fn file_only_chain_reports_fallback_without_primary_error() {
	let file = TempSnapshotFile::new(&file_document().into_value()).expect("Failed to write file.");
	let chain = SnapshotChain::new(None, Some(file_source(file.path())));

	match chain.fetch().await {
		FetchOutcome::Fallback { snapshot, primary_error: None } => {
			assert_eq!(snapshot.interesting_agents["Archivist"].interactions, 2);
		},
		other => panic!("Unexpected outcome: {other:?}"),
	}
}

#[tokio::test]
async fn chain_without_sources_is_empty() {
	let outcome = SnapshotChain::default().fetch().await;

	assert!(matches!(&outcome, FetchOutcome::Empty { errors } if errors.is_empty()));
}

#[tokio::test]
async fn malformed_file_is_a_parse_error() {
	let file = TempSnapshotFile::raw("{ \"learnings\": [").expect("Failed to write file.");
	let err = SnapshotFile::at(file.path()).read().await.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseSnapshot { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn non_object_file_is_rejected() {
	let file = TempSnapshotFile::raw("[1, 2, 3]").expect("Failed to write file.");
	let err = SnapshotFile::at(file.path()).read().await.expect_err("Expected shape error.");

	assert!(matches!(err, Error::InvalidResponse { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn partially_malformed_file_is_best_effort() {
	let file = TempSnapshotFile::new(&json!({
		"learnings": [learning("Kept", "Nova", 5), "not a record"],
		"average_depth": "unknown",
		"interesting_agents": { "Nova": { "interactions": 3 } }
	}))
	.expect("Failed to write file.");
	let snapshot = SnapshotFile::at(file.path()).read().await.expect("File read must succeed.");

	assert_eq!(snapshot.total_learnings(), 2);
	assert_eq!(snapshot.learnings[0].content, "Kept");
	assert_eq!(snapshot.learnings[1].content, "");
	assert_eq!(snapshot.average_depth, 0.0);
	assert_eq!(snapshot.interesting_agent_count(), 1);
}
