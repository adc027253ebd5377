use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, CONTENT_RANGE, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

use crate::{BoxFuture, Error, MemorySnapshot, Result, SnapshotSource};

/// Upper bound on learnings pages per read, for servers that ignore `offset`.
const MAX_PAGES: usize = 10_000;

struct Page {
	rows: Vec<Value>,
	/// Table size from `Content-Range`, when the server reports one.
	total: Option<usize>,
}

/// PostgREST-style table service: one table of learning rows and a single-row stats table.
#[derive(Clone, Debug)]
pub struct RemoteTables {
	client: Client,
	base_url: String,
	learnings_table: String,
	stats_table: String,
	order_column: String,
	page_size: usize,
}
impl RemoteTables {
	pub fn new(cfg: &lore_config::RemoteStore) -> Result<Self> {
		let api_key = cfg.api_key.as_deref().ok_or_else(|| Error::InvalidConfig {
			message: format!("Remote store has no api_key; set {}.", cfg.api_key_env),
		})?;
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(auth_headers(api_key)?)
			.build()?;

		Ok(Self {
			client,
			base_url: cfg.url.trim_end_matches('/').to_string(),
			learnings_table: cfg.learnings_table.clone(),
			stats_table: cfg.stats_table.clone(),
			order_column: cfg.order_column.clone(),
			page_size: cfg.page_size.max(1),
		})
	}

	pub async fn read(&self) -> Result<MemorySnapshot> {
		let rows = self.learning_rows().await?;
		let stats = self.query(&self.stats_table, &[("select", "*"), ("limit", "1")]).await?;
		let mut doc = stats_row(stats, &self.stats_table)?;

		doc.insert("learnings".to_string(), Value::Array(rows));

		Ok(MemorySnapshot::from_document(&doc))
	}

	/// Pages through the learnings table. Servers cap rows per response, so a short page
	/// only ends the read when the reported table size has been reached.
	async fn learning_rows(&self) -> Result<Vec<Value>> {
		let mut rows = Vec::new();

		for _ in 0..MAX_PAGES {
			let page = self.learnings_page(rows.len()).await?;
			let received = page.rows.len();

			rows.extend(page.rows);

			match page.total {
				Some(total) if rows.len() >= total => return Ok(rows),
				Some(total) if received == 0 =>
					return Err(Error::InvalidResponse {
						message: format!(
							"Table {} reported {total} rows but stopped after {}.",
							self.learnings_table,
							rows.len()
						),
					}),
				None if received < self.page_size => return Ok(rows),
				_ => {},
			}
		}

		Err(Error::InvalidResponse {
			message: format!(
				"Table {} did not finish within {MAX_PAGES} pages.",
				self.learnings_table
			),
		})
	}

	async fn learnings_page(&self, offset: usize) -> Result<Page> {
		let url = format!("{}/rest/v1/{}", self.base_url, self.learnings_table);
		let order = format!("{}.asc", self.order_column);
		let limit = self.page_size.to_string();
		let offset = offset.to_string();
		let res = self
			.client
			.get(url)
			.header("prefer", "count=exact")
			.query(&[
				("select", "*"),
				("order", order.as_str()),
				("limit", limit.as_str()),
				("offset", offset.as_str()),
			])
			.send()
			.await?
			.error_for_status()?;
		let total = res
			.headers()
			.get(CONTENT_RANGE)
			.and_then(|value| value.to_str().ok())
			.and_then(range_total);
		let json: Value = res.json().await?;
		let rows = match json {
			Value::Array(rows) => rows,
			_ =>
				return Err(Error::InvalidResponse {
					message: format!("Table {} must return a JSON array.", self.learnings_table),
				}),
		};

		Ok(Page { rows, total })
	}

	async fn query(&self, table: &str, params: &[(&str, &str)]) -> Result<Value> {
		let url = format!("{}/rest/v1/{table}", self.base_url);
		let res = self.client.get(url).query(params).send().await?;
		let json = res.error_for_status()?.json().await?;

		Ok(json)
	}
}
impl SnapshotSource for RemoteTables {
	fn name(&self) -> &str {
		"remote_tables"
	}

	fn fetch(&self) -> BoxFuture<'_, Result<MemorySnapshot>> {
		Box::pin(self.read())
	}
}

fn auth_headers(api_key: &str) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	let mut key = HeaderValue::from_str(api_key)?;
	let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))?;

	key.set_sensitive(true);
	bearer.set_sensitive(true);
	headers.insert(HeaderName::from_static("apikey"), key);
	headers.insert(AUTHORIZATION, bearer);

	Ok(headers)
}

/// `0-999/2500` and `*/0` carry a total; `0-999/*` does not.
fn range_total(range: &str) -> Option<usize> {
	range.rsplit_once('/')?.1.trim().parse().ok()
}

/// An empty stats table means zero counters.
fn stats_row(json: Value, table: &str) -> Result<Map<String, Value>> {
	let Value::Array(rows) = json else {
		return Err(Error::InvalidResponse {
			message: format!("Table {table} must return a JSON array."),
		});
	};

	match rows.into_iter().next() {
		Some(Value::Object(row)) => Ok(row),
		None => Ok(Map::new()),
		Some(_) => Err(Error::InvalidResponse {
			message: format!("Table {table} rows must be JSON objects."),
		}),
	}
}
