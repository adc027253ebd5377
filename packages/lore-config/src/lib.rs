mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, RemoteStore, Service, SnapshotStore, Store};

use std::{env, fs, net::SocketAddr, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	load_with_env(path, |name| env::var(name).ok())
}

/// Same as [`load`], with the environment lookup supplied by the caller.
pub fn load_with_env<F>(path: &Path, lookup: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;
	let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

	normalize(&mut cfg, base_dir, lookup);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.http_bind.parse::<SocketAddr>().is_err() {
		return Err(Error::Validation {
			message: "service.http_bind must be a valid socket address.".to_string(),
		});
	}
	if cfg.store.remote.is_none() && cfg.store.snapshot.is_none() {
		return Err(Error::Validation {
			message: "store must configure at least one of store.remote or store.snapshot."
				.to_string(),
		});
	}

	if let Some(remote) = cfg.store.remote.as_ref() {
		validate_remote(remote)?;
	}
	if let Some(snapshot) = cfg.store.snapshot.as_ref()
		&& snapshot.path.as_os_str().is_empty()
	{
		return Err(Error::Validation {
			message: "store.snapshot.path must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn validate_remote(remote: &RemoteStore) -> Result<()> {
	let url = remote.url.trim();

	if !(url.starts_with("http://") || url.starts_with("https://")) {
		return Err(Error::Validation {
			message: "store.remote.url must start with http:// or https://.".to_string(),
		});
	}

	for (label, value) in [
		("store.remote.learnings_table", &remote.learnings_table),
		("store.remote.stats_table", &remote.stats_table),
		("store.remote.order_column", &remote.order_column),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if remote.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "store.remote.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if remote.page_size == 0 {
		return Err(Error::Validation {
			message: "store.remote.page_size must be greater than zero.".to_string(),
		});
	}
	if remote.api_key.is_none() {
		return Err(Error::Validation {
			message: format!(
				"store.remote.api_key must be set in the config file or through {}.",
				remote.api_key_env
			),
		});
	}

	Ok(())
}

fn normalize<F>(cfg: &mut Config, base_dir: &Path, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(remote) = cfg.store.remote.as_mut() {
		remote.url = remote.url.trim().trim_end_matches('/').to_string();

		if remote.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(true) {
			remote.api_key =
				lookup(remote.api_key_env.as_str()).filter(|key| !key.trim().is_empty());
		}
	}
	if let Some(snapshot) = cfg.store.snapshot.as_mut()
		&& !snapshot.path.as_os_str().is_empty()
		&& snapshot.path.is_relative()
	{
		snapshot.path = base_dir.join(&snapshot.path);
	}
}
