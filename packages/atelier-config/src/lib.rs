mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Augment, Config, EmbeddingProviderConfig, PathOrdering, Postgres, Providers, Query, Security,
	Service, Storage,
};

use std::{fs, path::Path};

const QUERY_MODES: [&str; 3] = ["classic", "power", "rocchio"];
const AUGMENT_METHODS: [&str; 2] = ["convex_fill", "shortest_path"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &cfg.providers.embedding.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("providers.embedding.default_headers.{key} must be a string."),
			});
		}
	}

	validate_query(&cfg.query)?;
	validate_augment(&cfg.augment)?;

	if cfg.ordering.two_opt_max_passes == 0 {
		return Err(Error::Validation {
			message: "ordering.two_opt_max_passes must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_query(query: &Query) -> Result<()> {
	if query.default_model.is_empty() {
		return Err(Error::Validation {
			message: "query.default_model must be non-empty.".to_string(),
		});
	}
	if !QUERY_MODES.contains(&query.default_mode.as_str()) {
		return Err(Error::Validation {
			message: "query.default_mode must be one of classic, power, or rocchio.".to_string(),
		});
	}
	if !(1..=100).contains(&query.default_page_size) {
		return Err(Error::Validation {
			message: "query.default_page_size must be in the range 1-100.".to_string(),
		});
	}
	if !(1..=100).contains(&query.default_rocchio_k) {
		return Err(Error::Validation {
			message: "query.default_rocchio_k must be in the range 1-100.".to_string(),
		});
	}
	if !query.default_rocchio_scale.is_finite() {
		return Err(Error::Validation {
			message: "query.default_rocchio_scale must be a finite number.".to_string(),
		});
	}
	if !(0.0..=10.0).contains(&query.default_rocchio_scale) {
		return Err(Error::Validation {
			message: "query.default_rocchio_scale must be in the range 0.0-10.0.".to_string(),
		});
	}

	Ok(())
}

fn validate_augment(augment: &Augment) -> Result<()> {
	if !AUGMENT_METHODS.contains(&augment.default_method.as_str()) {
		return Err(Error::Validation {
			message: "augment.default_method must be one of convex_fill or shortest_path."
				.to_string(),
		});
	}
	if !(1..=50).contains(&augment.default_count) {
		return Err(Error::Validation {
			message: "augment.default_count must be in the range 1-50.".to_string(),
		});
	}

	for (key, value) in [
		("augment.default_similarity_threshold", augment.default_similarity_threshold),
		("augment.default_decay_rate", augment.default_decay_rate),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{key} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{key} must be in the range 0.0-1.0."),
			});
		}
	}

	if !(1..=50).contains(&augment.default_patience) {
		return Err(Error::Validation {
			message: "augment.default_patience must be in the range 1-50.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.query.default_model = cfg.query.default_model.trim().to_string();
	cfg.query.default_mode = cfg.query.default_mode.trim().to_ascii_lowercase();
	cfg.augment.default_method = cfg.augment.default_method.trim().to_ascii_lowercase();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
