use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub query: Query,
	#[serde(default)]
	pub augment: Augment,
	#[serde(default)]
	pub ordering: PathOrdering,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

/// HTTP text embedder. The model name is chosen per request, so it is not configured here.
#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Defaults applied to query requests that omit a field.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Query {
	pub default_model: String,
	/// One of `classic`, `power`, or `rocchio`.
	pub default_mode: String,
	pub default_page_size: u32,
	pub default_rocchio_k: u32,
	pub default_rocchio_scale: f32,
}
impl Default for Query {
	fn default() -> Self {
		Self {
			default_model: "march_finetuned".to_string(),
			default_mode: "power".to_string(),
			default_page_size: 10,
			default_rocchio_k: 5,
			default_rocchio_scale: 1.0,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Augment {
	/// One of `convex_fill` or `shortest_path`.
	pub default_method: String,
	pub default_count: u32,
	pub default_similarity_threshold: f32,
	pub default_decay_rate: f32,
	pub default_patience: u32,
	/// Fixed seed for convex-fill draws. Entropy is used when unset.
	pub seed: Option<u64>,
}
impl Default for Augment {
	fn default() -> Self {
		Self {
			default_method: "convex_fill".to_string(),
			default_count: 10,
			default_similarity_threshold: 0.5,
			default_decay_rate: 0.5,
			default_patience: 10,
			seed: None,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathOrdering {
	/// Upper bound on 2-opt improvement sweeps per ordering.
	pub two_opt_max_passes: u32,
}
impl Default for PathOrdering {
	fn default() -> Self {
		Self { two_opt_max_passes: 64 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}
