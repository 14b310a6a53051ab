pub mod augment;
pub mod collections;
pub mod compose;
pub mod memory;
pub mod order;
pub mod query;
pub mod rank;
pub mod registry;
pub mod settings;
pub mod store;

mod error;

pub use collections::{
	AugmentRequest, AugmentResponse, PathFromTermsRequest, PathFromTermsResponse, SortRequest,
	SortResponse,
};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use query::{QueryRequest, QueryResponse, SimilarRequest, SimilarResponse};
pub use registry::{ModelInfo, ModelRegistry};
pub use settings::{ConceptsRequest, ConceptsResponse, SettingsInfo};
pub use store::{PgStore, RecordStore};

use std::{future::Future, pin::Pin, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};

use atelier_config::{Config, EmbeddingProviderConfig};
use atelier_providers::embedding;
use atelier_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const MIN_PAGE: u32 = 1;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MIN_ROCCHIO_K: u32 = 1;
pub const MAX_ROCCHIO_K: u32 = 100;
pub const MIN_ROCCHIO_SCALE: f32 = 0.0;
pub const MAX_ROCCHIO_SCALE: f32 = 10.0;
pub const MIN_AUGMENT_COUNT: u32 = 1;
pub const MAX_AUGMENT_COUNT: u32 = 50;
pub const MIN_SIMILARITY_THRESHOLD: f32 = 0.0;
pub const MAX_SIMILARITY_THRESHOLD: f32 = 1.0;
pub const MIN_DECAY_RATE: f32 = 0.0;
pub const MAX_DECAY_RATE: f32 = 1.0;
pub const MIN_PATIENCE: u32 = 1;
pub const MAX_PATIENCE: u32 = 50;
/// Largest record set accepted by augmentation and ordering.
pub const MAX_COLLECTION_RECORDS: usize = 500;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		model: &'a str,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		model: &'a str,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, model, texts))
	}
}

pub struct AtelierService {
	pub cfg: Config,
	pub store: Arc<dyn RecordStore>,
	pub embedder: Arc<dyn EmbeddingProvider>,
	pub registry: ModelRegistry,
}
impl AtelierService {
	/// Postgres-backed service with the HTTP embedding provider.
	pub async fn new(cfg: Config, db: Db) -> Result<Self> {
		Self::with_parts(cfg, Arc::new(PgStore::new(db)), Arc::new(DefaultProviders)).await
	}

	pub async fn with_parts(
		cfg: Config,
		store: Arc<dyn RecordStore>,
		embedder: Arc<dyn EmbeddingProvider>,
	) -> Result<Self> {
		let registry = ModelRegistry::load(store.as_ref()).await?;

		Ok(Self { cfg, store, embedder, registry })
	}

	pub(crate) fn resolve_model(&self, model_name: Option<&str>) -> Result<&ModelInfo> {
		let name = model_name
			.map(str::trim)
			.filter(|name| !name.is_empty())
			.unwrap_or(self.cfg.query.default_model.as_str());

		self.registry.resolve(name)
	}

	pub(crate) fn rng(&self) -> StdRng {
		match self.cfg.augment.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		}
	}
}

/// Clamps a request float into `[min, max]`, falling back to `default` when absent or not finite.
pub(crate) fn clamp_f32(value: Option<f32>, default: f32, min: f32, max: f32) -> f32 {
	let value = value.filter(|value| value.is_finite()).unwrap_or(default);

	if value.is_finite() { value.clamp(min, max) } else { min }
}

pub(crate) fn clamp_u32(value: Option<i64>, default: u32, min: u32, max: u32) -> u32 {
	value.unwrap_or(i64::from(default)).clamp(i64::from(min), i64::from(max)) as u32
}
