use serde::{Deserialize, Serialize};
use serde_json::Value;

use atelier_domain::{RecordId, compose::RankingMode, constraint, predicate, signal};

use crate::{
	AtelierService, Error, MAX_ROCCHIO_K, MAX_ROCCHIO_SCALE, MIN_PAGE, MIN_ROCCHIO_K,
	MIN_ROCCHIO_SCALE, Result, clamp_f32, clamp_u32,
	compose::{ComposeParams, QueryVectorComposer},
	rank::{HybridRanker, Page},
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryRequest {
	#[serde(default)]
	pub hard_constraints: Value,
	#[serde(default)]
	pub soft_constraints: Value,
	pub page: Option<i64>,
	pub page_size: Option<i64>,
	pub model_name: Option<String>,
	/// Ranking mode: `classic`, `power`, or `rocchio`.
	pub version: Option<String>,
	pub rocchio_k: Option<i64>,
	pub rocchio_scale: Option<f32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct QueryResponse {
	pub results: Vec<RecordId>,
	pub page: u32,
	pub page_size: u32,
	pub model_name: String,
	pub version: RankingMode,
	/// False when no soft constraint survived and results are in filter order.
	pub ranked: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimilarRequest {
	pub record_id: RecordId,
	pub page: Option<i64>,
	pub page_size: Option<i64>,
	#[serde(default)]
	pub keep_original_record: bool,
	pub model_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimilarResponse {
	pub record_id: RecordId,
	pub results: Vec<RecordId>,
	pub page: u32,
	pub page_size: u32,
}

impl AtelierService {
	pub async fn query(&self, req: QueryRequest) -> Result<QueryResponse> {
		let defaults = &self.cfg.query;
		let model = self.resolve_model(req.model_name.as_deref())?;
		let version = req.version.as_deref().unwrap_or(defaults.default_mode.as_str());
		let mode = RankingMode::parse(version).ok_or_else(|| Error::InvalidRequest {
			message: format!("Unknown version {version:?}; expected classic, power, or rocchio."),
		})?;
		let page = Page::clamped(
			req.page.unwrap_or(i64::from(MIN_PAGE)),
			req.page_size.unwrap_or(i64::from(defaults.default_page_size)),
		);
		let params = ComposeParams {
			mode,
			rocchio_k: clamp_u32(
				req.rocchio_k,
				defaults.default_rocchio_k,
				MIN_ROCCHIO_K,
				MAX_ROCCHIO_K,
			),
			rocchio_scale: clamp_f32(
				req.rocchio_scale,
				defaults.default_rocchio_scale,
				MIN_ROCCHIO_SCALE,
				MAX_ROCCHIO_SCALE,
			),
		};
		let tree = constraint::parse_constraints(&req.hard_constraints, "$.hard_constraints")?;
		let signals = signal::parse_soft_signals(&req.soft_constraints, "$.soft_constraints")?;
		let predicate = predicate::compile(&tree);
		let composer = QueryVectorComposer {
			store: self.store.as_ref(),
			embedder: self.embedder.as_ref(),
			embedding_cfg: &self.cfg.providers.embedding,
		};
		let query_vector = composer.compose(model, &signals, &params).await?;
		let ranker = HybridRanker { store: self.store.as_ref() };
		let results = ranker.rank(model, &predicate, query_vector.as_deref(), page).await?;

		tracing::info!(
			model = model.model_name.as_str(),
			mode = mode.as_str(),
			filtered = !predicate.is_always(),
			signals = signals.len(),
			page = page.page,
			returned = results.len(),
			"Query served."
		);

		Ok(QueryResponse {
			results,
			page: page.page,
			page_size: page.page_size,
			model_name: model.model_name.clone(),
			version: mode,
			ranked: query_vector.is_some(),
		})
	}

	pub async fn similar(&self, req: SimilarRequest) -> Result<SimilarResponse> {
		let model = self.resolve_model(req.model_name.as_deref())?;
		let page = Page::clamped(
			req.page.unwrap_or(i64::from(MIN_PAGE)),
			req.page_size.unwrap_or(i64::from(self.cfg.query.default_page_size)),
		);
		let ranker = HybridRanker { store: self.store.as_ref() };
		let results = ranker.similar(model, req.record_id, page, req.keep_original_record).await?;

		Ok(SimilarResponse {
			record_id: req.record_id,
			results,
			page: page.page,
			page_size: page.page_size,
		})
	}
}
