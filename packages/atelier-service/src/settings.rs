use serde::{Deserialize, Serialize};

use atelier_domain::{
	columns::{self, ColumnDescriptor},
	compose::RankingMode,
	signal::ConceptKind,
};

use crate::{
	AtelierService, Error, MAX_AUGMENT_COUNT, MAX_COLLECTION_RECORDS, MAX_DECAY_RATE, MAX_PAGE_SIZE, MAX_PATIENCE, MAX_ROCCHIO_K,
	MAX_ROCCHIO_SCALE, MAX_SIMILARITY_THRESHOLD, MIN_AUGMENT_COUNT, MIN_DECAY_RATE,
	MIN_PAGE_SIZE, MIN_PATIENCE, MIN_ROCCHIO_K, MIN_ROCCHIO_SCALE, MIN_SIMILARITY_THRESHOLD,
	Result, collections::AUGMENT_METHODS, registry::ModelInfo,
};

/// Everything a client needs to build valid requests.
#[derive(Clone, Debug, Serialize)]
pub struct SettingsInfo {
	pub models: Vec<ModelInfo>,
	pub default_model: String,
	pub methods: Vec<RankingMode>,
	pub default_method: RankingMode,
	pub min_page_size: u32,
	pub max_page_size: u32,
	pub min_rocchio_k: u32,
	pub max_rocchio_k: u32,
	pub min_rocchio_scale: f32,
	pub max_rocchio_scale: f32,
	pub augment_methods: Vec<&'static str>,
	pub min_convex_fill_number_of_images: u32,
	pub max_convex_fill_number_of_images: u32,
	pub min_convex_fill_similarity_threshold: f32,
	pub max_convex_fill_similarity_threshold: f32,
	pub min_convex_fill_decay_rate: f32,
	pub max_convex_fill_decay_rate: f32,
	pub min_convex_fill_patience: u32,
	pub max_convex_fill_patience: u32,
	pub max_collection_records: usize,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConceptsRequest {
	#[serde(default)]
	pub kind: String,
	pub model_name: Option<String>,
}

/// Concept names usable in KEYWORD, COLOR and LUMINOSITY signals.
#[derive(Clone, Debug, Serialize)]
pub struct ConceptsResponse {
	pub kind: ConceptKind,
	pub model_name: String,
	pub names: Vec<String>,
}

impl AtelierService {
	pub fn settings_info(&self) -> SettingsInfo {
		SettingsInfo {
			models: self.registry.models().cloned().collect(),
			default_model: self.cfg.query.default_model.clone(),
			methods: RankingMode::ALL.to_vec(),
			default_method: RankingMode::parse(&self.cfg.query.default_mode)
				.unwrap_or(RankingMode::Power),
			min_page_size: MIN_PAGE_SIZE,
			max_page_size: MAX_PAGE_SIZE,
			min_rocchio_k: MIN_ROCCHIO_K,
			max_rocchio_k: MAX_ROCCHIO_K,
			min_rocchio_scale: MIN_ROCCHIO_SCALE,
			max_rocchio_scale: MAX_ROCCHIO_SCALE,
			augment_methods: AUGMENT_METHODS.to_vec(),
			min_convex_fill_number_of_images: MIN_AUGMENT_COUNT,
			max_convex_fill_number_of_images: MAX_AUGMENT_COUNT,
			min_convex_fill_similarity_threshold: MIN_SIMILARITY_THRESHOLD,
			max_convex_fill_similarity_threshold: MAX_SIMILARITY_THRESHOLD,
			min_convex_fill_decay_rate: MIN_DECAY_RATE,
			max_convex_fill_decay_rate: MAX_DECAY_RATE,
			min_convex_fill_patience: MIN_PATIENCE,
			max_convex_fill_patience: MAX_PATIENCE,
			max_collection_records: MAX_COLLECTION_RECORDS,
		}
	}

	/// The filterable column catalog, in display order.
	pub fn columns(&self) -> &'static [ColumnDescriptor] {
		columns::COLUMNS
	}

	pub async fn concepts(&self, req: ConceptsRequest) -> Result<ConceptsResponse> {
		let Some(kind) = ConceptKind::parse(&req.kind) else {
			return Err(Error::InvalidRequest {
				message: format!(
					"Unknown concept kind {:?}; expected keyword, color or luminosity.",
					req.kind
				),
			});
		};
		let model = self.resolve_model(req.model_name.as_deref())?;
		let names = self.store.concept_names(kind, model.model_id).await?;

		Ok(ConceptsResponse { kind, model_name: model.model_name.clone(), names })
	}
}
