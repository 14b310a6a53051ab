use serde::{Deserialize, Serialize};

use atelier_domain::RecordId;

use crate::{
	AtelierService, Error, MAX_AUGMENT_COUNT, MAX_DECAY_RATE, MAX_PATIENCE,
	MAX_SIMILARITY_THRESHOLD, MIN_AUGMENT_COUNT, MIN_DECAY_RATE, MIN_PATIENCE,
	MIN_SIMILARITY_THRESHOLD, Result,
	augment::{CollectionAugmenter, ConvexFillParams},
	clamp_f32, clamp_u32,
	order::{ProjectedRecord, SimilarityOrderer},
};

pub const AUGMENT_METHODS: [&str; 2] = ["convex_fill", "shortest_path"];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentRequest {
	pub method: Option<String>,
	#[serde(rename = "recordIDs", default)]
	pub record_ids: Vec<RecordId>,
	#[serde(rename = "model_name")]
	pub model_name: Option<String>,
	pub number_of_images: Option<i64>,
	pub similarity_threshold: Option<f32>,
	pub decay_rate: Option<f32>,
	pub patience: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AugmentResponse {
	pub method: String,
	/// Added records only, in the order they were found.
	pub record_ids: Vec<RecordId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SortRequest {
	#[serde(rename = "recordIDs", default)]
	pub record_ids: Vec<RecordId>,
	pub model_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SortResponse {
	pub record_ids: Vec<RecordId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PathFromTermsRequest {
	#[serde(rename = "recordIDs", default)]
	pub record_ids: Vec<RecordId>,
	pub model_name: Option<String>,
	#[serde(default)]
	pub term1: String,
	#[serde(default)]
	pub term2: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PathFromTermsResponse {
	pub items: Vec<ProjectedRecord>,
}

impl AtelierService {
	pub async fn augment(&self, req: AugmentRequest) -> Result<AugmentResponse> {
		let defaults = &self.cfg.augment;
		let method = req
			.method
			.as_deref()
			.map(|method| method.trim().to_ascii_lowercase())
			.unwrap_or_else(|| defaults.default_method.clone());

		if !AUGMENT_METHODS.contains(&method.as_str()) {
			return Err(Error::InvalidRequest {
				message: format!("Unknown augmentation method {method:?}."),
			});
		}

		let model = self.resolve_model(req.model_name.as_deref())?;
		let augmenter = CollectionAugmenter {
			store: self.store.as_ref(),
			two_opt_max_passes: self.cfg.ordering.two_opt_max_passes,
		};
		let record_ids = if method == "convex_fill" {
			let params = ConvexFillParams {
				count: clamp_u32(
					req.number_of_images,
					defaults.default_count,
					MIN_AUGMENT_COUNT,
					MAX_AUGMENT_COUNT,
				),
				similarity_threshold: clamp_f32(
					req.similarity_threshold,
					defaults.default_similarity_threshold,
					MIN_SIMILARITY_THRESHOLD,
					MAX_SIMILARITY_THRESHOLD,
				),
				decay_rate: clamp_f32(
					req.decay_rate,
					defaults.default_decay_rate,
					MIN_DECAY_RATE,
					MAX_DECAY_RATE,
				),
				patience: clamp_u32(
					req.patience,
					defaults.default_patience,
					MIN_PATIENCE,
					MAX_PATIENCE,
				),
			};
			let mut rng = self.rng();

			augmenter.convex_fill(model, &req.record_ids, &params, &mut rng).await?
		} else {
			augmenter.shortest_path(model, &req.record_ids).await?
		};

		tracing::info!(
			method = method.as_str(),
			model = model.model_name.as_str(),
			seeds = req.record_ids.len(),
			added = record_ids.len(),
			"Collection augmented."
		);

		Ok(AugmentResponse { method, record_ids })
	}

	pub async fn sort_by_similarity(&self, req: SortRequest) -> Result<SortResponse> {
		let model = self.resolve_model(req.model_name.as_deref())?;
		let record_ids = self.orderer().by_shortest_path(model, &req.record_ids).await?;

		Ok(SortResponse { record_ids })
	}

	pub async fn path_from_two_terms(
		&self,
		req: PathFromTermsRequest,
	) -> Result<PathFromTermsResponse> {
		let model = self.resolve_model(req.model_name.as_deref())?;
		let items = self
			.orderer()
			.by_two_term_projection(model, &req.record_ids, &req.term1, &req.term2)
			.await?;

		Ok(PathFromTermsResponse { items })
	}

	fn orderer(&self) -> SimilarityOrderer<'_> {
		SimilarityOrderer {
			store: self.store.as_ref(),
			embedder: self.embedder.as_ref(),
			embedding_cfg: &self.cfg.providers.embedding,
			two_opt_max_passes: self.cfg.ordering.two_opt_max_passes,
		}
	}
}
