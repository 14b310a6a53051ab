use atelier_config::EmbeddingProviderConfig;
use atelier_domain::{
	RecordId,
	compose::{self, RankingMode},
	signal::{SignalSource, SoftSignal},
};
use atelier_storage::queries::NearestQuery;

use crate::{EmbeddingProvider, Error, RecordStore, Result, registry::ModelInfo};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComposeParams {
	pub mode: RankingMode,
	pub rocchio_k: u32,
	pub rocchio_scale: f32,
}

/// Turns weighted soft signals into one unit query vector.
pub struct QueryVectorComposer<'a> {
	pub store: &'a dyn RecordStore,
	pub embedder: &'a dyn EmbeddingProvider,
	pub embedding_cfg: &'a EmbeddingProviderConfig,
}
impl QueryVectorComposer<'_> {
	/// `Ok(None)` when no signal survives resolution, meaning the ranking falls back to filter
	/// order.
	pub async fn compose(
		&self,
		model: &ModelInfo,
		signals: &[SoftSignal],
		params: &ComposeParams,
	) -> Result<Option<Vec<f32>>> {
		let active = signals.iter().filter(|signal| signal.is_active()).collect::<Vec<_>>();
		let mut term_vectors = self.embed_terms(model, &active).await?.into_iter();
		let mut weighted = Vec::with_capacity(active.len());

		for signal in active {
			match &signal.source {
				SignalSource::Term(_) => {
					if let Some(vec) = term_vectors.next() {
						weighted.push((vec, signal.weight));
					}
				},
				SignalSource::Concept(kind, name) => {
					let found =
						self.store.concept_embedding(*kind, name.trim(), model.model_id).await?;

					match found {
						Some(vec) => weighted.push((vec, signal.weight)),
						None => tracing::warn!(
							kind = kind.as_str(),
							name = name.as_str(),
							model = model.model_name.as_str(),
							"Skipping soft constraint with no stored concept embedding."
						),
					}
				},
				SignalSource::Record(record_id) => {
					let Some(vec) = self.store.embedding_of(model.model_id, *record_id).await? else {
						tracing::warn!(
							record_id,
							model = model.model_name.as_str(),
							"Skipping soft constraint on a record without an embedding."
						);

						continue;
					};

					let neighbors = if params.mode == RankingMode::Rocchio {
						self.rocchio_neighbors(model, *record_id, &vec, signal.weight, params).await?
					} else {
						Vec::new()
					};

					weighted.push((vec, signal.weight));
					weighted.extend(neighbors);
				},
			}
		}

		if weighted.is_empty() {
			return Ok(None);
		}

		for (vec, _) in &weighted {
			if vec.len() != model.dimension {
				return Err(Error::InvalidRequest {
					message: format!(
						"Embedding dimension {} does not match model {} ({}).",
						vec.len(),
						model.model_name,
						model.dimension
					),
				});
			}
		}

		let combined = compose::combine(&weighted, params.mode)?;

		tracing::debug!(
			mode = params.mode.as_str(),
			signals = signals.len(),
			vectors = weighted.len(),
			"Composed query vector."
		);

		Ok(combined)
	}

	async fn embed_terms(&self, model: &ModelInfo, active: &[&SoftSignal]) -> Result<Vec<Vec<f32>>> {
		let texts = active
			.iter()
			.filter_map(|signal| match &signal.source {
				SignalSource::Term(text) => Some(text.trim().to_string()),
				_ => None,
			})
			.collect::<Vec<_>>();

		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let vectors = self.embedder.embed(self.embedding_cfg, &model.model_name, &texts).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} terms.",
					vectors.len(),
					texts.len()
				),
			});
		}

		Ok(vectors)
	}

	/// Neighbours of a reference record, weighted by their squared similarity to it.
	async fn rocchio_neighbors(
		&self,
		model: &ModelInfo,
		record_id: RecordId,
		vec: &[f32],
		weight: f32,
		params: &ComposeParams,
	) -> Result<Vec<(Vec<f32>, f32)>> {
		let exclude = [record_id];
		let neighbors = self
			.store
			.nearest(&NearestQuery {
				model_id: model.model_id,
				vector: vec,
				k: i64::from(params.rocchio_k),
				restrict_to: None,
				exclude: &exclude,
			})
			.await?;
		let ids = neighbors.iter().map(|neighbor| neighbor.record_id).collect::<Vec<_>>();
		let vectors = self.store.embeddings_of(model.model_id, &ids).await?;
		let mut weighted = Vec::with_capacity(neighbors.len());

		for neighbor in neighbors {
			let neighbor_weight =
				compose::rocchio_weight(params.rocchio_scale, weight, neighbor.distance);

			if neighbor_weight == 0.0 {
				continue;
			}
			if let Some((_, neighbor_vec)) = vectors.iter().find(|(id, _)| *id == neighbor.record_id)
			{
				weighted.push((neighbor_vec.clone(), neighbor_weight));
			}
		}

		Ok(weighted)
	}
}
