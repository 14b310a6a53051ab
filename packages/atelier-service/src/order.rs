use serde::Serialize;

use atelier_config::EmbeddingProviderConfig;
use atelier_domain::{
	RecordId,
	path::{self, DistanceMatrix},
	projection,
};

use crate::{
	EmbeddingProvider, Error, RecordStore, Result, augment::load_seeds, registry::ModelInfo,
};

/// A record and its position on the axis between two anchor terms.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectedRecord {
	pub record_id: RecordId,
	pub alpha: f32,
}

pub struct SimilarityOrderer<'a> {
	pub store: &'a dyn RecordStore,
	pub embedder: &'a dyn EmbeddingProvider,
	pub embedding_cfg: &'a EmbeddingProviderConfig,
	pub two_opt_max_passes: u32,
}
impl SimilarityOrderer<'_> {
	/// Visiting order of the records along an approximate shortest open path.
	pub async fn by_shortest_path(
		&self,
		model: &ModelInfo,
		record_ids: &[RecordId],
	) -> Result<Vec<RecordId>> {
		ensure_at_least_two(record_ids)?;

		// Path tie-breaking follows input order, so seeds come back sorted by id.
		let records = load_seeds(self.store, model, record_ids).await?;
		let matrix = DistanceMatrix::from_vectors(
			&records.iter().map(|(_, vec)| vec.as_slice()).collect::<Vec<_>>(),
		);
		let order = path::shortest_open_path(&matrix, self.two_opt_max_passes);

		tracing::debug!(
			records = records.len(),
			cost = matrix.path_cost(&order),
			"Ordered records by shortest path."
		);

		Ok(order.into_iter().map(|index| records[index].0).collect())
	}

	/// Records sorted by their projection onto the axis from `term1` to `term2`.
	pub async fn by_two_term_projection(
		&self,
		model: &ModelInfo,
		record_ids: &[RecordId],
		term1: &str,
		term2: &str,
	) -> Result<Vec<ProjectedRecord>> {
		let (term1, term2) = (term1.trim(), term2.trim());

		if term1.is_empty() || term2.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Both anchor terms must be non-empty.".to_string(),
			});
		}

		ensure_at_least_two(record_ids)?;

		let records = load_seeds(self.store, model, record_ids).await?;
		let anchors = self
			.embedder
			.embed(self.embedding_cfg, &model.model_name, &[term1.to_string(), term2.to_string()])
			.await?;
		let [start, end] = anchors.as_slice() else {
			return Err(Error::Provider {
				message: format!("Embedding provider returned {} vectors for 2 terms.", anchors.len()),
			});
		};

		if start.len() != model.dimension || end.len() != model.dimension {
			return Err(Error::InvalidRequest {
				message: format!(
					"Anchor embeddings do not match model {} ({}).",
					model.model_name, model.dimension
				),
			});
		}

		// Record and anchor dimensions are both checked against the model, so only coinciding
		// anchors leave the axis undefined.
		let vectors = records.iter().map(|(_, vec)| vec.as_slice()).collect::<Vec<_>>();
		let Some(alphas) = projection::axis_positions(&vectors, start, end) else {
			return Err(Error::DegenerateQuery {
				message: format!("Terms {term1:?} and {term2:?} embed to the same point."),
			});
		};
		let mut projected = records
			.iter()
			.zip(alphas)
			.map(|((record_id, _), alpha)| ProjectedRecord { record_id: *record_id, alpha })
			.collect::<Vec<_>>();

		projected.sort_by(|lhs, rhs| {
			lhs.alpha.total_cmp(&rhs.alpha).then(lhs.record_id.cmp(&rhs.record_id))
		});

		Ok(projected)
	}
}

fn ensure_at_least_two(record_ids: &[RecordId]) -> Result<()> {
	let mut distinct = record_ids.to_vec();

	distinct.sort_unstable();
	distinct.dedup();

	if distinct.len() < 2 {
		return Err(Error::InvalidRequest {
			message: "At least two distinct records are required.".to_string(),
		});
	}

	Ok(())
}
