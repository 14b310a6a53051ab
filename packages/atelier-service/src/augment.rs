use std::collections::HashSet;

use rand::Rng;

use atelier_domain::{
	RecordId,
	path::{self, DistanceMatrix},
	vector,
};
use atelier_storage::queries::NearestQuery;

use crate::{Error, MAX_COLLECTION_RECORDS, RecordStore, Result, registry::ModelInfo};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvexFillParams {
	pub count: u32,
	pub similarity_threshold: f32,
	pub decay_rate: f32,
	pub patience: u32,
}

/// Extends a record set with records found between its members in embedding space.
pub struct CollectionAugmenter<'a> {
	pub store: &'a dyn RecordStore,
	pub two_opt_max_passes: u32,
}
impl CollectionAugmenter<'_> {
	/// Samples seed pairs and adds the record nearest to each accepted pair's midpoint.
	///
	/// Pairs less similar than the running threshold are rejected and the threshold decays. After
	/// `patience` rejections the next pair is accepted regardless, and both the rejection counter
	/// and the threshold start over.
	pub async fn convex_fill<R>(
		&self,
		model: &ModelInfo,
		seeds: &[RecordId],
		params: &ConvexFillParams,
		rng: &mut R,
	) -> Result<Vec<RecordId>>
	where
		R: Rng + Send,
	{
		let seeds = load_seeds(self.store, model, seeds).await?;
		let mut used = seeds.iter().map(|(id, _)| *id).collect::<Vec<_>>();
		let mut produced = Vec::new();
		let mut min_similarity = params.similarity_threshold;
		let mut rejections = 0;

		while produced.len() < params.count as usize {
			let (_, lhs) = &seeds[rng.gen_range(0..seeds.len())];
			let (_, rhs) = &seeds[rng.gen_range(0..seeds.len())];
			let similarity = vector::cosine_similarity(lhs, rhs).unwrap_or(0.0);

			if similarity < min_similarity {
				rejections += 1;
				min_similarity *= params.decay_rate;

				if rejections < params.patience {
					continue;
				}

				tracing::debug!(rejections, similarity, "Forcing acceptance of a seed pair.");

				rejections = 0;
				min_similarity = params.similarity_threshold;
			}

			let Some(next) = nearest_unused(self.store, model, &vector::midpoint(lhs, rhs), &used)
				.await?
			else {
				tracing::info!(produced = produced.len(), "Candidate pool exhausted during convex fill.");

				break;
			};

			used.push(next);
			produced.push(next);
		}

		Ok(produced)
	}

	/// Orders the seeds along a shortest open path and adds the record nearest to the midpoint of
	/// each consecutive pair.
	pub async fn shortest_path(
		&self,
		model: &ModelInfo,
		seeds: &[RecordId],
	) -> Result<Vec<RecordId>> {
		let seeds = load_seeds(self.store, model, seeds).await?;
		let matrix = DistanceMatrix::from_vectors(
			&seeds.iter().map(|(_, vec)| vec.as_slice()).collect::<Vec<_>>(),
		);
		let order = path::shortest_open_path(&matrix, self.two_opt_max_passes);
		let mut used = seeds.iter().map(|(id, _)| *id).collect::<Vec<_>>();
		let mut produced = Vec::new();

		for pair in order.windows(2) {
			let (_, lhs) = &seeds[pair[0]];
			let (_, rhs) = &seeds[pair[1]];
			let Some(next) =
				nearest_unused(self.store, model, &vector::midpoint(lhs, rhs), &used).await?
			else {
				tracing::info!(produced = produced.len(), "Candidate pool exhausted during path fill.");

				break;
			};

			used.push(next);
			produced.push(next);
		}

		Ok(produced)
	}
}

/// Sorted, deduplicated seeds with their embeddings. Every seed must have one, sized to the model.
pub(crate) async fn load_seeds(
	store: &dyn RecordStore,
	model: &ModelInfo,
	record_ids: &[RecordId],
) -> Result<Vec<(RecordId, Vec<f32>)>> {
	let mut ids = record_ids.to_vec();

	ids.sort_unstable();
	ids.dedup();

	if ids.is_empty() {
		return Err(Error::DegenerateQuery { message: "No records selected.".to_string() });
	}
	if ids.len() > MAX_COLLECTION_RECORDS {
		return Err(Error::InvalidRequest {
			message: format!(
				"Too many records selected ({}/{MAX_COLLECTION_RECORDS}).",
				ids.len()
			),
		});
	}

	let mut found = store.embeddings_of(model.model_id, &ids).await?;

	found.sort_unstable_by_key(|(id, _)| *id);
	found.dedup_by_key(|(id, _)| *id);

	if found.len() != ids.len() {
		let present = found.iter().map(|(id, _)| *id).collect::<HashSet<_>>();
		let missing = ids.iter().filter(|id| !present.contains(id)).collect::<Vec<_>>();

		return Err(Error::NotFound {
			message: format!(
				"Records {missing:?} have no embedding under model {}.",
				model.model_name
			),
		});
	}

	if let Some((record_id, vec)) = found.iter().find(|(_, vec)| vec.len() != model.dimension) {
		return Err(Error::InvalidRequest {
			message: format!(
				"Record {record_id} has a {}-dimensional embedding; model {} expects {}.",
				vec.len(),
				model.model_name,
				model.dimension
			),
		});
	}

	Ok(found)
}

async fn nearest_unused(
	store: &dyn RecordStore,
	model: &ModelInfo,
	probe: &[f32],
	used: &[RecordId],
) -> Result<Option<RecordId>> {
	let neighbors = store
		.nearest(&NearestQuery {
			model_id: model.model_id,
			vector: probe,
			k: 1,
			restrict_to: None,
			exclude: used,
		})
		.await?;

	Ok(neighbors.first().map(|neighbor| neighbor.record_id))
}

#[cfg(test)]
mod tests {
	use rand::{SeedableRng, rngs::StdRng};

	use super::*;
	use crate::memory::MemoryStore;

	fn model() -> ModelInfo {
		ModelInfo {
			model_id: 1,
			model_name: "march_finetuned".to_string(),
			dimension: 2,
			description: None,
		}
	}

	fn store() -> MemoryStore {
		let mut store = MemoryStore::new();

		store.add_model("march_finetuned", 2);

		for (record_id, angle) in (1..=12).zip((0..12).map(|step| step as f32 * 0.1)) {
			store.add_embedding(1, record_id, vec![angle.cos(), angle.sin()]);
		}

		store
	}

	#[tokio::test]
	async fn convex_fill_returns_fresh_distinct_records() {
		let store = store();
		let augmenter = CollectionAugmenter { store: &store, two_opt_max_passes: 8 };
		let params =
			ConvexFillParams { count: 5, similarity_threshold: 0.5, decay_rate: 0.5, patience: 3 };
		let mut rng = StdRng::seed_from_u64(7);
		let produced =
			augmenter.convex_fill(&model(), &[1, 12], &params, &mut rng).await.expect("fill failed");
		let distinct = produced.iter().collect::<HashSet<_>>();

		assert_eq!(produced.len(), 5);
		assert_eq!(distinct.len(), 5);
		assert!(!produced.contains(&1) && !produced.contains(&12));
	}

	#[tokio::test]
	async fn convex_fill_stops_when_the_pool_runs_dry() {
		let store = store();
		let augmenter = CollectionAugmenter { store: &store, two_opt_max_passes: 8 };
		let params =
			ConvexFillParams { count: 50, similarity_threshold: 0.0, decay_rate: 0.5, patience: 1 };
		let mut rng = StdRng::seed_from_u64(1);
		let produced =
			augmenter.convex_fill(&model(), &[1, 2], &params, &mut rng).await.expect("fill failed");

		assert_eq!(produced.len(), 10);
	}

	#[tokio::test]
	async fn forced_acceptance_makes_progress_on_orthogonal_seeds() {
		let mut store = MemoryStore::new();

		store.add_model("march_finetuned", 2);
		store.add_embedding(1, 1, vec![1.0, 0.0]);
		store.add_embedding(1, 2, vec![0.0, 1.0]);
		store.add_embedding(1, 3, vec![0.7, 0.7]);

		let augmenter = CollectionAugmenter { store: &store, two_opt_max_passes: 8 };
		let params =
			ConvexFillParams { count: 1, similarity_threshold: 1.0, decay_rate: 1.0, patience: 2 };
		let mut rng = StdRng::seed_from_u64(3);
		let produced =
			augmenter.convex_fill(&model(), &[1, 2], &params, &mut rng).await.expect("fill failed");

		assert_eq!(produced, vec![3]);
	}

	#[tokio::test]
	async fn empty_and_unknown_seeds_are_rejected() {
		let store = store();
		let augmenter = CollectionAugmenter { store: &store, two_opt_max_passes: 8 };

		assert!(matches!(
			augmenter.shortest_path(&model(), &[]).await,
			Err(Error::DegenerateQuery { .. })
		));
		assert!(matches!(
			augmenter.shortest_path(&model(), &[1, 99]).await,
			Err(Error::NotFound { .. })
		));
	}

	#[tokio::test]
	async fn oversized_selections_are_rejected_before_loading() {
		let store = store();
		let augmenter = CollectionAugmenter { store: &store, two_opt_max_passes: 8 };
		let ids = (1..=MAX_COLLECTION_RECORDS as RecordId + 1).collect::<Vec<_>>();

		assert!(matches!(
			augmenter.shortest_path(&model(), &ids).await,
			Err(Error::InvalidRequest { .. })
		));
		// Duplicates do not count against the cap.
		assert!(augmenter.shortest_path(&model(), &[1, 1, 1, 12]).await.is_ok());
	}

	#[tokio::test]
	async fn seeds_sized_for_another_model_are_invalid() {
		let mut store = store();

		store.add_embedding(1, 13, vec![1.0, 0.0, 0.0]);

		let augmenter = CollectionAugmenter { store: &store, two_opt_max_passes: 8 };
		let err = augmenter.shortest_path(&model(), &[1, 13]).await.expect_err("expected mismatch");

		assert!(matches!(err, Error::InvalidRequest { .. }), "{err:?}");
	}

	#[tokio::test]
	async fn path_fill_adds_one_record_per_gap() {
		let store = store();
		let augmenter = CollectionAugmenter { store: &store, two_opt_max_passes: 8 };
		let produced = augmenter.shortest_path(&model(), &[11, 1, 5]).await.expect("fill failed");

		// Seeds lie on an arc, so the path is 1 -> 5 -> 11 and each gap gets its middle record.
		assert_eq!(produced, vec![3, 8]);
	}
}
