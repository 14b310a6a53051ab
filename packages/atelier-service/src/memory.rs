//! Exact-search store kept in memory. Backs tests and fixtures with the same contract as Postgres.

use std::{
	cmp::Ordering,
	collections::{BTreeMap, HashMap},
};

use atelier_domain::{RecordId, record::RecordFields, signal::ConceptKind, vector};
use atelier_storage::{
	models::{ModelRow, Neighbor},
	queries::{NearestQuery, RankedIdsQuery},
};

use crate::{BoxFuture, Error, RecordStore, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
	models: Vec<ModelRow>,
	records: BTreeMap<RecordId, RecordFields>,
	embeddings: HashMap<(i32, RecordId), Vec<f32>>,
	concepts: HashMap<(ConceptKind, String, i32), Vec<f32>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a model and returns its id.
	pub fn add_model(&mut self, name: &str, dimension: i32) -> i32 {
		let model_id = self.models.len() as i32 + 1;

		self.models.push(ModelRow {
			model_id,
			model_name: name.to_string(),
			dimension,
			description: None,
		});

		model_id
	}

	pub fn add_record(&mut self, record_id: RecordId, fields: RecordFields) {
		self.records.insert(record_id, fields);
	}

	pub fn add_embedding(&mut self, model_id: i32, record_id: RecordId, vec: Vec<f32>) {
		self.records.entry(record_id).or_default();
		self.embeddings.insert((model_id, record_id), vec);
	}

	pub fn add_concept(&mut self, kind: ConceptKind, name: &str, model_id: i32, vec: Vec<f32>) {
		self.concepts.insert((kind, name.to_string(), model_id), vec);
	}

	fn distance(&self, model_id: i32, record_id: RecordId, probe: &[f32]) -> Result<Option<f32>> {
		let Some(vec) = self.embeddings.get(&(model_id, record_id)) else {
			return Ok(None);
		};

		if vec.len() != probe.len() {
			return Err(Error::InvalidRequest {
				message: format!(
					"Probe vector has dimension {}, stored embeddings have {}.",
					probe.len(),
					vec.len()
				),
			});
		}

		Ok(Some(-vector::dot(vec, probe)))
	}
}
impl RecordStore for MemoryStore {
	fn models(&self) -> BoxFuture<'_, Result<Vec<ModelRow>>> {
		let models = self.models.clone();

		Box::pin(async move { Ok(models) })
	}

	fn ranked_ids<'a>(
		&'a self,
		query: &'a RankedIdsQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<RecordId>>> {
		Box::pin(async move {
			let mut candidates = Vec::new();

			for (record_id, fields) in &self.records {
				if !self.embeddings.contains_key(&(query.model_id, *record_id))
					|| query.exclude.contains(record_id)
					|| !query.predicate.matches(fields)
				{
					continue;
				}

				let distance = match query.vector {
					Some(probe) => self.distance(query.model_id, *record_id, probe)?.unwrap_or(0.0),
					None => 0.0,
				};

				candidates.push((*record_id, distance));
			}

			if query.vector.is_some() {
				candidates.sort_by(by_distance_then_id);
			}

			Ok(candidates
				.into_iter()
				.skip(query.offset.max(0) as usize)
				.take(query.limit.max(0) as usize)
				.map(|(record_id, _)| record_id)
				.collect())
		})
	}

	fn nearest<'a>(&'a self, query: &'a NearestQuery<'a>) -> BoxFuture<'a, Result<Vec<Neighbor>>> {
		Box::pin(async move {
			let mut candidates = Vec::new();

			for (model_id, record_id) in self.embeddings.keys() {
				if *model_id != query.model_id
					|| query.exclude.contains(record_id)
					|| query.restrict_to.is_some_and(|allowed| !allowed.contains(record_id))
				{
					continue;
				}
				if let Some(distance) = self.distance(*model_id, *record_id, query.vector)? {
					candidates.push((*record_id, distance));
				}
			}

			candidates.sort_by(by_distance_then_id);

			Ok(candidates
				.into_iter()
				.take(query.k.max(0) as usize)
				.map(|(record_id, distance)| Neighbor { record_id, distance })
				.collect())
		})
	}

	fn embeddings_of<'a>(
		&'a self,
		model_id: i32,
		record_ids: &'a [RecordId],
	) -> BoxFuture<'a, Result<Vec<(RecordId, Vec<f32>)>>> {
		Box::pin(async move {
			Ok(record_ids
				.iter()
				.filter_map(|record_id| {
					self.embeddings.get(&(model_id, *record_id)).map(|vec| (*record_id, vec.clone()))
				})
				.collect())
		})
	}

	fn concept_embedding<'a>(
		&'a self,
		kind: ConceptKind,
		name: &'a str,
		model_id: i32,
	) -> BoxFuture<'a, Result<Option<Vec<f32>>>> {
		Box::pin(async move { Ok(self.concepts.get(&(kind, name.to_string(), model_id)).cloned()) })
	}

	fn concept_names(&self, kind: ConceptKind, model_id: i32) -> BoxFuture<'_, Result<Vec<String>>> {
		let mut names = self
			.concepts
			.keys()
			.filter(|(k, _, m)| *k == kind && *m == model_id)
			.map(|(_, name, _)| name.clone())
			.collect::<Vec<_>>();

		names.sort_unstable();

		Box::pin(async move { Ok(names) })
	}
}

fn by_distance_then_id(lhs: &(RecordId, f32), rhs: &(RecordId, f32)) -> Ordering {
	lhs.1.total_cmp(&rhs.1).then(lhs.0.cmp(&rhs.0))
}
