use atelier_domain::{RecordId, signal::ConceptKind};
use atelier_storage::{
	db::Db,
	models::{ModelRow, Neighbor},
	queries::{self, NearestQuery, RankedIdsQuery},
};

use crate::{BoxFuture, Result};

/// Relational and vector access used by the query engine.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn models(&self) -> BoxFuture<'_, Result<Vec<ModelRow>>>;

	/// Ids matching the predicate, ordered by distance to the query vector when one is given and by
	/// record id otherwise.
	fn ranked_ids<'a>(
		&'a self,
		query: &'a RankedIdsQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<RecordId>>>;

	/// The `k` nearest embeddings by inner product, closest first.
	fn nearest<'a>(&'a self, query: &'a NearestQuery<'a>) -> BoxFuture<'a, Result<Vec<Neighbor>>>;

	/// Stored embeddings of the given records. Records without an embedding are absent from the
	/// result, and order is unspecified.
	fn embeddings_of<'a>(
		&'a self,
		model_id: i32,
		record_ids: &'a [RecordId],
	) -> BoxFuture<'a, Result<Vec<(RecordId, Vec<f32>)>>>;

	fn embedding_of(
		&self,
		model_id: i32,
		record_id: RecordId,
	) -> BoxFuture<'_, Result<Option<Vec<f32>>>> {
		Box::pin(async move {
			let ids = [record_id];
			let found = self.embeddings_of(model_id, &ids).await?;

			Ok(found.into_iter().find(|(id, _)| *id == record_id).map(|(_, vec)| vec))
		})
	}

	fn concept_embedding<'a>(
		&'a self,
		kind: ConceptKind,
		name: &'a str,
		model_id: i32,
	) -> BoxFuture<'a, Result<Option<Vec<f32>>>>;

	fn concept_names(&self, kind: ConceptKind, model_id: i32) -> BoxFuture<'_, Result<Vec<String>>>;
}

/// Postgres with pgvector.
pub struct PgStore {
	pub db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl RecordStore for PgStore {
	fn models(&self) -> BoxFuture<'_, Result<Vec<ModelRow>>> {
		Box::pin(async move { Ok(queries::list_models(&self.db).await?) })
	}

	fn ranked_ids<'a>(
		&'a self,
		query: &'a RankedIdsQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<RecordId>>> {
		Box::pin(async move { Ok(queries::ranked_record_ids(&self.db, query).await?) })
	}

	fn nearest<'a>(&'a self, query: &'a NearestQuery<'a>) -> BoxFuture<'a, Result<Vec<Neighbor>>> {
		Box::pin(async move { Ok(queries::nearest_records(&self.db, query).await?) })
	}

	fn embeddings_of<'a>(
		&'a self,
		model_id: i32,
		record_ids: &'a [RecordId],
	) -> BoxFuture<'a, Result<Vec<(RecordId, Vec<f32>)>>> {
		Box::pin(async move { Ok(queries::artwork_embeddings(&self.db, model_id, record_ids).await?) })
	}

	fn concept_embedding<'a>(
		&'a self,
		kind: ConceptKind,
		name: &'a str,
		model_id: i32,
	) -> BoxFuture<'a, Result<Option<Vec<f32>>>> {
		Box::pin(async move {
			Ok(queries::concept_embedding(&self.db, kind, name, model_id).await?)
		})
	}

	fn concept_names(&self, kind: ConceptKind, model_id: i32) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(async move { Ok(queries::concept_names(&self.db, kind, model_id).await?) })
	}
}
