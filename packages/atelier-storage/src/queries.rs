use sqlx::{Postgres, Row, postgres::PgArguments, query::Query};

use atelier_domain::{
	RecordId,
	predicate::{Predicate, SqlValue},
	signal::ConceptKind,
};

use crate::{
	Result,
	db::Db,
	models::{Artist, Artwork, ModelRow, Neighbor},
	vector::{parse_pg_vector, vector_to_pg},
};

/// Filtered, optionally vector-ranked page of record ids. Only records embedded under `model_id`
/// are candidates.
pub struct RankedIdsQuery<'a> {
	pub predicate: &'a Predicate,
	pub model_id: i32,
	/// Rank by ascending negative inner product when set, by record id otherwise.
	pub vector: Option<&'a [f32]>,
	pub exclude: &'a [RecordId],
	pub limit: i64,
	pub offset: i64,
}

pub struct NearestQuery<'a> {
	pub model_id: i32,
	pub vector: &'a [f32],
	pub k: i64,
	pub restrict_to: Option<&'a [RecordId]>,
	pub exclude: &'a [RecordId],
}

pub async fn list_models(db: &Db) -> Result<Vec<ModelRow>> {
	let rows = sqlx::query_as::<_, ModelRow>(
		"\
SELECT model_id, model_name, dimension, description
FROM models
ORDER BY model_id",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn upsert_model(
	db: &Db,
	model_name: &str,
	dimension: i32,
	description: Option<&str>,
) -> Result<i32> {
	let model_id: i32 = sqlx::query_scalar(
		"\
INSERT INTO models (model_name, dimension, description)
VALUES ($1, $2, $3)
ON CONFLICT (model_name) DO UPDATE
SET dimension = EXCLUDED.dimension, description = EXCLUDED.description
RETURNING model_id",
	)
	.bind(model_name)
	.bind(dimension)
	.bind(description)
	.fetch_one(&db.pool)
	.await?;

	Ok(model_id)
}

pub async fn insert_artist(db: &Db, artist: &Artist) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO artists (
	creator_id,
	first_name,
	last_name,
	birth_and_death_description,
	nationality,
	birth_date,
	death_date
)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (creator_id) DO NOTHING",
	)
	.bind(artist.creator_id.as_str())
	.bind(artist.first_name.as_deref())
	.bind(artist.last_name.as_deref())
	.bind(artist.birth_and_death_description.as_deref())
	.bind(artist.nationality.as_deref())
	.bind(artist.birth_date)
	.bind(artist.death_date)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_artwork(db: &Db, artwork: &Artwork) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO artworks (
	record_id,
	creator_id,
	work_id,
	language,
	title,
	object_work_type,
	term_classification,
	materials,
	signature_full_description,
	creation_full_description,
	creation_earliest_date,
	creation_latest_date,
	creator_full_description,
	physical_appearance_description,
	image_type,
	image_color,
	image_copyright,
	styles_periods,
	iconographic_terms,
	height,
	width,
	ratio
)
VALUES (
	$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
	$12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
)
ON CONFLICT (record_id) DO NOTHING",
	)
	.bind(artwork.record_id)
	.bind(artwork.creator_id.as_deref())
	.bind(artwork.work_id.as_deref())
	.bind(artwork.language.as_deref())
	.bind(artwork.title.as_deref())
	.bind(artwork.object_work_type.clone())
	.bind(artwork.term_classification.as_deref())
	.bind(artwork.materials.clone())
	.bind(artwork.signature_full_description.as_deref())
	.bind(artwork.creation_full_description.as_deref())
	.bind(artwork.creation_earliest_date)
	.bind(artwork.creation_latest_date)
	.bind(artwork.creator_full_description.as_deref())
	.bind(artwork.physical_appearance_description.as_deref())
	.bind(artwork.image_type.as_deref())
	.bind(artwork.image_color.as_deref())
	.bind(artwork.image_copyright.as_deref())
	.bind(artwork.styles_periods.clone())
	.bind(artwork.iconographic_terms.clone())
	.bind(artwork.height)
	.bind(artwork.width)
	.bind(artwork.ratio)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn upsert_artwork_embedding(
	db: &Db,
	record_id: RecordId,
	model_id: i32,
	vec: &[f32],
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO artwork_embeddings (record_id, model_id, vec)
VALUES ($1, $2, $3::text::vector)
ON CONFLICT (record_id, model_id) DO UPDATE
SET vec = EXCLUDED.vec",
	)
	.bind(record_id)
	.bind(model_id)
	.bind(vector_to_pg(vec))
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn upsert_concept_embedding(
	db: &Db,
	kind: ConceptKind,
	name: &str,
	model_id: i32,
	vec: &[f32],
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO concept_embeddings (kind, name, model_id, vec)
VALUES ($1, $2, $3, $4::text::vector)
ON CONFLICT (kind, name, model_id) DO UPDATE
SET vec = EXCLUDED.vec",
	)
	.bind(kind.as_str())
	.bind(name)
	.bind(model_id)
	.bind(vector_to_pg(vec))
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn ranked_record_ids(db: &Db, query: &RankedIdsQuery<'_>) -> Result<Vec<RecordId>> {
	let vector_text = query.vector.map(vector_to_pg);
	// $1 is the model id and $2 the probe vector when ranking.
	let first_filter_placeholder = if vector_text.is_some() { 3 } else { 2 };
	let filter = query.predicate.to_sql(first_filter_placeholder);
	let exclude_placeholder = first_filter_placeholder + filter.params.len();
	let order_by =
		if vector_text.is_some() { "e.vec <#> $2::text::vector, a.record_id" } else { "a.record_id" };
	let sql = format!(
		"\
SELECT a.record_id
FROM artworks a
LEFT JOIN artists ar ON ar.creator_id = a.creator_id
JOIN artwork_embeddings e ON e.record_id = a.record_id AND e.model_id = $1
WHERE ({filter_sql})
	AND NOT (a.record_id = ANY(${exclude_placeholder}))
ORDER BY {order_by}
LIMIT ${limit_placeholder}
OFFSET ${offset_placeholder}",
		filter_sql = filter.sql,
		limit_placeholder = exclude_placeholder + 1,
		offset_placeholder = exclude_placeholder + 2,
	);
	let mut statement = sqlx::query(&sql).bind(query.model_id);

	if let Some(text) = vector_text {
		statement = statement.bind(text);
	}

	for param in &filter.params {
		statement = bind_sql_value(statement, param);
	}

	let rows = statement
		.bind(query.exclude.to_vec())
		.bind(query.limit)
		.bind(query.offset)
		.fetch_all(&db.pool)
		.await?;

	tracing::debug!(
		model_id = query.model_id,
		ranked = query.vector.is_some(),
		params = filter.params.len(),
		returned = rows.len(),
		"Fetched ranked record ids."
	);

	rows.iter().map(|row| row.try_get::<i64, _>(0).map_err(Into::into)).collect()
}

pub async fn nearest_records(db: &Db, query: &NearestQuery<'_>) -> Result<Vec<Neighbor>> {
	let rows: Vec<(i64, f64)> = sqlx::query_as(
		"\
SELECT e.record_id, (e.vec <#> $2::text::vector)::float8 AS distance
FROM artwork_embeddings e
WHERE e.model_id = $1
	AND NOT (e.record_id = ANY($3))
	AND ($4::bigint[] IS NULL OR e.record_id = ANY($4))
ORDER BY distance, e.record_id
LIMIT $5",
	)
	.bind(query.model_id)
	.bind(vector_to_pg(query.vector))
	.bind(query.exclude.to_vec())
	.bind(query.restrict_to.map(<[RecordId]>::to_vec))
	.bind(query.k)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows
		.into_iter()
		.map(|(record_id, distance)| Neighbor { record_id, distance: distance as f32 })
		.collect())
}

pub async fn artwork_embeddings(
	db: &Db,
	model_id: i32,
	record_ids: &[RecordId],
) -> Result<Vec<(RecordId, Vec<f32>)>> {
	let rows: Vec<(i64, String)> = sqlx::query_as(
		"\
SELECT record_id, vec::text
FROM artwork_embeddings
WHERE model_id = $1 AND record_id = ANY($2)",
	)
	.bind(model_id)
	.bind(record_ids.to_vec())
	.fetch_all(&db.pool)
	.await?;

	rows.into_iter()
		.map(|(record_id, text)| Ok((record_id, parse_pg_vector(&text)?)))
		.collect()
}

pub async fn concept_embedding(
	db: &Db,
	kind: ConceptKind,
	name: &str,
	model_id: i32,
) -> Result<Option<Vec<f32>>> {
	let text: Option<String> = sqlx::query_scalar(
		"\
SELECT vec::text
FROM concept_embeddings
WHERE kind = $1 AND name = $2 AND model_id = $3",
	)
	.bind(kind.as_str())
	.bind(name)
	.bind(model_id)
	.fetch_optional(&db.pool)
	.await?;

	text.map(|text| parse_pg_vector(&text)).transpose()
}

/// Stored concept names of one kind, alphabetically.
pub async fn concept_names(db: &Db, kind: ConceptKind, model_id: i32) -> Result<Vec<String>> {
	let names = sqlx::query_scalar(
		"\
SELECT name
FROM concept_embeddings
WHERE kind = $1 AND model_id = $2
ORDER BY name",
	)
	.bind(kind.as_str())
	.bind(model_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(names)
}

fn bind_sql_value<'q>(
	statement: Query<'q, Postgres, PgArguments>,
	value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
	match value {
		SqlValue::Text(value) => statement.bind(value.clone()),
		SqlValue::Int(value) => statement.bind(*value),
		SqlValue::Float(value) => statement.bind(*value),
		SqlValue::TextArray(values) => statement.bind(values.clone()),
	}
}
