use serde_json::json;

use atelier_config::Postgres;
use atelier_domain::{constraint::parse_constraints, predicate, signal::ConceptKind};
use atelier_storage::{
	db::Db,
	models::{Artist, Artwork},
	queries::{self, NearestQuery, RankedIdsQuery},
};
use atelier_testkit::TestDatabase;

async fn seeded(test_db: &TestDatabase) -> (Db, i32) {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let model_id =
		queries::upsert_model(&db, "march_finetuned", 2, None).await.expect("Failed to add model.");

	queries::insert_artist(
		&db,
		&Artist {
			creator_id: "delacroix".to_string(),
			last_name: Some("Delacroix".to_string()),
			nationality: Some("française".to_string()),
			birth_date: Some(1_798),
			..Default::default()
		},
	)
	.await
	.expect("Failed to insert artist.");

	let artworks = [
		(1, "Portrait d'une femme", Some(1_650), [1.0_f32, 0.0]),
		(2, "Caravane en Syrie", Some(1_860), [0.8, 0.6]),
		(3, "Marine", None, [0.0, 1.0]),
	];

	for (record_id, title, earliest, vec) in artworks {
		queries::insert_artwork(
			&db,
			&Artwork {
				record_id,
				creator_id: Some("delacroix".to_string()),
				title: Some(title.to_string()),
				creation_earliest_date: earliest,
				materials: Some(vec!["huile".to_string(), "toile".to_string()]),
				..Default::default()
			},
		)
		.await
		.expect("Failed to insert artwork.");
		queries::upsert_artwork_embedding(&db, record_id, model_id, &vec)
			.await
			.expect("Failed to insert embedding.");
	}

	(db, model_id)
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = atelier_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set ATELIER_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	// Bootstrapping twice must be harmless.
	db.ensure_schema().await.expect("Failed to ensure schema twice.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'artwork_embeddings'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn filtered_ids_rank_by_inner_product() {
	let Some(base_dsn) = atelier_testkit::env_dsn() else {
		eprintln!("Skipping filtered_ids_rank_by_inner_product; set ATELIER_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let (db, model_id) = seeded(&test_db).await;
	let tree = parse_constraints(
		&json!([
			{ "type": "EQUAL", "columnKey": "creatorLastName", "equalTo": "delacroix" },
			{ "type": "AND" },
			{ "type": "BETWEEN", "columnKey": "creationEarliestDate", "from": 1_600, "to": 1_900, "keepNull": true },
		]),
		"$.hard_constraints",
	)
	.expect("Failed to parse constraints.");
	let predicate = predicate::compile(&tree);
	let probe = [0.0_f32, 1.0];
	let ranked = queries::ranked_record_ids(
		&db,
		&RankedIdsQuery {
			predicate: &predicate,
			model_id,
			vector: Some(&probe),
			exclude: &[],
			limit: 10,
			offset: 0,
		},
	)
	.await
	.expect("Failed to rank.");

	assert_eq!(ranked, vec![3, 2, 1]);

	let unranked = queries::ranked_record_ids(
		&db,
		&RankedIdsQuery {
			predicate: &predicate,
			model_id,
			vector: None,
			exclude: &[1],
			limit: 1,
			offset: 1,
		},
	)
	.await
	.expect("Failed to page.");

	assert_eq!(unranked, vec![3]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn nearest_respects_exclusion_and_restriction() {
	let Some(base_dsn) = atelier_testkit::env_dsn() else {
		eprintln!("Skipping nearest_respects_exclusion_and_restriction; set ATELIER_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let (db, model_id) = seeded(&test_db).await;
	let probe = [1.0_f32, 0.0];
	let nearest = queries::nearest_records(
		&db,
		&NearestQuery { model_id, vector: &probe, k: 2, restrict_to: None, exclude: &[1] },
	)
	.await
	.expect("Failed to search.");

	assert_eq!(nearest.iter().map(|n| n.record_id).collect::<Vec<_>>(), vec![2, 3]);
	assert!((nearest[0].distance + 0.8).abs() < 1e-5);

	let restricted = queries::nearest_records(
		&db,
		&NearestQuery { model_id, vector: &probe, k: 5, restrict_to: Some(&[3]), exclude: &[] },
	)
	.await
	.expect("Failed to search.");

	assert_eq!(restricted.len(), 1);
	assert_eq!(restricted[0].record_id, 3);

	let embeddings =
		queries::artwork_embeddings(&db, model_id, &[2, 99]).await.expect("Failed to load.");

	assert_eq!(embeddings, vec![(2, vec![0.8, 0.6])]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn concept_embeddings_are_keyed_by_kind() {
	let Some(base_dsn) = atelier_testkit::env_dsn() else {
		eprintln!("Skipping concept_embeddings_are_keyed_by_kind; set ATELIER_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let (db, model_id) = seeded(&test_db).await;

	queries::upsert_concept_embedding(&db, ConceptKind::Color, "rouge", model_id, &[0.6, 0.8])
		.await
		.expect("Failed to insert concept.");

	let color = queries::concept_embedding(&db, ConceptKind::Color, "rouge", model_id)
		.await
		.expect("Failed to load concept.");
	let keyword = queries::concept_embedding(&db, ConceptKind::Keyword, "rouge", model_id)
		.await
		.expect("Failed to load concept.");

	assert_eq!(color, Some(vec![0.6, 0.8]));
	assert_eq!(keyword, None);

	queries::upsert_concept_embedding(&db, ConceptKind::Color, "bleu", model_id, &[0.0, 1.0])
		.await
		.expect("Failed to insert concept.");

	let colors = queries::concept_names(&db, ConceptKind::Color, model_id)
		.await
		.expect("Failed to list concepts.");

	assert_eq!(colors, vec!["bleu".to_string(), "rouge".to_string()]);
	assert!(
		queries::concept_names(&db, ConceptKind::Keyword, model_id)
			.await
			.expect("Failed to list concepts.")
			.is_empty()
	);

	let models = queries::list_models(&db).await.expect("Failed to list models.");

	assert_eq!(models.len(), 1);
	assert_eq!(models[0].dimension, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn negated_list_filters_drop_missing_lists_unless_kept() {
	let Some(base_dsn) = atelier_testkit::env_dsn() else {
		eprintln!("Skipping negated_list_filters_drop_missing_lists_unless_kept; set ATELIER_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let (db, model_id) = seeded(&test_db).await;

	for (record_id, materials) in [(4, None), (5, Some(vec!["bronze".to_string()]))] {
		queries::insert_artwork(&db, &Artwork { record_id, materials, ..Default::default() })
			.await
			.expect("Failed to insert artwork.");
		queries::upsert_artwork_embedding(&db, record_id, model_id, &[0.6, 0.8])
			.await
			.expect("Failed to insert embedding.");
	}

	let cases = [
		(json!([{ "type": "INCLUDES", "columnKey": "materials", "values": ["HUILE"], "isNot": true }]), vec![5]),
		(json!([{ "type": "EQUAL", "columnKey": "materials", "equalTo": "huile", "isNot": true }]), vec![5]),
		(
			json!([{ "type": "INCLUDES", "columnKey": "materials", "values": ["huile"], "isNot": true, "caseSensitive": true }]),
			vec![5],
		),
		(
			json!([{ "type": "INCLUDES", "columnKey": "materials", "values": ["HUILE"], "isNot": true, "keepNull": true }]),
			vec![4, 5],
		),
	];

	for (raw, expected) in cases {
		let tree = parse_constraints(&raw, "$.hard_constraints").expect("Failed to parse constraints.");
		let predicate = predicate::compile(&tree);
		let ids = queries::ranked_record_ids(
			&db,
			&RankedIdsQuery {
				predicate: &predicate,
				model_id,
				vector: None,
				exclude: &[],
				limit: 10,
				offset: 0,
			},
		)
		.await
		.expect("Failed to filter.");

		assert_eq!(ids, expected, "filter {raw}");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
