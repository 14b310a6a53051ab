use atelier_domain::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ModelRow {
	pub model_id: i32,
	pub model_name: String,
	pub dimension: i32,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Artist {
	pub creator_id: String,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub birth_and_death_description: Option<String>,
	pub nationality: Option<String>,
	pub birth_date: Option<i32>,
	pub death_date: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct Artwork {
	pub record_id: RecordId,
	pub creator_id: Option<String>,
	pub work_id: Option<String>,
	pub language: Option<String>,
	pub title: Option<String>,
	pub object_work_type: Option<Vec<String>>,
	pub term_classification: Option<String>,
	pub materials: Option<Vec<String>>,
	pub signature_full_description: Option<String>,
	pub creation_full_description: Option<String>,
	pub creation_earliest_date: Option<i32>,
	pub creation_latest_date: Option<i32>,
	pub creator_full_description: Option<String>,
	pub physical_appearance_description: Option<String>,
	pub image_type: Option<String>,
	pub image_color: Option<String>,
	pub image_copyright: Option<String>,
	pub styles_periods: Option<Vec<String>>,
	pub iconographic_terms: Option<Vec<String>>,
	pub height: Option<f64>,
	pub width: Option<f64>,
	pub ratio: Option<f64>,
}

/// A record id and its store distance (negative inner product) to a probe vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
	pub record_id: RecordId,
	pub distance: f32,
}
