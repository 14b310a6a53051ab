use axum::{
	Json, Router,
	extract::{Path, Query, State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use atelier_domain::{RecordId, columns::ColumnDescriptor};
use atelier_service::{
	AugmentRequest, AugmentResponse, ConceptsRequest, ConceptsResponse, Error as ServiceError,
	PathFromTermsRequest,
	PathFromTermsResponse, QueryRequest, QueryResponse, SettingsInfo, SimilarRequest,
	SimilarResponse, SortRequest, SortResponse,
};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SimilarParams {
	page: Option<i64>,
	page_size: Option<i64>,
	#[serde(default)]
	keep_original_record: bool,
	model_name: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &str, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.to_string(), message: message.into(), fields: None }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::InvalidFilter { path, .. } => Self {
				fields: Some(vec![path]),
				..Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
			},
			ServiceError::DegenerateQuery { .. } =>
				Self::new(StatusCode::UNPROCESSABLE_ENTITY, "DEGENERATE_QUERY", message),
			ServiceError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::Storage { .. } => {
				tracing::error!(error = %message, "Storage failure while serving a request.");

				Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_ERROR", message)
			},
			ServiceError::Provider { .. } => {
				tracing::error!(error = %message, "Embedding provider failure while serving a request.");

				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message)
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/settings", get(settings))
		.route("/v1/columns", get(columns))
		.route("/v1/concepts", get(concepts))
		.route("/v1/query", post(query))
		.route("/v1/artworks/{record_id}/similar", get(similar))
		.route("/v1/collections/augment", post(augment))
		.route("/v1/collections/sort_by_similarity", post(sort_by_similarity))
		.route("/v1/collections/path_from_two_terms", post(path_from_two_terms))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn settings(State(state): State<AppState>) -> Json<SettingsInfo> {
	Json(state.service.settings_info())
}

async fn columns(State(state): State<AppState>) -> Json<&'static [ColumnDescriptor]> {
	Json(state.service.columns())
}

async fn concepts(
	State(state): State<AppState>,
	Query(req): Query<ConceptsRequest>,
) -> Result<Json<ConceptsResponse>, ApiError> {
	Ok(Json(state.service.concepts(req).await?))
}

async fn query(
	State(state): State<AppState>,
	payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
	let Json(req) = payload?;

	Ok(Json(state.service.query(req).await?))
}

async fn similar(
	State(state): State<AppState>,
	Path(record_id): Path<RecordId>,
	Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarResponse>, ApiError> {
	let req = SimilarRequest {
		record_id,
		page: params.page,
		page_size: params.page_size,
		keep_original_record: params.keep_original_record,
		model_name: params.model_name,
	};

	Ok(Json(state.service.similar(req).await?))
}

async fn augment(
	State(state): State<AppState>,
	payload: Result<Json<AugmentRequest>, JsonRejection>,
) -> Result<Json<AugmentResponse>, ApiError> {
	let Json(req) = payload?;

	Ok(Json(state.service.augment(req).await?))
}

async fn sort_by_similarity(
	State(state): State<AppState>,
	payload: Result<Json<SortRequest>, JsonRejection>,
) -> Result<Json<SortResponse>, ApiError> {
	let Json(req) = payload?;

	Ok(Json(state.service.sort_by_similarity(req).await?))
}

async fn path_from_two_terms(
	State(state): State<AppState>,
	payload: Result<Json<PathFromTermsRequest>, JsonRejection>,
) -> Result<Json<PathFromTermsResponse>, ApiError> {
	let Json(req) = payload?;

	Ok(Json(state.service.path_from_two_terms(req).await?))
}
