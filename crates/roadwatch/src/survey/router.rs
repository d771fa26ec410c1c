use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::pipeline::IngestError;
use super::repository::{AlertFilter, AlertId, RepositoryError, SegmentFilter, SegmentId, SurveyRepository};
use super::service::{SurveyService, SurveyServiceError};
use super::upload::UploadError;

/// Router builder exposing the survey ingestion and dashboard endpoints.
pub fn survey_router<R>(service: Arc<SurveyService<R>>) -> Router
where
    R: SurveyRepository + 'static,
{
    Router::new()
        .route("/api/v1/highways", get(highways_handler::<R>))
        .route("/api/v1/segments", get(segments_handler::<R>))
        .route("/api/v1/segments/:segment_id", get(segment_handler::<R>))
        .route("/api/v1/alerts", get(alerts_handler::<R>))
        .route(
            "/api/v1/alerts/:alert_id/resolve",
            post(resolve_alert_handler::<R>),
        )
        .route("/api/v1/stats", get(stats_handler::<R>))
        .route("/api/v1/search", get(search_handler::<R>))
        .route("/api/v1/surveys", post(upload_handler::<R>))
        .route("/api/v1/surveys/inspect", post(inspect_handler::<R>))
        .with_state(service)
}

/// Upload payload: the materialized table travels as delimited text; the
/// file name is what the extension gate judges.
#[derive(Debug, Deserialize)]
pub struct SurveyUploadRequest {
    pub file_name: String,
    pub content: String,
    #[serde(default)]
    pub survey_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SurveyInspectRequest {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

fn error_response(error: SurveyServiceError) -> Response {
    let status = match &error {
        SurveyServiceError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        SurveyServiceError::Upload(UploadError::UnsupportedExtension { .. }) => {
            StatusCode::BAD_REQUEST
        }
        SurveyServiceError::Ingest(IngestError::NoValidData) => StatusCode::UNPROCESSABLE_ENTITY,
        SurveyServiceError::Ingest(IngestError::Table(_)) | SurveyServiceError::Table(_) => {
            StatusCode::BAD_REQUEST
        }
        SurveyServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SurveyServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(result: Result<T, SurveyServiceError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn highways_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
) -> Response {
    respond(service.highways())
}

async fn segments_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
    Query(filter): Query<SegmentFilter>,
) -> Response {
    respond(service.segments(&filter))
}

async fn segment_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(segment_id): Path<i64>,
) -> Response {
    respond(service.segment(SegmentId(segment_id)))
}

async fn alerts_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
    Query(filter): Query<AlertFilter>,
) -> Response {
    respond(service.alerts(&filter))
}

async fn resolve_alert_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(alert_id): Path<i64>,
) -> Response {
    respond(service.resolve_alert(AlertId(alert_id)))
}

async fn stats_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
) -> Response {
    respond(service.stats())
}

async fn search_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    respond(service.search_segments(&query.q))
}

async fn upload_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
    Json(request): Json<SurveyUploadRequest>,
) -> Response {
    let survey_date = request
        .survey_date
        .unwrap_or_else(|| Local::now().date_naive());
    respond(service.upload(&request.file_name, request.content.as_bytes(), survey_date))
}

async fn inspect_handler<R: SurveyRepository>(
    State(service): State<Arc<SurveyService<R>>>,
    Json(request): Json<SurveyInspectRequest>,
) -> Response {
    respond(service.inspect(&request.file_name, request.content.as_bytes()))
}
