//! Generic per-app data records

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::database::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::{AuthUser, MaybeUser};
use crate::model::{
    CreateRecordRequest, ListRecordsParams, RecordListResponse, RecordResponse,
    UpdateRecordRequest,
};
use crate::store::records;

/// `POST /api/data/{app_id}`
///
/// - **201 Created** with the stored record
/// - **400 Bad Request** when the collection is empty
/// - **404 Not Found** when the caller does not own the app
pub async fn create_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(app_id): Path<String>,
    Json(payload): Json<CreateRecordRequest>,
) -> AppResult<impl IntoResponse> {
    let collection = payload.collection.trim();
    if collection.is_empty() {
        return Err(AppError::BadRequest("Collection is required".into()));
    }

    let record = records::create_record(&state.db, &app_id, &auth.user, collection, payload.data)?;
    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            message: "Data created successfully".to_string(),
            data: record,
        }),
    ))
}

/// `GET /api/data/{app_id}?collection=&page=&limit=`
///
/// Newest first. Public apps are readable by anyone, private ones only by
/// their owner (403 otherwise).
pub async fn list_records(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(app_id): Path<String>,
    Query(params): Query<ListRecordsParams>,
) -> AppResult<Json<RecordListResponse>> {
    let (data, pagination) = records::list_records(&state.db, &app_id, viewer.id(), &params)?;
    Ok(Json(RecordListResponse { data, pagination }))
}

/// `PUT /api/data/{app_id}/{record_id}`
pub async fn update_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((app_id, record_id)): Path<(String, String)>,
    Json(payload): Json<UpdateRecordRequest>,
) -> AppResult<Json<RecordResponse>> {
    let record = records::update_record(&state.db, &app_id, &record_id, &auth.user, payload.data)?;
    Ok(Json(RecordResponse {
        message: "Data updated successfully".to_string(),
        data: record,
    }))
}

/// `DELETE /api/data/{app_id}/{record_id}`
pub async fn delete_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((app_id, record_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    records::delete_record(&state.db, &app_id, &record_id, &auth.user)?;
    Ok(Json(json!({ "message": "Data deleted successfully" })))
}
