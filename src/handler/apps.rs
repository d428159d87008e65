//! App CRUD, publishing and public access

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::database::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::{AuthUser, MaybeUser};
use crate::model::{
    AppListResponse, AppResponse, CreateAppRequest, PublicAppResponse, PublicOwner,
    UpdateAppRequest, VisibilityRequest,
};
use crate::store::{apps, users};

/// `GET /api/apps`
///
/// The caller's apps, most recently updated first. Component `data` is
/// stripped from every layout.
pub async fn list_apps(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<AppListResponse>> {
    let apps = apps::list_apps(&state.db, auth.id())?;
    Ok(Json(AppListResponse { apps }))
}

/// `POST /api/apps`
///
/// - **201 Created** with the stored app (version 1, fresh slug)
/// - **400 Bad Request** when the name is empty
pub async fn create_app(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAppRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("App name is required".into()));
    }

    let app = apps::create_app(&state.db, auth.id(), payload)?;
    Ok((
        StatusCode::CREATED,
        Json(AppResponse {
            message: Some("App created successfully".to_string()),
            app,
        }),
    ))
}

/// `GET /api/apps/{id}`
pub async fn get_app(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse>> {
    let app = apps::get_owned_app(&state.db, &id, auth.id())?;
    Ok(Json(AppResponse { message: None, app }))
}

/// `PUT /api/apps/{id}`
///
/// Overwrites the fields present in the body (the layout as a whole) and
/// bumps the version.
///
/// - **404 Not Found** when the app does not exist or belongs to someone else
/// - **409 Conflict** when `expectedVersion` is given and stale
pub async fn update_app(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAppRequest>,
) -> AppResult<Json<AppResponse>> {
    let components = payload.layout.as_ref().map(apps::component_count);
    let app = apps::update_app(&state.db, &id, auth.id(), payload)?;
    if let Some(components) = components {
        tracing::debug!(app_id = %app.id, components, "layout saved");
    }

    Ok(Json(AppResponse {
        message: Some("App updated successfully".to_string()),
        app,
    }))
}

/// `DELETE /api/apps/{id}`
///
/// Also removes every data record of the app.
pub async fn delete_app(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    apps::delete_app(&state.db, &id, auth.id())?;
    Ok(Json(json!({ "message": "App deleted successfully" })))
}

/// `PATCH /api/apps/{id}/visibility`
pub async fn set_visibility(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<VisibilityRequest>,
) -> AppResult<Json<AppResponse>> {
    let app = apps::set_visibility(&state.db, &id, auth.id(), payload.is_public)?;
    let verb = if app.is_public { "published" } else { "unpublished" };

    Ok(Json(AppResponse {
        message: Some(format!("App {verb} successfully")),
        app,
    }))
}

/// `GET /api/apps/{slug}/public`
///
/// Served to anyone; counts a view on every hit.
pub async fn public_app(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
) -> AppResult<Json<PublicAppResponse>> {
    let app = apps::view_public_app(&state.db, &slug)?
        .ok_or_else(|| AppError::NotFound("App not found or not public".into()))?;
    tracing::debug!(app_id = %app.id, viewer = ?viewer.id(), "public app viewed");

    let owner = users::get_user(&state.db, &app.owner_id)?.map(|user| PublicOwner {
        name: user.name,
        workspace: user.workspace,
    });
    Ok(Json(PublicAppResponse { app, owner }))
}
