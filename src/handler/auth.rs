//! Registration, login and profile

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::{hash_password, issue_token, verify_password, MIN_PASSWORD_LEN};
use crate::database::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::model::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, User, UserProfile};
use crate::store::users;

fn token_for(state: &AppState, user: &User) -> AppResult<String> {
    Ok(issue_token(
        &user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_days,
    )?)
}

/// `POST /api/auth/register`
///
/// - **201 Created** with a token and the new profile
/// - **400 Bad Request** on missing fields, a short password or a taken email
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.email.trim().is_empty() || payload.name.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest("Email, password and name are required".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = users::create_user(&state.db, &payload.email, password_hash, &payload.name)?;
    let token = token_for(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user: UserProfile::from_user(&user),
        }),
    ))
}

/// `POST /api/auth/login`
///
/// Unknown emails and wrong passwords both answer 400 "Invalid credentials".
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::BadRequest("Invalid credentials".into());

    let user = users::find_by_email(&state.db, &payload.email)?.ok_or_else(invalid)?;
    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "password mismatch");
        return Err(invalid());
    }

    let token = token_for(&state, &user)?;
    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserProfile::from_user(&user),
    }))
}

/// `GET /api/auth/profile`
pub async fn profile(auth: AuthUser) -> impl IntoResponse {
    Json(json!({ "user": UserProfile::with_usage(&auth.user) }))
}

/// `PUT /api/auth/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    let user = users::update_profile(&state.db, auth.id(), payload)?;
    tracing::info!(user_id = %user.id, "profile updated");

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserProfile::from_user(&user),
    })))
}
