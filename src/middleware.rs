//! Bearer-token authentication
//!
//! [`authenticate`] runs in front of every `/api` route. It resolves the
//! `Authorization: Bearer <jwt>` header to a stored user and records the
//! outcome in the request extensions without rejecting anything. Handlers
//! then pick their policy through an extractor:
//!
//! - [`AuthUser`] rejects the request with 401 when no valid user was found
//! - [`MaybeUser`] never rejects and yields `None` for anonymous callers

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::validate_token;
use crate::database::AppState;
use crate::error::AppError;
use crate::model::User;
use crate::store::users;

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

/// The caller if a valid token was presented
#[derive(Debug, Clone, Default)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(AuthUser::id)
    }
}

/// Why a request carries no user
#[derive(Debug, Clone, Copy)]
struct Unauthenticated(&'static str);

const MISSING_TOKEN: &str = "No token, authorization denied";
const INVALID_TOKEN: &str = "Token is not valid";

/// Resolves the bearer token of a request
///
/// `Ok(Err(reason))` means the caller is anonymous; `Err` is reserved for
/// storage failures.
fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Result<AuthUser, &'static str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(Err(MISSING_TOKEN));
    };
    let Some(token) = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Ok(Err(MISSING_TOKEN));
    };

    let claims = match validate_token(token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(error = %err, "rejected bearer token");
            return Ok(Err(INVALID_TOKEN));
        }
    };

    Ok(users::get_user(&state.db, &claims.sub)?
        .map(|user| AuthUser { user })
        .ok_or(INVALID_TOKEN))
}

/// Middleware that attaches the caller's identity to the request
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match resolve(&state, request.headers())? {
        Ok(user) => {
            request.extensions_mut().insert(MaybeUser(Some(user)));
        }
        Err(reason) => {
            request.extensions_mut().insert(MaybeUser(None));
            request.extensions_mut().insert(Unauthenticated(reason));
        }
    }
    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(MaybeUser(Some(user))) = parts.extensions.get::<MaybeUser>() {
            return Ok(user.clone());
        }
        let reason = parts
            .extensions
            .get::<Unauthenticated>()
            .map_or(MISSING_TOKEN, |u| u.0);
        Err(AppError::Unauthorized(reason.to_string()))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<MaybeUser>().cloned().unwrap_or_default())
    }
}
