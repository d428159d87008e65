//! Route definitions for the app builder API
//!
//! Every route lives under `/api` and passes through the
//! [`authenticate`] middleware; whether a route requires a user is decided
//! by the extractor its handler takes.

use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::database::AppState;
use crate::handler::{ai, apps, auth, data};
use crate::middleware::authenticate;

/// Creates the application router
///
/// # Route Definitions
///
/// | Method | Path | Auth |
/// |---|---|---|
/// | `POST` | `/api/auth/register` | - |
/// | `POST` | `/api/auth/login` | - |
/// | `GET`, `PUT` | `/api/auth/profile` | required |
/// | `GET`, `POST` | `/api/apps` | required |
/// | `GET`, `PUT`, `DELETE` | `/api/apps/{id}` | required |
/// | `PATCH` | `/api/apps/{id}/visibility` | required |
/// | `GET` | `/api/apps/{slug}/public` | optional |
/// | `POST` | `/api/data/{app_id}` | required |
/// | `GET` | `/api/data/{app_id}` | optional |
/// | `PUT`, `DELETE` | `/api/data/{app_id}/{record_id}` | required |
/// | `POST` | `/api/ai/suggest-widgets` | required |
/// | `POST` | `/api/ai/generate-template` | required |
/// | `POST` | `/api/ai/optimize-layout` | required |
///
/// # Example Usage
///
/// ```no_run
/// # use appbuilder::ai::AiService;
/// # use appbuilder::config::Config;
/// # use appbuilder::database::{init_db, AppState};
/// # use appbuilder::route::create_app;
/// # let db = init_db("appbuilder.db").unwrap();
/// let state = AppState::new(db, Config::default(), AiService::catalog());
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile).put(auth::update_profile))
        .route("/apps", get(apps::list_apps).post(apps::create_app))
        .route(
            "/apps/{id}",
            get(apps::get_app).put(apps::update_app).delete(apps::delete_app),
        )
        .route("/apps/{id}/visibility", patch(apps::set_visibility))
        .route("/apps/{id}/public", get(apps::public_app))
        .route("/data/{app_id}", get(data::list_records).post(data::create_record))
        .route(
            "/data/{app_id}/{record_id}",
            put(data::update_record).delete(data::delete_record),
        )
        .route("/ai/suggest-widgets", post(ai::suggest_widgets))
        .route("/ai/generate-template", post(ai::generate_template))
        .route("/ai/optimize-layout", post(ai::optimize_layout))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new().nest("/api", api_routes).with_state(state)
}
