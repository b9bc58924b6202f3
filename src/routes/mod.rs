use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::UserStore,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{MovieCatalog, WatchImporter},
};

pub mod users;

/// Shared handles used by the handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub importer: Arc<dyn WatchImporter>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        catalog: Arc<dyn MovieCatalog>,
        importer: Arc<dyn WatchImporter>,
    ) -> Self {
        Self {
            store,
            catalog,
            importer,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/users", user_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Routes under /users
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(users::create_user))
        .route(
            "/:user_id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/:user_id/movie",
            post(users::add_watched).delete(users::remove_watched),
        )
        .route("/:user_id/watched", get(users::get_watched))
        .route("/:user_id/watched/letterboxd", put(users::import_watched))
        .route("/:user_id/statistics", get(users::get_statistics))
        .route("/:user_id/movies/:movie_id/rating", get(users::get_movie_rating))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
