use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{
        AddWatchedRequest, CreateUserRequest, ImportWatchedRequest, RemoveWatchedRequest,
        StatisticsReport, User, UserUpdate,
    },
    routes::AppState,
    services::users,
};

/// Body used by every mutating endpoint
fn status_message(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "status-code": status.as_u16(),
            "message": message,
        })),
    )
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    state
        .store
        .get_user(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user_id = request.user_id.clone();
    users::create_user(state.store.as_ref(), request).await?;

    tracing::info!(request_id = %request_id, user_id = %user_id, "User created");

    Ok(status_message(StatusCode::CREATED, "User added successfully"))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if !state.store.update_user(&user_id, update).await? {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }
    Ok(status_message(StatusCode::OK, "User updated successfully"))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if !state.store.delete_user(&user_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    tracing::info!(request_id = %request_id, user_id = %user_id, "User deleted");

    Ok(status_message(StatusCode::OK, "User deleted successfully"))
}

pub async fn add_watched(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AddWatchedRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    users::add_watched(
        state.store.as_ref(),
        &user_id,
        &request.movie_id,
        request.rating,
    )
    .await?;
    Ok(status_message(StatusCode::OK, "Movie added successfully"))
}

pub async fn remove_watched(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<RemoveWatchedRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    users::remove_watched(state.store.as_ref(), &user_id, &request.movie_id).await?;
    Ok(status_message(StatusCode::OK, "Movie removed successfully"))
}

pub async fn get_watched(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Value>> {
    let watched = users::watched(state.store.as_ref(), &user_id).await?;
    Ok(Json(json!({ "watched": watched })))
}

/// Rating the user gave a movie, `null` for unknown users or movies
pub async fn get_movie_rating(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(String, String)>,
) -> AppResult<Json<Option<f64>>> {
    let rating = state
        .store
        .get_user(&user_id)
        .await?
        .and_then(|user| user.rating_for(&movie_id));
    Ok(Json(rating))
}

/// Viewing statistics for one user
pub async fn get_statistics(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> AppResult<Json<StatisticsReport>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        "Processing statistics request"
    );

    let report =
        users::user_statistics(state.store.as_ref(), state.catalog.as_ref(), &user_id).await?;

    Ok(Json(report))
}

pub async fn import_watched(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Json(request): Json<ImportWatchedRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        "Importing external watch history"
    );

    let imported = users::import_watched(
        state.store.as_ref(),
        state.importer.as_ref(),
        &user_id,
        &request.letterboxd,
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status-code": 200,
            "message": "Movies added successfully",
            "imported": imported,
        })),
    ))
}
