//! Custom status endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use calapi_core::CustomStatus;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/status/{calendar}",
        get(get_status).put(set_status).delete(clear_status),
    )
}

/// GET /status/{calendar}
async fn get_status(
    State(state): State<AppState>,
    Path(calendar): Path<String>,
) -> Json<CustomStatus> {
    Json(state.service.get_custom_status(&calendar).await)
}

/// PUT /status/{calendar} - Returns the stored status
async fn set_status(
    State(state): State<AppState>,
    Path(calendar): Path<String>,
    Json(status): Json<CustomStatus>,
) -> Json<CustomStatus> {
    Json(state.service.set_custom_status(&calendar, status).await)
}

/// DELETE /status/{calendar}
async fn clear_status(
    State(state): State<AppState>,
    Path(calendar): Path<String>,
) -> Json<CustomStatus> {
    Json(state.service.clear_custom_status(&calendar).await)
}
