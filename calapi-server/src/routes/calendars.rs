//! Snapshot, current-event and refresh endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use calapi_core::{
    CalendarFilter, CalendarResponse, Event, FORCE_REFRESH_TIMEOUT, RefreshResponse,
};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calendars", get(all_calendars))
        .route("/calendars/{name}", get(calendar))
        .route("/current", get(current_all))
        .route("/calendars/{name}/current", get(current))
        .route("/refresh", post(refresh))
}

/// GET /calendars - Today's events across all calendars
async fn all_calendars(State(state): State<AppState>) -> Json<CalendarResponse> {
    Json(state.service.get_snapshot(&CalendarFilter::All).await)
}

/// GET /calendars/{name} - Today's events of one calendar ("*" and "all" mean every calendar)
async fn calendar(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<CalendarResponse> {
    Json(state.service.get_snapshot(&CalendarFilter::parse(&name)).await)
}

/// GET /current - The event happening now in any calendar
async fn current_all(State(state): State<AppState>) -> Json<Option<Event>> {
    Json(state.service.get_current_event(&CalendarFilter::All).await)
}

/// GET /calendars/{name}/current
async fn current(State(state): State<AppState>, Path(name): Path<String>) -> Json<Option<Event>> {
    Json(
        state
            .service
            .get_current_event(&CalendarFilter::parse(&name))
            .await,
    )
}

/// POST /refresh - Refresh all sources now
async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let refreshed = state.service.force_refresh(FORCE_REFRESH_TIMEOUT).await?;
    Ok(Json(refreshed))
}
