pub mod calendars;
pub mod status;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert errors to HTTP responses
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Request failed");
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(calendars::router())
        .merge(status::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use calapi_core::config::{CalendarSource, StaticConfig};
    use calapi_core::{CalendarService, Rule};
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// A calendar with one event spanning the current instant.
    fn ongoing_calendar(title: &str) -> tempfile::NamedTempFile {
        let now = Utc::now();
        let ics = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n\
BEGIN:VEVENT\r\nUID:{title}\r\nSUMMARY:{title}\r\n\
DTSTART:{}\r\nDTEND:{}\r\n\
X-MICROSOFT-CDO-BUSYSTATUS:BUSY\r\nEND:VEVENT\r\nEND:VCALENDAR",
            (now - Duration::minutes(30)).format("%Y%m%dT%H%M%SZ"),
            (now + Duration::minutes(30)).format("%Y%m%dT%H%M%SZ"),
        );
        let mut file = tempfile::Builder::new().suffix(".ics").tempfile().unwrap();
        file.write_all(ics.as_bytes()).unwrap();
        file
    }

    fn app(sources: &[(&str, &tempfile::NamedTempFile)]) -> Router {
        let calendars = sources
            .iter()
            .map(|(name, file)| CalendarSource::file(*name, file.path().to_string_lossy()))
            .collect();
        let config = StaticConfig::new(calendars, vec![Rule::catch_all()]);
        let service = Arc::new(CalendarService::new(Arc::new(config)));
        router(AppState::new(service))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn calendars_are_filtered_by_name() {
        let a = ongoing_calendar("Standup");
        let b = ongoing_calendar("Interview");
        let app = app(&[("room-a", &a), ("room-b", &b)]);

        let (status, all) = send(&app, Method::GET, "/calendars", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["calendar_name"], "all");
        assert_eq!(all["entries"].as_array().unwrap().len(), 2);

        let (_, star) = send(&app, Method::GET, "/calendars/*", None).await;
        assert_eq!(star["calendar_name"], "all");

        let (_, only_b) = send(&app, Method::GET, "/calendars/room-b", None).await;
        assert_eq!(only_b["calendar_name"], "room-b");
        let entries = only_b["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["title"], "Interview");
        assert_eq!(entries[0]["busy"], "busy");
        assert!(entries[0]["start"].is_i64());
    }

    #[tokio::test]
    async fn current_event_or_null() {
        let a = ongoing_calendar("Standup");
        let app = app(&[("room-a", &a)]);

        let (_, current) = send(&app, Method::GET, "/calendars/room-a/current", None).await;
        assert_eq!(current["title"], "Standup");

        let (_, any) = send(&app, Method::GET, "/current", None).await;
        assert_eq!(any["calendar_name"], "room-a");

        let (status, none) = send(&app, Method::GET, "/calendars/room-z/current", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(none, Value::Null);
    }

    #[tokio::test]
    async fn refresh_returns_last_updated() {
        let a = ongoing_calendar("Standup");
        let app = app(&[("room-a", &a)]);

        let (status, body) = send(&app, Method::POST, "/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["last_updated"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn status_set_get_clear() {
        let app = app(&[]);

        let (_, empty) = send(&app, Method::GET, "/status/room-a", None).await;
        assert_eq!(empty["title"], "");
        assert_eq!(empty["icon_size"], 0);

        let dnd = json!({
            "title": "Do not disturb",
            "description": "Recording",
            "icon": "warning_icon",
            "icon_size": 196
        });
        let (status, stored) = send(&app, Method::PUT, "/status/room-a", Some(dnd.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored, dnd);

        let (_, fetched) = send(&app, Method::GET, "/status/room-a", None).await;
        assert_eq!(fetched, dnd);

        let (_, cleared) = send(&app, Method::DELETE, "/status/room-a", None).await;
        assert_eq!(cleared["title"], "");

        let (_, after) = send(&app, Method::GET, "/status/room-a", None).await;
        assert_eq!(after, cleared);
    }

    #[test]
    fn app_error_is_a_json_500() {
        let response = AppError::from(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
