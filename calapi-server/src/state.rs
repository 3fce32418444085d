use std::sync::Arc;

use calapi_core::CalendarService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CalendarService>,
}

impl AppState {
    pub fn new(service: Arc<CalendarService>) -> Self {
        AppState { service }
    }
}
