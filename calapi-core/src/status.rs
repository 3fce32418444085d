//! Per-calendar custom status messages.
//!
//! Kept apart from the event cache so that setting a status never waits on a
//! refresh.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::info;

use crate::event::CustomStatus;

#[derive(Debug, Default)]
pub struct CustomStatusStore {
    statuses: RwLock<HashMap<String, CustomStatus>>,
}

impl CustomStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status of `calendar`; the zero value if none was ever set.
    pub async fn get(&self, calendar: &str) -> CustomStatus {
        self.statuses
            .read()
            .await
            .get(calendar)
            .cloned()
            .unwrap_or_default()
    }

    /// Store `status` for `calendar` and return what is now stored.
    pub async fn set(&self, calendar: &str, status: CustomStatus) -> CustomStatus {
        info!(calendar, title = %status.title, "Setting custom status");
        let mut statuses = self.statuses.write().await;
        statuses.insert(calendar.to_string(), status);
        statuses.get(calendar).cloned().unwrap_or_default()
    }

    /// Reset `calendar` to the zero value and return it.
    pub async fn clear(&self, calendar: &str) -> CustomStatus {
        info!(calendar, "Clearing custom status");
        let mut statuses = self.statuses.write().await;
        statuses.insert(calendar.to_string(), CustomStatus::default());
        statuses.get(calendar).cloned().unwrap_or_default()
    }
}
