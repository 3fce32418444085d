//! HTTP client for the calapi-server API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use calapi_core::{CalendarResponse, CustomStatus, Event, RefreshResponse};

/// Timeout for read requests
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Timeout for a forced refresh, which fetches every source
pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).with_context(|| format!("Invalid server URL: {}", base))?;
        Ok(ApiClient {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub async fn calendar(&self, name: Option<&str>) -> Result<CalendarResponse> {
        match name {
            Some(name) => self.call(Method::GET, &["calendars", name], None::<&()>, READ_TIMEOUT).await,
            None => self.call(Method::GET, &["calendars"], None::<&()>, READ_TIMEOUT).await,
        }
    }

    pub async fn current(&self, name: Option<&str>) -> Result<Option<Event>> {
        match name {
            Some(name) => {
                self.call(Method::GET, &["calendars", name, "current"], None::<&()>, READ_TIMEOUT)
                    .await
            }
            None => self.call(Method::GET, &["current"], None::<&()>, READ_TIMEOUT).await,
        }
    }

    pub async fn refresh(&self) -> Result<RefreshResponse> {
        self.call(Method::POST, &["refresh"], None::<&()>, REFRESH_TIMEOUT)
            .await
    }

    pub async fn status(&self, calendar: &str) -> Result<CustomStatus> {
        self.call(Method::GET, &["status", calendar], None::<&()>, READ_TIMEOUT)
            .await
    }

    pub async fn set_status(&self, calendar: &str, status: &CustomStatus) -> Result<CustomStatus> {
        self.call(Method::PUT, &["status", calendar], Some(status), READ_TIMEOUT)
            .await
    }

    pub async fn clear_status(&self, calendar: &str) -> Result<CustomStatus> {
        self.call(Method::DELETE, &["status", calendar], None::<&()>, READ_TIMEOUT)
            .await
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Server URL cannot be a base: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        let mut request = self.http.request(method, url.clone()).timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to talk to calapi-server ({})", url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or(text);
            anyhow::bail!("Server returned {}: {}", status, message);
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid response from {}", url))
    }
}
