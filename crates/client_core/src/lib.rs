use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{CustomerStats, CustomerSummary, Page},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub mod filters;
pub mod loader;
pub mod pagination;

pub use filters::{
    reduce, FilterAction, FilterState, OrderingKey, QuickFilter, SortDirection, TextFilter,
};
pub use loader::{DashboardLoader, LoadError, LoadErrorSource, LoadState};

const CUSTOMERS_PATH: &str = "customers/";
const CUSTOMER_STATS_PATH: &str = "customers/stats/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    InvalidUrl,
    Transport,
    Status,
    Decode,
}

/// Any failure to obtain a usable response from the CRM API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error(
        "server responded with status {status}: {}",
        .body.as_ref().map_or("no details", |body| body.message.as_str())
    )]
    Status { status: u16, body: Option<ApiError> },
    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidUrl(_) => FetchErrorKind::InvalidUrl,
            FetchError::Transport(_) => FetchErrorKind::Transport,
            FetchError::Status { .. } => FetchErrorKind::Status,
            FetchError::Decode(_) => FetchErrorKind::Decode,
        }
    }
}

/// Read side of the CRM API used by the dashboard.
#[async_trait]
pub trait CustomerApi: Send + Sync + 'static {
    async fn fetch_customers(
        &self,
        filters: &FilterState,
    ) -> Result<Page<CustomerSummary>, FetchError>;
    async fn fetch_stats(&self) -> Result<CustomerStats, FetchError>;
}

#[async_trait]
impl<T> CustomerApi for Arc<T>
where
    T: CustomerApi,
{
    async fn fetch_customers(
        &self,
        filters: &FilterState,
    ) -> Result<Page<CustomerSummary>, FetchError> {
        self.as_ref().fetch_customers(filters).await
    }

    async fn fetch_stats(&self) -> Result<CustomerStats, FetchError> {
        self.as_ref().fetch_stats().await
    }
}

pub struct CrmClient {
    http: Client,
    base_url: Url,
}

impl CrmClient {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_http(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Transport)?;
        Self::with_http(base_url, http)
    }

    fn with_http(base_url: &str, http: Client) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        debug!(%url, params = query.len(), "api: GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .and_then(|raw| serde_json::from_str::<ApiError>(&raw).ok())
                .map(|mut body| {
                    if body.code == ErrorCode::Unknown {
                        body.code = ErrorCode::from_status(status.as_u16());
                    }
                    body
                });
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(FetchError::Decode)
    }
}

#[async_trait]
impl CustomerApi for CrmClient {
    async fn fetch_customers(
        &self,
        filters: &FilterState,
    ) -> Result<Page<CustomerSummary>, FetchError> {
        let url = self.endpoint(CUSTOMERS_PATH)?;
        self.get_json(url, &filters.to_query()).await
    }

    async fn fetch_stats(&self) -> Result<CustomerStats, FetchError> {
        let url = self.endpoint(CUSTOMER_STATS_PATH)?;
        self.get_json(url, &[]).await
    }
}

/// Relative endpoint paths are joined onto the base, so it must end in `/`.
fn normalize_base_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
