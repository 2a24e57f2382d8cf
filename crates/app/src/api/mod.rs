//! Backend API client.

use std::future::Future;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use till::resource::Resource;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub mod catalog;
pub mod orders;
pub mod refunds;

pub use catalog::{CatalogService, HttpCatalogService, MockCatalogService};
pub use orders::{HttpOrdersService, MockOrdersService, OrderRange, OrdersService};
pub use refunds::{HttpRefundsService, MockRefundsService, RefundsService};

/// Errors that can occur talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API token is configured, so the request was never sent.
    #[error("no API token configured; set TILL_API_TOKEN")]
    Unauthenticated,

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// Response status
        status: StatusCode,

        /// Error message from the response body
        message: String,
    },

    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

/// Configuration for connecting to the backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `"http://localhost:5000"`.
    pub base_url: String,

    /// Bearer token sent with every request.
    pub token: Option<String>,
}

/// JSON client for the backend REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config: ApiConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                token: config.token,
            },
            http: Client::new(),
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path)?).await
    }

    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path)?.query(query))
            .await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self
            .config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        let url = format!("{}{path}", self.config.base_url);

        debug!(%method, %url, "sending backend request");

        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            debug!(%status, "backend request failed");

            return Err(ApiError::Status {
                status,
                message: error_message(&text, status),
            });
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Picks a readable message out of an error response body.
fn error_message(body: &str, status: StatusCode) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message.or(body.error));

    match parsed {
        Some(message) => message,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        None => body.trim().to_string(),
    }
}

/// Runs a backend call unless `cancel` fires first.
///
/// # Errors
///
/// Returns [`ApiError::Cancelled`] if the token is cancelled before the call finishes, otherwise
/// whatever the call returns.
pub async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(ApiError::Cancelled),
        result = call => result,
    }
}

/// Records a backend result on `slot`, restoring `previous` if the call was cancelled.
pub(crate) fn settle<T>(
    slot: &mut Resource<T>,
    previous: Resource<T>,
    result: Result<T, ApiError>,
) -> Result<(), ApiError> {
    match result {
        Ok(value) => {
            *slot = Resource::Loaded(value);
            Ok(())
        }
        Err(ApiError::Cancelled) => {
            *slot = previous;
            Err(ApiError::Cancelled)
        }
        Err(error) => {
            *slot = Resource::Failed(error.to_string());
            Err(error)
        }
    }
}
