//! HTTP client for the persistence endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::toasts::{Toast, ToastCollection};
use crate::infra::http::models::{ErrorBody, SaveResponse};

/// Client-side failure taxonomy. `Server` carries an error the server
/// reported in a well-formed response; every other variant means the request
/// never completed usefully.
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Network(reqwest::Error),
    #[error("{0}")]
    Server(String),
    #[error("failed to parse response body: {0}")]
    Decode(serde_json::Error),
}

impl ApiClientError {
    /// Whether the server answered at all (as opposed to a transport failure).
    pub fn is_server_reported(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

#[async_trait]
pub trait ToastApi: Send + Sync {
    async fn load(&self) -> Result<ToastCollection, ApiClientError>;
    async fn save(&self, toasts: &[Toast]) -> Result<SaveResponse, ApiClientError>;
}

pub struct HttpToastApi {
    client: Client,
    base: Url,
}

impl HttpToastApi {
    pub fn new(site: &str) -> Result<Self, ApiClientError> {
        let base = Url::parse(site)?.join("/")?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(ApiClientError::Network)?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("toastdeck/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, ApiClientError> {
        self.base.join(path).map_err(ApiClientError::Url)
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, ApiClientError> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(ApiClientError::Network)?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("status {status}"));
            return Err(ApiClientError::Server(message));
        }
        serde_json::from_slice(&bytes).map_err(ApiClientError::Decode)
    }
}

#[async_trait]
impl ToastApi for HttpToastApi {
    async fn load(&self) -> Result<ToastCollection, ApiClientError> {
        let resp = self
            .client
            .get(self.url("api/load")?)
            .send()
            .await
            .map_err(ApiClientError::Network)?;
        Self::handle(resp).await
    }

    async fn save(&self, toasts: &[Toast]) -> Result<SaveResponse, ApiClientError> {
        let body = serde_json::json!({ "toasts": toasts });
        let resp = self
            .client
            .post(self.url("api/save")?)
            .json(&body)
            .send()
            .await
            .map_err(ApiClientError::Network)?;
        Self::handle(resp).await
    }
}
