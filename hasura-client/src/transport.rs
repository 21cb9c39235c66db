//! Sending GraphQL requests over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use tower::BoxError;
use url::Url;

use crate::configuration::ConfigurationError;
use crate::graphql;

/// Performs one HTTP POST of a GraphQL request and returns the parsed body.
///
/// Implementations must not retry: the client makes exactly one call per
/// operation and surfaces whatever error comes back.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(
        &self,
        endpoint: &Url,
        headers: &HeaderMap,
        request: &graphql::Request,
    ) -> Result<graphql::Response, BoxError>;
}

/// The default [`Transport`], backed by [`reqwest`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ConfigurationError> {
        let http_client = reqwest::Client::builder()
            .tcp_keepalive(Some(Duration::from_secs(5)))
            .build()
            .map_err(|error| ConfigurationError::HttpClient(error.to_string()))?;
        Ok(Self { http_client })
    }

    /// Uses an already configured client, e.g. one with timeouts or a proxy.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        endpoint: &Url,
        headers: &HeaderMap,
        request: &graphql::Request,
    ) -> Result<graphql::Response, BoxError> {
        tracing::trace!("making request to {endpoint}");
        let response = self
            .http_client
            .post(endpoint.clone())
            .headers(headers.clone())
            .body(serde_json::to_vec(request)?)
            .send()
            .await?
            .error_for_status()?;
        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::trace!(%status, len = bytes.len(), "response from {endpoint}");
        Ok(graphql::Response::from_bytes(&bytes)?)
    }
}
