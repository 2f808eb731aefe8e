use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;
use watchpost_domain::WatchpostError;

use crate::errors::InfraError;

/// Thin HTTP client wrapper with timeout and status checking.
///
/// Every collector call treats a non-2xx response as a hard failure of the
/// enclosing operation; retry and backoff are deliberately left to callers
/// outside this engine.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, WatchpostError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request and return the response without inspecting the
    /// status code.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, WatchpostError> {
        let request = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            WatchpostError::from(infra)
        })?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            let infra: InfraError = err.into();
            WatchpostError::from(infra)
        })?;

        debug!(%method, %url, status = %response.status(), "received HTTP response");
        Ok(response)
    }

    /// Execute the request and fail unless the response status is a success.
    ///
    /// 401/403 surface as authentication errors; any other non-2xx status is
    /// a network failure of the enclosing operation.
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response, WatchpostError> {
        let response = self.send(builder).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let detail = if body.is_empty() { String::new() } else { format!(": {body}") };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(WatchpostError::Auth(format!("{url} returned {status}{detail}")))
        } else {
            Err(WatchpostError::Network(format!("{url} returned {status}{detail}")))
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: None }
    }
}

impl HttpClientBuilder {
    /// Total timeout applied to every request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// User agent sent with every request.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the configured client.
    pub fn build(self) -> Result<HttpClient, WatchpostError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            WatchpostError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn send_checked_passes_through_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let builder = client.request(Method::GET, format!("{}/ok", server.uri()));

        assert!(client.send_checked(builder).await.is_ok());
    }

    #[tokio::test]
    async fn send_checked_maps_unauthorized_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let builder = client.request(Method::GET, format!("{}/denied", server.uri()));

        let err = client.send_checked(builder).await.unwrap_err();
        assert!(matches!(err, WatchpostError::Auth(_)));
    }

    #[tokio::test]
    async fn send_checked_maps_server_error_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boom"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let builder = client.request(Method::GET, format!("{}/boom", server.uri()));

        let err = client.send_checked(builder).await.unwrap_err();
        assert!(matches!(err, WatchpostError::Network(_)));
    }
}
