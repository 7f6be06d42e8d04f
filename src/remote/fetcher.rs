use futures::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::model::Article;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching articles from the backend.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, transport timeout, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body was not the expected `{ "articles": [...] }` JSON
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The configured base URL cannot be turned into an endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Option<Vec<Article>>,
}

/// HTTP client for the backend's `GET /news` endpoint.
#[derive(Clone)]
pub struct NewsClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl NewsClient {
    /// Build a client from configuration.
    ///
    /// The request timeout is a transport setting on the underlying
    /// `reqwest::Client`; nothing above it adds a deadline.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Self::with_client(client, &config.api_url)
    }

    /// Wrap an existing client; `api_url` is the backend base URL.
    pub fn with_client(client: reqwest::Client, api_url: &str) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&format!("{}/news", api_url.trim().trim_end_matches('/')))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch the current article list from the backend.
    ///
    /// Issues exactly one GET request. The articles are returned as sent;
    /// ids and timestamps are not backfilled here.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection, TLS or transport timeout errors
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
    /// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
    /// - [`FetchError::Parse`] - Body is not the expected JSON
    pub async fn fetch_remote(&self) -> Result<Vec<Article>, FetchError> {
        tracing::debug!(endpoint = %self.endpoint, "Fetching news");

        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %self.endpoint, status = %status, "News request failed");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        let body: NewsResponse =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse(e.to_string()))?;
        let articles = body.articles.unwrap_or_default();

        tracing::info!(count = articles.len(), bytes = bytes.len(), "Fetched news");
        Ok(articles)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NEWS_JSON: &str = r#"{"articles": [
        {"id": "a1", "meta_title": "First", "meta_description": "d", "slug": "first", "tags": [], "content": []},
        {"meta_title": "Second", "meta_description": "d", "slug": "second", "tags": ["GPT"], "content": []}
    ]}"#;

    fn client_for(server: &MockServer) -> NewsClient {
        NewsClient::with_client(reqwest::Client::new(), &server.uri()).unwrap()
    }

    #[test]
    fn test_endpoint_appends_news() {
        let client = NewsClient::with_client(reqwest::Client::new(), "http://localhost:8000/").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:8000/news");

        let client = NewsClient::with_client(reqwest::Client::new(), "https://api.example.com/v1").unwrap();
        assert_eq!(client.endpoint().as_str(), "https://api.example.com/v1/news");
    }

    #[test]
    fn test_new_from_config() {
        let client = NewsClient::new(&Config::default()).unwrap();
        assert_eq!(client.endpoint().path(), "/news");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NEWS_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let articles = client_for(&server).fetch_remote().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, "a1");
        // Backfilling is the merge step's job
        assert_eq!(articles[1].id, "");
    }

    #[tokio::test]
    async fn test_fetch_missing_or_null_articles_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"articles": null}"#))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.fetch_remote().await.unwrap().is_empty());
        assert!(client.fetch_remote().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1) // no retries
            .mount(&server)
            .await;

        match client_for(&server).fetch_remote().await {
            Err(FetchError::HttpStatus(503)) => {}
            other => panic!("Expected HttpStatus(503), got {:?}", other.map(|a| a.len())),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_remote().await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        // Bind then drop a server so the port is closed.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let client = NewsClient::with_client(reqwest::Client::new(), &uri).unwrap();

        let result = client.fetch_remote().await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
