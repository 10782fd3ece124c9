use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;

use super::TileFetcher;
use crate::error::FetchError;

/// Identifying client header sent when no other is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("flightmap/", env!("CARGO_PKG_VERSION"));

/// HTTP implementation of [`TileFetcher`] backed by `reqwest`.
///
/// Public tile providers require every request to identify the client, so the
/// `User-Agent` header is installed on the client itself when it is built.
#[derive(Clone)]
pub struct HttpTileFetcher {
    client: Client,
}

impl HttpTileFetcher {
    /// Build a fetcher that sends `user_agent` with every request.
    ///
    /// A `timeout` of `None` leaves requests unbounded.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let client = create_http_client(user_agent, timeout)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Create an HTTP client carrying an identifying `User-Agent` header.
///
/// ```ignore
/// let client = create_http_client("my-app/1.0 (+https://example.com)", None)?;
/// ```
pub fn create_http_client(user_agent: &str, timeout: Option<Duration>) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(user_agent)
        .map_err(|e| FetchError::Client(format!("invalid user agent: {}", e)))?;
    headers.insert(USER_AGENT, value);

    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(|e| FetchError::Client(e.to_string()))
}
