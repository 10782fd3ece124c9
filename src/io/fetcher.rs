use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// Trait for downloading raw tile bytes from a URL.
///
/// This abstraction keeps the tile cache independent of the HTTP client, so
/// tests can substitute an in-memory transport. Implementations must be
/// thread-safe.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Fetch the full body at `url`.
    ///
    /// Returns an error if the request fails or the server does not answer
    /// with a success status. Implementations do not retry.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<T: TileFetcher + ?Sized> TileFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        (**self).fetch(url).await
    }
}
