mod fetcher;
mod http_fetcher;

pub use fetcher::TileFetcher;
pub use http_fetcher::{create_http_client, HttpTileFetcher, DEFAULT_USER_AGENT};
