pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

#[derive(Debug)]
pub enum FetchOutcome {
    /// Document retrieved, with validators for the next conditional request.
    Fetched {
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// HTTP 304: upstream unchanged since the stored validators.
    NotModified,
}

#[async_trait]
pub trait Fetcher {
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome>;
}
