pub mod filemoon;

pub use filemoon::FileMoonClient;

use thiserror::Error;

use crate::models::HostedFileRecord;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No API key configured (set FILEMOON_API_KEY or catalog.api_key)")]
    MissingApiKey,

    #[error("Authentication rejected by hosting API")]
    Auth,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Hosting API error: {0}")]
    Api(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Anything that can list the hosted-file catalog one page at a time.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns the rows of page `page` (1-based). A page shorter than
    /// `per_page` is the last one.
    async fn list_page(&self, page: u32, per_page: u32)
    -> Result<Vec<HostedFileRecord>, ClientError>;
}
