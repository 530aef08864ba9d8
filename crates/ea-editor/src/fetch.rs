//! Retrieval of background image bytes from a locator.

use ea_core::Url;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read background: {0}")]
    Io(#[from] std::io::Error),

    #[error("background request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("background request returned status {0}")]
    Status(u16),

    #[error("unsupported background locator `{0}`")]
    UnsupportedScheme(String),

    #[error("background image could not be decoded: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Source of raw background bytes.
///
/// Implementations run on the Tokio runtime, off the thread that owns the
/// document, so they must be `Send + Sync`.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Fetches `file://` locators from disk and `http(s)://` ones over the
/// network. No timeout is applied.
#[derive(Debug, Clone, Default)]
pub struct LocatorFetcher {
    client: reqwest::Client,
}

impl LocatorFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for LocatorFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| FetchError::UnsupportedScheme(url.to_string()))?;
                Ok(tokio::fs::read(path).await?)
            }
            "http" | "https" => {
                let response = self.client.get(url.as_str()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                Ok(response.bytes().await?.to_vec())
            }
            _ => Err(FetchError::UnsupportedScheme(url.to_string())),
        }
    }
}
