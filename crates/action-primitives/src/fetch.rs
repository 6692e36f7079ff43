//! Image download for upload steps

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::errors::ActionError;
use crate::types::FetchedImage;

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ActionError>;
}

/// Fetches images over HTTP(S). Non-success statuses are transport errors.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ActionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ActionError::Internal(format!("http client: {}", err)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// MIME type guessed from the URL path when the server omits Content-Type.
pub fn mime_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ActionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ActionError::download(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::download(url, format!("HTTP {}", status)));
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or_default().trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| mime_from_url(url));

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ActionError::download(url, err))?;

        debug!(url, mime = %mime, size = bytes.len(), "downloaded image");
        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            mime,
        })
    }
}
