//! Image hosting
//!
//! Uploads go to an imgbb-compatible endpoint (`key` + base64 `image` form
//! fields, JSON reply with `data.url`). The in-memory variant backs
//! development and tests.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::{sha256_hex, to_base64};

/// Upper bound on accepted uploads
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image is empty")]
    Empty,

    #[error("Image exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("Image host request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Image host rejected upload (status={status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Image host reply had no URL")]
    MissingUrl,
}

impl ImageError {
    /// Caused by the caller's input rather than the provider
    pub fn is_client_error(&self) -> bool {
        matches!(self, ImageError::Empty | ImageError::TooLarge { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    pub upload_url: String,
    pub api_key: String,
}

#[derive(Deserialize)]
struct UploadReply {
    data: Option<UploadData>,
}

#[derive(Deserialize)]
struct UploadData {
    url: Option<String>,
    display_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpImageHost {
    http: reqwest::Client,
    config: ImageHostConfig,
}

impl HttpImageHost {
    pub fn new(http: reqwest::Client, config: ImageHostConfig) -> Self {
        Self { http, config }
    }

    async fn upload(&self, bytes: &[u8], file_name: &str) -> Result<String, ImageError> {
        let encoded = to_base64(bytes);
        let form = [
            ("key", self.config.api_key.as_str()),
            ("image", encoded.as_str()),
            ("name", file_name),
        ];

        let response = self
            .http
            .post(&self.config.upload_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: UploadReply = response.json().await?;
        reply
            .data
            .and_then(|data| data.url.or(data.display_url))
            .ok_or(ImageError::MissingUrl)
    }
}

/// Content-addressed in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryImageStore {
    uploads: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MemoryImageStore {
    fn upload(&self, bytes: &[u8], file_name: &str) -> String {
        let url = format!("memory://images/{}/{}", sha256_hex(bytes), file_name);
        self.uploads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((url.clone(), bytes.len()));
        url
    }

    pub fn uploaded_urls(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum ImageHost {
    Http(HttpImageHost),
    Memory(MemoryImageStore),
}

impl ImageHost {
    /// Upload an image and return its public URL
    pub async fn upload(&self, bytes: &[u8], file_name: &str) -> Result<String, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge {
                max: MAX_IMAGE_BYTES,
            });
        }

        let url = match self {
            ImageHost::Http(host) => host.upload(bytes, file_name).await?,
            ImageHost::Memory(store) => store.upload(bytes, file_name),
        };
        tracing::info!(size = bytes.len(), "Image uploaded");
        Ok(url)
    }
}
