use std::sync::Arc;

use async_trait::async_trait;
use lectern_types::{Result, anyhow};
use serde::Deserialize;

/// Capability interface for the external image host. Uploads happen before
/// any catalog row is written, so a failed upload can never leave a course
/// pointing at a missing asset.
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Store an image under `key` and return its public URL.
    async fn upload_image(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

pub type DynAssetHost = Arc<dyn AssetHost>;

/// Thin HTTP client for a Cloudinary-style upload endpoint.
pub struct HttpAssetHost {
    endpoint: String,
    api_key: String,
    client: lectern_types::reqwest::Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl HttpAssetHost {
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("ASSET_HOST_URL").ok()?;
        let api_key = std::env::var("ASSET_HOST_KEY").ok()?;
        Some(Self {
            endpoint,
            api_key,
            client: lectern_types::reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl AssetHost for HttpAssetHost {
    async fn upload_image(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), key);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", content_type.to_string())
            .body(bytes)
            .send()
            .await
            .map_err(|e| anyhow!("Asset upload failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Asset host error {}: {}", status, body));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Invalid asset host response: {}", e))?;
        Ok(parsed.secure_url)
    }
}
