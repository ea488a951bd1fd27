//! Public image hosting upload.
//!
//! The inference API only accepts a source image by URL, so the input frame
//! is first pushed to freeimage.host, which allows anonymous uploads under
//! a fixed public key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, multipart};
use serde::Deserialize;
use tracing::debug;

use super::{
    error::{Error, Result},
    workflow::ImageHost,
};

/// Default upload endpoint.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://freeimage.host/api/1/upload";

/// Public key for anonymous uploads to freeimage.host.
pub const DEFAULT_UPLOAD_KEY: &str = "6d207e02198a847aa98d0a2a901485a5";

/// Image hosting service client.
pub struct ImageHostService {
    client: ReqwestClient,
    endpoint: String,
    api_key: String,
}

impl ImageHostService {
    /// Creates a service pointed at the default public host.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_UPLOAD_ENDPOINT, DEFAULT_UPLOAD_KEY)
    }

    /// Creates a service with a custom endpoint and upload key.
    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Uploads PNG bytes and returns the public URL of the hosted image.
    pub async fn upload(&self, png_bytes: Vec<u8>) -> Result<String> {
        debug!(endpoint = %self.endpoint, bytes = png_bytes.len(), "uploading source image");

        let form = multipart::Form::new()
            .text("key", self.api_key.clone())
            .text("action", "upload")
            .text("format", "json")
            .part(
                "source",
                multipart::Part::bytes(png_bytes)
                    .file_name("image.png")
                    .mime_str("image/png")
                    .map_err(|e| Error::Upload(format!("image host: {e}")))?,
            );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("image host: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Upload(format!("image host: {e}")))?;

        if !status.is_success() {
            return Err(Error::Upload(format!(
                "image host: HTTP {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body).trim()
            )));
        }

        let resp: UploadResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::Upload(format!("image host: invalid response: {e}")))?;

        if resp.status_code != 200 {
            let message = resp
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(Error::Upload(format!("image host: {message}")));
        }

        match resp.image.map(|i| i.url) {
            Some(url) if !url.is_empty() => {
                debug!(%url, "source image uploaded");
                Ok(url)
            }
            _ => Err(Error::Upload(
                "image host: response carried no image URL".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ImageHost for ImageHostService {
    async fn upload_png(&self, png_bytes: Vec<u8>) -> Result<String> {
        self.upload(png_bytes).await
    }
}

/// Response from the image host upload endpoint.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    status_code: i32,
    #[serde(default)]
    image: Option<UploadedImage>,
    #[serde(default)]
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_response() {
        let resp: UploadResponse = serde_json::from_str(
            r#"{"status_code":200,"image":{"url":"https://iili.io/abc.png","size":1234}}"#,
        )
        .unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.image.unwrap().url, "https://iili.io/abc.png");
    }

    #[test]
    fn parses_error_response() {
        let resp: UploadResponse = serde_json::from_str(
            r#"{"status_code":400,"error":{"message":"source is empty","code":100}}"#,
        )
        .unwrap();
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.error.unwrap().message, "source is empty");
    }
}
