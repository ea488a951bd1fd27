//! Error types for the Kontext client.

use thiserror::Error;

/// Result type alias for Kontext operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Kontext operations.
///
/// Every failure aborts the workflow it occurred in; no partial result is
/// ever returned. The stage variants (`Upload`, `Submission`, `Poll`,
/// `GenerationFailed`, `Download`) carry a message naming the service and
/// the underlying cause.
#[derive(Error, Debug)]
pub enum Error {
    /// Uploading the source image to the image host failed.
    #[error("image upload failed: {0}")]
    Upload(String),

    /// Submitting the generation task failed.
    #[error("task submission failed: {0}")]
    Submission(String),

    /// Querying the task status failed.
    #[error("task status poll failed: {0}")]
    Poll(String),

    /// The API reported the generation task as failed.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// Downloading or decoding the generated image failed.
    #[error("result download failed: {0}")]
    Download(String),

    /// Non-2xx response from an API endpoint.
    #[error("api error (http {http_status}): {message}")]
    Api { http_status: u16, message: String },

    /// Invalid configuration or out-of-range parameter.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding/decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Creates a new API error from a raw response body.
    pub fn api(http_status: u16, body: &[u8]) -> Self {
        let message = String::from_utf8_lossy(body).trim().to_string();
        Error::Api {
            http_status,
            message,
        }
    }
}
