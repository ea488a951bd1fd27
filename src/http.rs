//! HTTP client for the ModelScope inference API.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    Client as ReqwestClient, Method, Response,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};

use super::error::{Error, Result};

/// HTTP client carrying the base URL and bearer credential.
///
/// Requests are issued exactly once; there is no transport-level retry.
/// The only repetition in this crate is the designed poll loop, which
/// re-queries a still-pending task.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Makes a JSON request to an API path, with optional extra headers.
    pub async fn request_json<T, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
        extra_headers: &[(&'static str, &str)],
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = self.default_headers();
        for (name, value) in extra_headers {
            headers.insert(
                *name,
                HeaderValue::from_str(value)
                    .map_err(|e| Error::Config(format!("invalid header value: {e}")))?,
            );
        }

        let mut request = self.client.request(method, &url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Downloads raw bytes from an absolute URL, without auth headers.
    ///
    /// Used for fetching generated images from the CDN URL the API returns;
    /// the bearer credential must not leak to that host.
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), &body));
        }
        Ok(body)
    }

    /// Returns default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(auth) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, auth);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("modelscope-kontext-rust/0.1"),
        );
        headers
    }

    /// Handles an API response, decoding JSON on success.
    async fn handle_response<R>(response: Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(Error::api(status.as_u16(), &body));
        }

        serde_json::from_slice(&body).map_err(Error::from)
    }
}
