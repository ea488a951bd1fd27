//! ModelScope Kontext API client.

use std::sync::Arc;
use std::time::Duration;

use super::{
    error::{Error, Result},
    generation::GenerationService,
    http::HttpClient,
    image::ImageBuffer,
    imagehost::{DEFAULT_UPLOAD_ENDPOINT, DEFAULT_UPLOAD_KEY, ImageHostService},
    workflow::{self, GenerationParams, PollOptions},
};

/// Default ModelScope inference API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api-inference.modelscope.cn";

/// ModelScope Kontext API client.
///
/// # Example
///
/// ```rust,no_run
/// use modelscope_kontext::{Client, GenerationParams, ImageBuffer};
///
/// # async fn run(image: ImageBuffer) -> modelscope_kontext::Result<()> {
/// let client = Client::new("your-modelscope-api-key")?;
///
/// let params = GenerationParams {
///     prompt: "turn the sky into a thunderstorm".to_string(),
///     ..Default::default()
/// };
/// let result = client.generate(&image, &params).await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    http: Arc<HttpClient>,
    config: ClientConfig,
}

/// Client configuration.
#[derive(Clone)]
struct ClientConfig {
    api_key: String,
    base_url: String,
    upload_endpoint: String,
    upload_key: String,
    poll: PollOptions,
}

impl Client {
    /// Creates a new client with default settings.
    ///
    /// Fails with [`Error::Config`] if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(api_key).build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Returns the configured API key.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns the configured polling options.
    pub fn poll_options(&self) -> &PollOptions {
        &self.config.poll
    }

    /// Returns the image generation service.
    pub fn images(&self) -> GenerationService {
        GenerationService::new(self.http.clone())
    }

    /// Returns the image hosting service used for source uploads.
    pub fn host(&self) -> Result<ImageHostService> {
        ImageHostService::with_endpoint(
            self.config.upload_endpoint.as_str(),
            self.config.upload_key.as_str(),
        )
    }

    /// Runs the full image-to-image workflow:
    /// upload the source image, submit the task, poll to completion, and
    /// return the generated image.
    pub async fn generate(
        &self,
        image: &ImageBuffer,
        params: &GenerationParams,
    ) -> Result<ImageBuffer> {
        let host = self.host()?;
        workflow::generate(&host, &self.images(), image, params, &self.config.poll).await
    }
}

/// Builder for creating a Kontext API client.
pub struct ClientBuilder {
    api_key: String,
    base_url: String,
    upload_endpoint: String,
    upload_key: String,
    poll_interval: Duration,
    max_polls: Option<u32>,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            upload_key: DEFAULT_UPLOAD_KEY.to_string(),
            poll_interval: workflow::DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }

    /// Sets a custom base URL for the inference API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets a custom image hosting endpoint and upload key.
    pub fn upload_endpoint(mut self, url: impl Into<String>, key: impl Into<String>) -> Self {
        self.upload_endpoint = url.into();
        self.upload_key = key.into();
        self
    }

    /// Sets the delay between task status polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bounds the number of status polls before giving up.
    ///
    /// By default the loop polls until the task reaches a terminal state.
    pub fn max_polls(mut self, max: u32) -> Self {
        self.max_polls = Some(max);
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.api_key.is_empty() {
            return Err(Error::Config("api_key must be non-empty".to_string()));
        }

        let http = HttpClient::new(self.base_url.clone(), self.api_key.clone())?;

        Ok(Client {
            http: Arc::new(http),
            config: ClientConfig {
                api_key: self.api_key,
                base_url: self.base_url,
                upload_endpoint: self.upload_endpoint,
                upload_key: self.upload_key,
                poll: PollOptions {
                    interval: self.poll_interval,
                    max_attempts: self.max_polls,
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(Client::new(""), Err(Error::Config(_))));
    }

    #[test]
    fn builder_configures_polling() {
        let client = Client::builder("key")
            .poll_interval(Duration::from_millis(100))
            .max_polls(12)
            .build()
            .unwrap();
        assert_eq!(client.poll_options().interval, Duration::from_millis(100));
        assert_eq!(client.poll_options().max_attempts, Some(12));
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }
}
