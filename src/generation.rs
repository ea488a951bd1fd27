//! Generation request types and the ModelScope-backed service.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    error::{Error, Result},
    http::HttpClient,
    task::Task,
    types::TaskPoll,
    workflow::{GenerationBackend, GenerationParams},
};

/// Model identifier submitted with every request.
pub const MODEL_FLUX_KONTEXT_DEV: &str = "MusePublic/FLUX.1-Kontext-Dev";

/// Largest seed the API accepts (31-bit range).
pub const MAX_SEED: u32 = 2_147_483_647;

/// Wraps an arbitrary seed into the API's accepted `[0, MAX_SEED]` range.
pub fn normalize_seed(seed: u64) -> u32 {
    (seed % (MAX_SEED as u64 + 1)) as u32
}

/// Wire-format request for `POST /v1/images/generations`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub image_url: String,
    /// Target size as `"<width>x<height>"`.
    pub size: String,
    pub seed: u32,
    pub steps: u32,
    pub guidance: f64,
}

impl GenerationRequest {
    /// Builds a request from user parameters and the uploaded source URL,
    /// wrapping the seed into the API's range.
    pub fn from_params(params: &GenerationParams, image_url: &str) -> Self {
        Self {
            model: MODEL_FLUX_KONTEXT_DEV.to_string(),
            prompt: params.prompt.clone(),
            image_url: image_url.to_string(),
            size: format!("{}x{}", params.width, params.height),
            seed: normalize_seed(params.seed),
            steps: params.steps,
            guidance: params.guidance,
        }
    }
}

/// Image generation service backed by the ModelScope inference API.
pub struct GenerationService {
    http: Arc<HttpClient>,
}

impl GenerationService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Submits an asynchronous generation task.
    pub async fn start(&self, request: &GenerationRequest) -> Result<Task> {
        #[derive(Deserialize)]
        struct SubmitResponse {
            #[serde(default)]
            task_id: Option<String>,
        }

        debug!(size = %request.size, seed = request.seed, "submitting generation task");

        let resp: SubmitResponse = self
            .http
            .request_json(
                Method::POST,
                "/v1/images/generations",
                Some(request),
                &[("X-ModelScope-Async-Mode", "true")],
            )
            .await
            .map_err(|e| Error::Submission(format!("modelscope: {e}")))?;

        match resp.task_id {
            Some(id) if !id.is_empty() => Ok(Task::new(id)),
            _ => Err(Error::Submission(
                "modelscope: response carried no task_id".to_string(),
            )),
        }
    }

    /// Queries the current status of a task.
    pub async fn status(&self, task_id: &str) -> Result<TaskPoll> {
        let path = format!("/v1/tasks/{task_id}");

        self.http
            .request_json::<(), _>(
                Method::GET,
                &path,
                None,
                &[("X-ModelScope-Task-Type", "image_generation")],
            )
            .await
            .map_err(|e| Error::Poll(format!("modelscope: {e}")))
    }

    /// Downloads a generated image from its output URL.
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        self.http
            .get_bytes(url)
            .await
            .map_err(|e| Error::Download(format!("{url}: {e}")))
    }
}

#[async_trait]
impl GenerationBackend for GenerationService {
    async fn submit(&self, request: &GenerationRequest) -> Result<String> {
        self.start(request).await.map(Task::into_id)
    }

    async fn poll(&self, task_id: &str) -> Result<TaskPoll> {
        self.status(task_id).await
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.download(url).await
    }
}
