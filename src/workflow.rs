//! End-to-end image generation workflow.
//!
//! The workflow is a pure function of its inputs plus the two injected
//! collaborators: an [`ImageHost`] that turns image bytes into a public URL
//! and a [`GenerationBackend`] that runs the async generation task. Tests
//! drive it with scripted mocks; production uses the reqwest-backed
//! services from this crate.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use super::{
    error::{Error, Result},
    generation::{GenerationRequest, normalize_seed},
    image::ImageBuffer,
    task::Task,
    types::TaskPoll,
};

/// Minimum width/height accepted by the API.
pub const MIN_DIMENSION: u32 = 64;
/// Maximum width/height accepted by the API.
pub const MAX_DIMENSION: u32 = 2048;
/// Minimum number of diffusion steps.
pub const MIN_STEPS: u32 = 1;
/// Maximum number of diffusion steps.
pub const MAX_STEPS: u32 = 100;
/// Minimum guidance scale.
pub const MIN_GUIDANCE: f64 = 1.5;
/// Maximum guidance scale.
pub const MAX_GUIDANCE: f64 = 20.0;

/// Default delay between task status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Turns image bytes into a publicly fetchable URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads PNG bytes and returns the public URL of the hosted image.
    async fn upload_png(&self, png_bytes: Vec<u8>) -> Result<String>;
}

/// Runs asynchronous generation tasks.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submits a generation request, returning the task identifier.
    async fn submit(&self, request: &GenerationRequest) -> Result<String>;

    /// Queries the current state of a task.
    async fn poll(&self, task_id: &str) -> Result<TaskPoll>;

    /// Downloads the generated image bytes from an output URL.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// User-facing generation parameters.
///
/// The defaults mirror the original node's input declaration. Width and
/// height should be multiples of 64; the API rounds internally, so only the
/// [64, 2048] range is enforced here.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Text prompt describing the desired edit.
    pub prompt: String,
    /// Target image width in pixels.
    pub width: u32,
    /// Target image height in pixels.
    pub height: u32,
    /// Random seed; values beyond the API's 31-bit range wrap around.
    pub seed: u64,
    /// Number of diffusion steps.
    pub steps: u32,
    /// Guidance scale.
    pub guidance: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt: "A beautiful painting of a singular lighthouse, shining its light \
                     across a tumultuous sea of churning water."
                .to_string(),
            width: 1024,
            height: 1024,
            seed: 0,
            steps: 30,
            guidance: 3.5,
        }
    }
}

impl GenerationParams {
    /// Checks that every parameter is within the API's documented range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&self.width) {
            return Err(Error::Config(format!(
                "width {} out of range [{MIN_DIMENSION}, {MAX_DIMENSION}]",
                self.width
            )));
        }
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&self.height) {
            return Err(Error::Config(format!(
                "height {} out of range [{MIN_DIMENSION}, {MAX_DIMENSION}]",
                self.height
            )));
        }
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.steps) {
            return Err(Error::Config(format!(
                "steps {} out of range [{MIN_STEPS}, {MAX_STEPS}]",
                self.steps
            )));
        }
        if !(MIN_GUIDANCE..=MAX_GUIDANCE).contains(&self.guidance) {
            return Err(Error::Config(format!(
                "guidance {} out of range [{MIN_GUIDANCE}, {MAX_GUIDANCE}]",
                self.guidance
            )));
        }
        Ok(())
    }
}

/// Polling behavior for the task status loop.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between consecutive status queries.
    pub interval: Duration,

    /// Maximum number of status queries before giving up with
    /// [`Error::Poll`]. `None` polls until a terminal state, matching the
    /// original behavior.
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Runs the full generation workflow:
/// encode → upload → submit → poll → fetch → decode.
///
/// Any failure aborts immediately and surfaces as the corresponding stage
/// error; no partial image is returned.
pub async fn generate<H, B>(
    host: &H,
    backend: &B,
    image: &ImageBuffer,
    params: &GenerationParams,
    poll: &PollOptions,
) -> Result<ImageBuffer>
where
    H: ImageHost + ?Sized,
    B: GenerationBackend + ?Sized,
{
    params.validate()?;

    let effective_seed = normalize_seed(params.seed);
    if effective_seed as u64 != params.seed {
        debug!(seed = params.seed, effective_seed, "seed wrapped into API range");
    }

    let png = image.encode_png()?;
    let image_url = host.upload_png(png).await?;

    let request = GenerationRequest::from_params(params, &image_url);
    let task_id = backend.submit(&request).await?;
    info!(%task_id, "generation task submitted");

    let mut task = Task::new(task_id);
    let output_url = task.wait(backend, poll).await?;
    info!(task_id = task.id(), %output_url, "generation succeeded");

    let bytes = backend.fetch(&output_url).await?;
    ImageBuffer::decode(&bytes)
        .map_err(|e| Error::Download(format!("generated image is not decodable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(GenerationParams::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        let mut p = GenerationParams::default();
        p.width = 63;
        assert!(matches!(p.validate(), Err(Error::Config(_))));

        let mut p = GenerationParams::default();
        p.height = 4096;
        assert!(matches!(p.validate(), Err(Error::Config(_))));

        let mut p = GenerationParams::default();
        p.steps = 0;
        assert!(matches!(p.validate(), Err(Error::Config(_))));

        let mut p = GenerationParams::default();
        p.guidance = 1.0;
        assert!(matches!(p.validate(), Err(Error::Config(_))));
    }
}
