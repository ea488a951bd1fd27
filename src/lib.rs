//! ModelScope Kontext (FLUX) API client for Rust.
//!
//! This crate runs image-to-image generation through the ModelScope
//! Kontext asynchronous inference API: the source image is uploaded to a
//! public image host to obtain a URL, a generation task is submitted,
//! polled until it reaches a terminal state, and the resulting image is
//! downloaded and decoded back into a float RGB buffer.

mod client;
mod error;
mod generation;
mod http;
mod image;
mod imagehost;
mod node;
mod task;
mod types;
mod workflow;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use generation::{
    GenerationRequest, GenerationService, MAX_SEED, MODEL_FLUX_KONTEXT_DEV, normalize_seed,
};
pub use self::image::ImageBuffer;
pub use imagehost::{DEFAULT_UPLOAD_ENDPOINT, DEFAULT_UPLOAD_KEY, ImageHostService};
pub use node::{KONTEXT_NODE, KontextNode, NodeDescriptor, registry};
pub use task::Task;
pub use types::{OutputImages, TaskPoll, TaskStatus};
pub use workflow::{
    DEFAULT_POLL_INTERVAL, GenerationBackend, GenerationParams, ImageHost, MAX_DIMENSION,
    MAX_GUIDANCE, MAX_STEPS, MIN_DIMENSION, MIN_GUIDANCE, MIN_STEPS, PollOptions, generate,
};
