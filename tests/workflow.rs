//! Workflow tests against scripted mock collaborators.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use modelscope_kontext::{
    Error, GenerationBackend, GenerationParams, GenerationRequest, ImageBuffer, ImageHost,
    OutputImages, PollOptions, Result, TaskPoll, TaskStatus, generate,
};

const OUTPUT_URL: &str = "https://cdn.example/out.png";

/// Image host mock: counts uploads, optionally fails like a rejected upload.
struct MockHost {
    uploads: AtomicUsize,
    fail: bool,
}

impl MockHost {
    fn ok() -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait]
impl ImageHost for MockHost {
    async fn upload_png(&self, _png_bytes: Vec<u8>) -> Result<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(Error::Upload("image host: source is empty".to_string()))
        } else {
            Ok("https://img.example/src.png".to_string())
        }
    }
}

/// Backend mock: records the submitted request and plays back a scripted
/// sequence of poll results.
struct MockBackend {
    submits: AtomicUsize,
    polls: AtomicUsize,
    fetches: AtomicUsize,
    submitted: Mutex<Option<GenerationRequest>>,
    submit_error: Option<fn() -> Error>,
    script: Mutex<VecDeque<Result<TaskPoll>>>,
    output_png: Vec<u8>,
}

impl MockBackend {
    fn new(script: Vec<Result<TaskPoll>>) -> Self {
        Self {
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            submitted: Mutex::new(None),
            submit_error: None,
            script: Mutex::new(script.into_iter().collect()),
            output_png: output_image().encode_png().unwrap(),
        }
    }

    fn failing_submit(error: fn() -> Error) -> Self {
        let mut backend = Self::new(Vec::new());
        backend.submit_error = Some(error);
        backend
    }

    fn submitted(&self) -> GenerationRequest {
        self.submitted.lock().unwrap().clone().expect("no request submitted")
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn submit(&self, request: &GenerationRequest) -> Result<String> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.submit_error {
            return Err(error());
        }
        *self.submitted.lock().unwrap() = Some(request.clone());
        Ok("task-123".to_string())
    }

    async fn poll(&self, task_id: &str) -> Result<TaskPoll> {
        assert_eq!(task_id, "task-123");
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("poll script exhausted")
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        assert_eq!(url, OUTPUT_URL);
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(self.output_png.clone()))
    }
}

fn pending() -> Result<TaskPoll> {
    Ok(TaskPoll {
        status: TaskStatus::Pending,
        output_images: None,
        message: None,
    })
}

fn unknown() -> Result<TaskPoll> {
    Ok(TaskPoll {
        status: TaskStatus::Unknown,
        output_images: None,
        message: None,
    })
}

fn succeed() -> Result<TaskPoll> {
    Ok(TaskPoll {
        status: TaskStatus::Succeed,
        output_images: Some(OutputImages::One(OUTPUT_URL.to_string())),
        message: None,
    })
}

fn failed(message: &str) -> Result<TaskPoll> {
    Ok(TaskPoll {
        status: TaskStatus::Failed,
        output_images: None,
        message: Some(message.to_string()),
    })
}

fn input_image() -> ImageBuffer {
    let pixels: Vec<u8> = (0..512u32 * 512 * 3).map(|i| (i % 251) as u8).collect();
    ImageBuffer::from_rgb8(512, 512, &pixels).unwrap()
}

fn output_image() -> ImageBuffer {
    let pixels: Vec<u8> = (0..8u32 * 8 * 3).map(|i| (i * 7 % 256) as u8).collect();
    ImageBuffer::from_rgb8(8, 8, &pixels).unwrap()
}

fn params() -> GenerationParams {
    GenerationParams {
        prompt: "a red cube".to_string(),
        width: 1024,
        height: 1024,
        seed: 2_147_483_648,
        steps: 30,
        guidance: 3.5,
    }
}

fn fast_poll() -> PollOptions {
    PollOptions {
        interval: Duration::ZERO,
        max_attempts: None,
    }
}

#[tokio::test]
async fn pending_pending_succeed_returns_decoded_image() {
    let host = MockHost::ok();
    let backend = MockBackend::new(vec![pending(), pending(), succeed()]);

    let result = generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap();

    assert_eq!(backend.polls.load(Ordering::SeqCst), 3);
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
    assert_eq!((result.width(), result.height()), (8, 8));

    let expected = output_image();
    for (a, b) in expected.data().iter().zip(result.data()) {
        assert!((a - b).abs() <= 1.0 / 255.0);
    }
}

#[tokio::test]
async fn end_to_end_request_carries_normalized_seed_and_size() {
    let host = MockHost::ok();
    let backend = MockBackend::new(vec![pending(), succeed()]);

    generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap();

    assert_eq!(host.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(backend.submits.load(Ordering::SeqCst), 1);

    let request = backend.submitted();
    assert_eq!(request.seed, 0);
    assert_eq!(request.size, "1024x1024");
    assert_eq!(request.prompt, "a red cube");
    assert_eq!(request.image_url, "https://img.example/src.png");
}

#[tokio::test]
async fn failed_status_surfaces_api_message() {
    let host = MockHost::ok();
    let backend = MockBackend::new(vec![failed("content policy violation")]);

    let err = generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap_err();

    match err {
        Error::GenerationFailed(message) => assert!(message.contains("content policy violation")),
        other => panic!("expected GenerationFailed, got {other:?}"),
    }
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_failure_skips_submission() {
    let host = MockHost::failing();
    let backend = MockBackend::new(Vec::new());

    let err = generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upload(_)));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 0);
    assert_eq!(backend.polls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn submission_failure_never_polls() {
    let host = MockHost::ok();
    let backend = MockBackend::failing_submit(|| {
        Error::Submission("modelscope: response carried no task_id".to_string())
    });

    let err = generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Submission(_)));
    assert_eq!(backend.polls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_status_keeps_polling() {
    let host = MockHost::ok();
    let backend = MockBackend::new(vec![unknown(), unknown(), succeed()]);

    generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap();

    assert_eq!(backend.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn poll_transport_error_aborts_without_retry() {
    let host = MockHost::ok();
    let backend = MockBackend::new(vec![
        pending(),
        Err(Error::Poll("modelscope: connection reset".to_string())),
    ]);

    let err = generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Poll(_)));
    assert_eq!(backend.polls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn bounded_polling_aborts_a_stuck_task() {
    let host = MockHost::ok();
    let backend = MockBackend::new(vec![pending(), pending(), pending(), pending()]);

    let poll = PollOptions {
        interval: Duration::ZERO,
        max_attempts: Some(3),
    };
    let err = generate(&host, &backend, &input_image(), &params(), &poll)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Poll(_)));
    assert_eq!(backend.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn success_without_output_url_is_a_failure() {
    let host = MockHost::ok();
    let backend = MockBackend::new(vec![Ok(TaskPoll {
        status: TaskStatus::Succeed,
        output_images: None,
        message: None,
    })]);

    let err = generate(&host, &backend, &input_image(), &params(), &fast_poll())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::GenerationFailed(_)));
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_params_fail_before_any_network_call() {
    let host = MockHost::ok();
    let backend = MockBackend::new(Vec::new());

    let mut bad = params();
    bad.width = 32;
    let err = generate(&host, &backend, &input_image(), &bad, &fast_poll())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(host.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(backend.submits.load(Ordering::SeqCst), 0);
}
