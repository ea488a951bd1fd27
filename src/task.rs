//! Async generation task state and poll loop.

use tracing::debug;

use super::{
    error::{Error, Result},
    types::TaskStatus,
    workflow::{GenerationBackend, PollOptions},
};

/// Handle for an in-progress generation task.
///
/// The status starts as `Pending` and transitions only through polling;
/// `Succeed` and `Failed` are terminal. Unrecognized API statuses are
/// recorded as `Pending` and polling continues.
#[derive(Debug, Clone)]
pub struct Task {
    id: String,
    status: TaskStatus,
}

impl Task {
    /// Creates a handle for a freshly submitted task.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Pending,
        }
    }

    /// Returns the task identifier issued by the API.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Consumes the handle, returning the identifier.
    pub fn into_id(self) -> String {
        self.id
    }

    /// Returns the last observed status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Polls the task until it reaches a terminal state and returns the
    /// output image URL.
    ///
    /// A `Failed` status or a success without an output URL surfaces as
    /// [`Error::GenerationFailed`]; a transport error during a poll
    /// surfaces as [`Error::Poll`] immediately, without retry. With
    /// `poll.max_attempts` set, a task still pending after that many
    /// status queries aborts with [`Error::Poll`].
    pub async fn wait<B>(&mut self, backend: &B, poll: &PollOptions) -> Result<String>
    where
        B: GenerationBackend + ?Sized,
    {
        let mut attempts: u32 = 0;

        loop {
            let observed = backend.poll(&self.id).await?;
            attempts += 1;

            self.status = if observed.status.is_pending() {
                TaskStatus::Pending
            } else {
                observed.status
            };
            debug!(task_id = %self.id, status = ?observed.status, attempts, "task polled");

            match observed.status {
                TaskStatus::Succeed => {
                    return match observed.output_url() {
                        Some(url) => Ok(url.to_string()),
                        None => Err(Error::GenerationFailed(
                            "task succeeded but returned no output image".to_string(),
                        )),
                    };
                }
                TaskStatus::Failed => {
                    return Err(Error::GenerationFailed(
                        observed
                            .message
                            .unwrap_or_else(|| "unknown error".to_string()),
                    ));
                }
                TaskStatus::Pending | TaskStatus::Unknown => {
                    if let Some(max) = poll.max_attempts {
                        if attempts >= max {
                            return Err(Error::Poll(format!(
                                "task {} still pending after {} status checks",
                                self.id, attempts
                            )));
                        }
                    }
                    tokio::time::sleep(poll.interval).await;
                }
            }
        }
    }
}
