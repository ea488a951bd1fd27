//! Wire types for the ModelScope task API.

use serde::{Deserialize, Serialize};

// ==================== Task Status ====================

/// Status of an async generation task as reported by the API.
///
/// `Succeed` and `Failed` are terminal. Any status string outside the
/// recognized set parses as `Unknown` and is treated as still in progress,
/// so new intermediate statuses on the API side do not break the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "SUCCEED")]
    Succeed,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Returns true if the task is still in progress.
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Unknown)
    }

    /// Returns true if the task completed successfully.
    pub fn is_succeed(&self) -> bool {
        matches!(self, TaskStatus::Succeed)
    }

    /// Returns true if the task failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed)
    }

    /// Returns true if no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        self.is_succeed() || self.is_failed()
    }
}

// ==================== Output Images ====================

/// The `output_images` field of a completed task.
///
/// The API has returned both a bare URL string and a list of URLs; accept
/// either shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputImages {
    One(String),
    Many(Vec<String>),
}

impl OutputImages {
    /// Returns the primary output URL, if any.
    pub fn primary(&self) -> Option<&str> {
        match self {
            OutputImages::One(url) => Some(url.as_str()),
            OutputImages::Many(urls) => urls.first().map(String::as_str),
        }
    }
}

// ==================== Task Poll ====================

/// One observation of a task's state, as returned by a status query.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPoll {
    #[serde(rename = "task_status")]
    pub status: TaskStatus,

    /// Output image URL(s); present once the task has succeeded.
    #[serde(default)]
    pub output_images: Option<OutputImages>,

    /// API-supplied failure message, if any.
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskPoll {
    /// Returns the primary output URL, if the poll carried one.
    pub fn output_url(&self) -> Option<&str> {
        self.output_images.as_ref().and_then(OutputImages::primary)
    }
}
