use thiserror::Error;

use crate::task::TaskId;
use crate::views::ViewId;

#[derive(Debug, Error)]
pub enum TaskError {
  #[error("invalid task: {0}")]
  Validation(String),

  #[error("task not found: {0}")]
  NotFound(TaskId),

  #[error("persistence failed: {0:#}")]
  Persistence(#[from] anyhow::Error)
}

impl TaskError {
  pub fn validation(
    message: impl Into<String>
  ) -> Self {
    Self::Validation(message.into())
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound(_))
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation(_))
  }
}

/// Wiring mistakes: a view id nobody registered. Never shown to end
/// users in a correctly assembled registry.
#[derive(
  Debug, Error, PartialEq, Eq,
)]
pub enum ConfigurationError {
  #[error("unknown view id: {0:?}")]
  UnknownView(String),

  #[error(
    "no strategy registered for view {0}"
  )]
  Unregistered(ViewId)
}

pub type TaskResult<T> =
  Result<T, TaskError>;
