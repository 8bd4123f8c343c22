//! Drag-and-drop reassignment.
//!
//! A gesture only records what is being dragged and where it hovers.
//! Nothing is written until the drop, and then at most one patch.

use tasklane_shared::TaskPatch;
use tracing::{
  debug,
  info
};

use crate::error::TaskResult;
use crate::task::{
  Task,
  TaskId
};
use crate::views::{
  BucketKey,
  ViewStrategy
};

/// Whatever applies a reassignment patch. The store in production.
pub trait ReassignTarget {
  fn lookup(
    &self,
    id: TaskId
  ) -> TaskResult<Task>;

  fn apply(
    &self,
    id: TaskId,
    patch: TaskPatch
  ) -> TaskResult<Task>;
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DragSession {
  pub task_id:      TaskId,
  pub source:       BucketKey,
  pub source_index: usize,
  pub hovered:      Option<BucketKey>
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
  /// Dropped back where it started.
  NoOp,
  /// No target, or one the view does not accept.
  Invalid,
  Cancelled,
  Reassigned(Task)
}

#[derive(Debug, Default)]
pub struct DragController {
  session: Option<DragSession>
}

impl DragController {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn session(
    &self
  ) -> Option<&DragSession> {
    self.session.as_ref()
  }

  pub fn is_dragging(&self) -> bool {
    self.session.is_some()
  }

  /// Starts a gesture, replacing any stale one.
  pub fn start(
    &mut self,
    task_id: TaskId,
    source: BucketKey,
    source_index: usize
  ) {
    debug!(%task_id, ?source, source_index, "drag start");
    self.session = Some(DragSession {
      task_id,
      source,
      source_index,
      hovered: None
    });
  }

  pub fn hover(
    &mut self,
    bucket: Option<BucketKey>
  ) {
    if let Some(session) =
      self.session.as_mut()
      && session.hovered != bucket
    {
      debug!(?bucket, "drag over bucket");
      session.hovered = bucket;
    }
  }

  pub fn cancel(&mut self) -> DropOutcome {
    if self.session.take().is_some() {
      debug!("drag cancelled");
    }
    DropOutcome::Cancelled
  }

  /// Ends the gesture. The session is discarded whatever the outcome.
  pub fn drop(
    &mut self,
    target: Option<BucketKey>,
    strategy: &dyn ViewStrategy,
    sink: &dyn ReassignTarget
  ) -> TaskResult<DropOutcome> {
    let Some(session) = self.session.take()
    else {
      return Ok(DropOutcome::Invalid);
    };
    let Some(target) = target else {
      debug!(task_id = %session.task_id, "dropped outside any bucket");
      return Ok(DropOutcome::Invalid);
    };
    if target == session.source {
      return Ok(DropOutcome::NoOp);
    }

    let task = sink.lookup(session.task_id)?;
    let Some(patch) =
      strategy.on_reassign(&task, &target)
    else {
      debug!(
        view = %strategy.id(),
        ?target,
        "view rejected drop target"
      );
      return Ok(DropOutcome::Invalid);
    };

    let updated =
      sink.apply(session.task_id, patch)?;
    info!(
      task_id = %session.task_id,
      from = ?session.source,
      to = ?target,
      "reassigned task"
    );
    Ok(DropOutcome::Reassigned(updated))
  }
}
