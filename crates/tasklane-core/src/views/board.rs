use chrono::Weekday;
use tasklane_shared::TaskPatch;

use super::{
  Bucket,
  BucketKey,
  RenderContext,
  ViewId,
  ViewStrategy
};
use crate::calendar::week_of_year;
use crate::task::Task;

/// Two-column kanban: open work and finished work.
#[derive(Debug, Clone)]
pub struct BoardStrategy {
  week_start: Weekday
}

impl BoardStrategy {
  pub fn new(week_start: Weekday) -> Self {
    Self {
      week_start
    }
  }

  /// Badge shown on a card, e.g. `W14`.
  pub fn due_badge(
    &self,
    task: &Task
  ) -> Option<String> {
    task.due_date().map(|date| {
      format!(
        "W{}",
        week_of_year(date, self.week_start)
      )
    })
  }
}

impl Default for BoardStrategy {
  fn default() -> Self {
    Self::new(Weekday::Sun)
  }
}

impl ViewStrategy for BoardStrategy {
  fn id(&self) -> ViewId {
    ViewId::Board
  }

  fn card_badge(
    &self,
    task: &Task
  ) -> Option<String> {
    self.due_badge(task)
  }

  fn partition(
    &self,
    tasks: &[Task],
    _ctx: &RenderContext
  ) -> Vec<Bucket> {
    let mut todo =
      Bucket::new(BucketKey::Todo, "To Do");
    let mut done = Bucket::new(
      BucketKey::Completed,
      "Completed"
    );
    for task in tasks {
      if task.completed {
        done.tasks.push(task.clone());
      } else {
        todo.tasks.push(task.clone());
      }
    }
    vec![todo, done]
  }

  fn bucket_of(
    &self,
    task: &Task,
    _ctx: &RenderContext
  ) -> Option<BucketKey> {
    Some(if task.completed {
      BucketKey::Completed
    } else {
      BucketKey::Todo
    })
  }

  fn on_reassign(
    &self,
    _task: &Task,
    bucket: &BucketKey
  ) -> Option<TaskPatch> {
    match bucket {
      | BucketKey::Todo => {
        Some(TaskPatch::completed(false))
      }
      | BucketKey::Completed => {
        Some(TaskPatch::completed(true))
      }
      | _ => None
    }
  }
}
