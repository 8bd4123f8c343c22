use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tasklane_shared::TaskPatch;

use super::{
  Bucket,
  BucketKey,
  RenderContext,
  ViewId,
  ViewStrategy
};
use crate::task::Task;

pub type TaskComparator = Arc<
  dyn Fn(&Task, &Task) -> Ordering
    + Send
    + Sync
>;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ListOrder {
  #[default]
  Insertion,
  DueDate,
  Title,
  Created
}

impl ListOrder {
  /// `None` keeps store order.
  pub fn comparator(
    self
  ) -> Option<TaskComparator> {
    let comparator: TaskComparator =
      match self {
        | Self::Insertion => return None,
        | Self::DueDate => {
          Arc::new(compare_due)
        }
        | Self::Title => {
          Arc::new(|a: &Task, b: &Task| {
            a.title
              .to_lowercase()
              .cmp(&b.title.to_lowercase())
          })
        }
        | Self::Created => {
          Arc::new(|a: &Task, b: &Task| {
            a.created_at.cmp(&b.created_at)
          })
        }
      };
    Some(comparator)
  }
}

/// Dated tasks first, earliest due first; undated keep their relative
/// order at the end.
fn compare_due(
  a: &Task,
  b: &Task
) -> Ordering {
  match (a.due, b.due) {
    | (Some(a), Some(b)) => {
      a.at().cmp(&b.at())
    }
    | (Some(_), None) => Ordering::Less,
    | (None, Some(_)) => {
      Ordering::Greater
    }
    | (None, None) => Ordering::Equal
  }
}

#[derive(Clone, Default)]
pub struct ListStrategy {
  comparator: Option<TaskComparator>
}

impl ListStrategy {
  pub fn new(order: ListOrder) -> Self {
    Self {
      comparator: order.comparator()
    }
  }

  pub fn with_comparator(
    comparator: TaskComparator
  ) -> Self {
    Self {
      comparator: Some(comparator)
    }
  }
}

impl fmt::Debug for ListStrategy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("ListStrategy")
      .field(
        "sorted",
        &self.comparator.is_some()
      )
      .finish()
  }
}

impl ViewStrategy for ListStrategy {
  fn id(&self) -> ViewId {
    ViewId::List
  }

  fn partition(
    &self,
    tasks: &[Task],
    _ctx: &RenderContext
  ) -> Vec<Bucket> {
    let mut bucket =
      Bucket::new(BucketKey::All, "All");
    bucket.tasks = tasks.to_vec();
    if let Some(comparator) =
      self.comparator.as_ref()
    {
      // stable, so ties keep store order
      bucket
        .tasks
        .sort_by(|a, b| comparator(a, b));
    }
    vec![bucket]
  }

  fn bucket_of(
    &self,
    _task: &Task,
    _ctx: &RenderContext
  ) -> Option<BucketKey> {
    Some(BucketKey::All)
  }

  fn on_reassign(
    &self,
    _task: &Task,
    _bucket: &BucketKey
  ) -> Option<TaskPatch> {
    None
  }
}
