use std::sync::Arc;

use chrono::{
  DateTime,
  Duration,
  Utc
};
use parking_lot::Mutex;
use tasklane_shared::{
  TaskCreate,
  TaskPatch
};
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::clock::Clock;
use crate::datastore::TaskPersistence;
use crate::datetime::parse_due;
use crate::dnd::ReassignTarget;
use crate::error::{
  TaskError,
  TaskResult
};
use crate::task::{
  DueDate,
  Task,
  TaskId,
  normalize_tags
};

struct Inner<P> {
  tasks:       Vec<Task>,
  persistence: P
}

/// Sole owner of the canonical task collection.
///
/// Every write runs under one lock: clone, mutate, save the whole
/// collection, then swap. A failed save leaves memory untouched.
pub struct TaskStore<P> {
  inner: Mutex<Inner<P>>,
  clock: Arc<dyn Clock>
}

impl<P: TaskPersistence> TaskStore<P> {
  #[instrument(skip_all)]
  pub fn open(
    persistence: P,
    clock: Arc<dyn Clock>
  ) -> TaskResult<Self> {
    let tasks = persistence.load_all()?;
    info!(count = tasks.len(), "task store ready");
    Ok(Self {
      inner: Mutex::new(Inner {
        tasks,
        persistence
      }),
      clock
    })
  }

  pub fn clock(&self) -> &Arc<dyn Clock> {
    &self.clock
  }

  /// Snapshot in insertion order.
  pub fn list_all(&self) -> Vec<Task> {
    self.inner.lock().tasks.clone()
  }

  pub fn len(&self) -> usize {
    self.inner.lock().tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn get_by_id(
    &self,
    id: TaskId
  ) -> TaskResult<Task> {
    self
      .inner
      .lock()
      .tasks
      .iter()
      .find(|task| task.id == id)
      .cloned()
      .ok_or(TaskError::NotFound(id))
  }

  #[instrument(skip(self, create), fields(title = %create.title))]
  pub fn create(
    &self,
    create: TaskCreate
  ) -> TaskResult<Task> {
    let title = validate_title(&create.title)?;
    let due = match create.due_date.as_deref() {
      | Some(raw) => {
        Some(DueDate::new(
          parse_due_input(raw)?,
          create.is_all_day
        ))
      }
      | None if create.is_all_day == Some(true) => {
        return Err(TaskError::validation(
          "an all-day task needs a due date"
        ));
      }
      | None => None
    };

    let mut task = Task::new(title, self.clock.now());
    task.completed = create.completed;
    task.tags = normalize_tags(create.tags);
    task.due = due;

    let created = task.clone();
    self.commit(move |tasks| {
      tasks.push(task);
      Ok(())
    })?;
    info!(id = %created.id, "created task");
    Ok(created)
  }

  #[instrument(skip(self, patch), fields(id = %id))]
  pub fn update(
    &self,
    id: TaskId,
    patch: TaskPatch
  ) -> TaskResult<Task> {
    let updated = self.modify(id, |task| {
      apply_patch(task, patch)
    })?;
    debug!(completed = updated.completed, "updated task");
    Ok(updated)
  }

  /// Flips completion against the stored value, inside the same
  /// critical section as the write.
  #[instrument(skip(self), fields(id = %id))]
  pub fn toggle_completed(
    &self,
    id: TaskId
  ) -> TaskResult<Task> {
    let toggled = self.modify(id, |task| {
      task.completed = !task.completed;
      Ok(())
    })?;
    debug!(completed = toggled.completed, "toggled task");
    Ok(toggled)
  }

  /// Removes the task for good. Unknown ids are reported, not ignored.
  #[instrument(skip(self), fields(id = %id))]
  pub fn delete(
    &self,
    id: TaskId
  ) -> TaskResult<()> {
    self.commit(|tasks| {
      let idx = tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(TaskError::NotFound(id))?;
      tasks.remove(idx);
      Ok(())
    })?;
    info!("deleted task");
    Ok(())
  }

  /// Replaces memory with whatever persistence currently holds.
  #[instrument(skip(self))]
  pub fn reload(&self) -> TaskResult<()> {
    let mut inner = self.inner.lock();
    let tasks = inner.persistence.load_all()?;
    debug!(
      before = inner.tasks.len(),
      after = tasks.len(),
      "reloaded tasks"
    );
    inner.tasks = tasks;
    Ok(())
  }

  /// Edits one task in place and stamps `updated_at`.
  fn modify(
    &self,
    id: TaskId,
    edit: impl FnOnce(&mut Task) -> TaskResult<()>
  ) -> TaskResult<Task> {
    let now = self.clock.now();
    self.commit(|tasks| {
      let task = find_mut(tasks, id)?;
      let mut next = task.clone();
      edit(&mut next)?;
      next.updated_at =
        next_updated_at(task.updated_at, now);
      *task = next.clone();
      Ok(next)
    })
  }

  /// Runs `change` against a copy of the collection and persists it
  /// before making it visible.
  fn commit<T>(
    &self,
    change: impl FnOnce(&mut Vec<Task>) -> TaskResult<T>
  ) -> TaskResult<T> {
    let mut inner = self.inner.lock();
    let mut next = inner.tasks.clone();
    let out = change(&mut next)?;
    if let Err(err) =
      inner.persistence.save_all(&next)
    {
      warn!(error = %format!("{err:#}"), "save failed; keeping previous state");
      return Err(TaskError::Persistence(err));
    }
    inner.tasks = next;
    Ok(out)
  }
}

impl<P: TaskPersistence> ReassignTarget
  for TaskStore<P>
{
  fn lookup(
    &self,
    id: TaskId
  ) -> TaskResult<Task> {
    self.get_by_id(id)
  }

  fn apply(
    &self,
    id: TaskId,
    patch: TaskPatch
  ) -> TaskResult<Task> {
    self.update(id, patch)
  }
}

fn find_mut(
  tasks: &mut [Task],
  id: TaskId
) -> TaskResult<&mut Task> {
  tasks
    .iter_mut()
    .find(|task| task.id == id)
    .ok_or(TaskError::NotFound(id))
}

fn validate_title(
  raw: &str
) -> TaskResult<String> {
  let title = raw.trim();
  if title.is_empty() {
    return Err(TaskError::validation(
      "title cannot be empty"
    ));
  }
  Ok(title.to_string())
}

fn parse_due_input(
  raw: &str
) -> TaskResult<chrono::NaiveDateTime> {
  parse_due(raw).map_err(|err| {
    TaskError::validation(err.to_string())
  })
}

fn apply_patch(
  task: &mut Task,
  patch: TaskPatch
) -> TaskResult<()> {
  if let Some(title) = patch.title {
    task.title = validate_title(&title)?;
  }
  if let Some(completed) = patch.completed {
    task.completed = completed;
  }
  if let Some(tags) = patch.tags {
    task.tags = normalize_tags(tags);
  }

  if let Some(due) = patch.due_date {
    task.due = match due {
      | Some(raw) => {
        let keep_flag = task
          .due
          .and_then(|due| due.all_day());
        Some(DueDate::new(
          parse_due_input(&raw)?,
          keep_flag
        ))
      }
      | None => None
    };
  }

  if let Some(all_day) = patch.is_all_day {
    match task.due {
      | Some(due) => {
        task.due =
          Some(DueDate::new(due.at(), all_day));
      }
      | None if all_day == Some(true) => {
        return Err(TaskError::validation(
          "an all-day task needs a due date"
        ));
      }
      | None => {}
    }
  }
  Ok(())
}

/// `updated_at` must move forward even when the clock has not.
fn next_updated_at(
  previous: DateTime<Utc>,
  now: DateTime<Utc>
) -> DateTime<Utc> {
  if now > previous {
    now
  } else {
    previous + Duration::milliseconds(1)
  }
}
