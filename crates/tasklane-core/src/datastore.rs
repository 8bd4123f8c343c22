use std::fs;
use std::io::{
  BufRead,
  BufReader,
  ErrorKind,
  Write
};
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tasklane_shared::TaskRecord;
use tempfile::NamedTempFile;
use tracing::{
  debug,
  info
};

use crate::task::Task;

pub const TASKS_FILE: &str =
  "tasks.jsonl";

/// Where the canonical collection lives between runs. Always read and
/// written whole.
pub trait TaskPersistence: Send {
  fn load_all(
    &self
  ) -> anyhow::Result<Vec<Task>>;

  fn save_all(
    &mut self,
    tasks: &[Task]
  ) -> anyhow::Result<()>;
}

/// Keeps the collection in memory. Useful for tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
  tasks:      Vec<Task>,
  fail_saves: bool
}

impl MemoryPersistence {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_tasks(
    tasks: Vec<Task>
  ) -> Self {
    Self {
      tasks,
      fail_saves: false
    }
  }

  /// Makes every following save fail, to exercise rollback paths.
  pub fn fail_saves(
    &mut self,
    fail: bool
  ) {
    self.fail_saves = fail;
  }

  pub fn snapshot(&self) -> &[Task] {
    &self.tasks
  }
}

impl TaskPersistence for MemoryPersistence {
  fn load_all(
    &self
  ) -> anyhow::Result<Vec<Task>> {
    Ok(self.tasks.clone())
  }

  fn save_all(
    &mut self,
    tasks: &[Task]
  ) -> anyhow::Result<()> {
    if self.fail_saves {
      return Err(anyhow!(
        "memory persistence is read-only"
      ));
    }
    self.tasks = tasks.to_vec();
    Ok(())
  }
}

/// One `TaskRecord` per line in `<data_dir>/tasks.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonlPersistence {
  path: PathBuf
}

impl JsonlPersistence {
  #[tracing::instrument(skip(data_dir))]
  pub fn open(
    data_dir: &Path
  ) -> anyhow::Result<Self> {
    fs::create_dir_all(data_dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          data_dir.display()
        )
      })?;
    let path = data_dir.join(TASKS_FILE);
    info!(
      file = %path.display(),
      exists = path.exists(),
      "opened task file"
    );
    Ok(Self {
      path
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl TaskPersistence for JsonlPersistence {
  #[tracing::instrument(skip(self), fields(file = %self.path.display()))]
  fn load_all(
    &self
  ) -> anyhow::Result<Vec<Task>> {
    load_jsonl(&self.path)
  }

  #[tracing::instrument(skip(self, tasks), fields(count = tasks.len()))]
  fn save_all(
    &mut self,
    tasks: &[Task]
  ) -> anyhow::Result<()> {
    save_jsonl_atomic(&self.path, tasks)
      .with_context(|| {
        format!(
          "failed to save {}",
          self.path.display()
        )
      })
  }
}

fn load_jsonl(
  path: &Path
) -> anyhow::Result<Vec<Task>> {
  let file = match fs::File::open(path) {
    | Ok(file) => file,
    | Err(err)
      if err.kind() == ErrorKind::NotFound =>
    {
      debug!(
        file = %path.display(),
        "no task file yet; starting empty"
      );
      return Ok(Vec::new());
    }
    | Err(err) => {
      return Err(err).with_context(|| {
        format!(
          "failed to open {}",
          path.display()
        )
      });
    }
  };

  let mut out = Vec::new();
  for (idx, line) in
    BufReader::new(file).lines().enumerate()
  {
    let line = line?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }
    let record: TaskRecord =
      serde_json::from_str(trimmed)
        .with_context(|| {
          format!(
            "failed parsing {} line {}",
            path.display(),
            idx + 1
          )
        })?;
    let task = Task::from_record(record)
      .with_context(|| {
        format!(
          "invalid task at {} line {}",
          path.display(),
          idx + 1
        )
      })?;
    out.push(task);
  }

  debug!(count = out.len(), "loaded tasks");
  Ok(out)
}

fn save_jsonl_atomic(
  path: &Path,
  tasks: &[Task]
) -> anyhow::Result<()> {
  debug!(
    file = %path.display(),
    count = tasks.len(),
    "saving jsonl atomically"
  );

  let dir = path
    .parent()
    .unwrap_or_else(|| Path::new("."));
  let mut temp = NamedTempFile::new_in(dir)?;
  for task in tasks {
    let serialized =
      serde_json::to_string(&task.to_record())?;
    writeln!(temp, "{serialized}")?;
  }
  temp.flush()?;

  temp.persist(path).map_err(|err| {
    anyhow!(
      "failed to persist {}: {}",
      path.display(),
      err
    )
  })?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    Utc
  };
  use tempfile::TempDir;

  use super::*;
  use crate::task::DueDate;

  fn sample() -> Vec<Task> {
    let mut first =
      Task::new("Write report".to_string(), Utc::now());
    first.tags = vec!["work".to_string()];
    first.due = NaiveDate::from_ymd_opt(2025, 4, 2)
      .and_then(|d| d.and_hms_opt(9, 30, 0))
      .map(|at| DueDate::new(at, Some(false)));
    let mut second =
      Task::new("Water plants".to_string(), Utc::now());
    second.completed = true;
    vec![first, second]
  }

  #[test]
  fn missing_file_loads_empty() {
    let temp = TempDir::new().expect("tempdir");
    let store = JsonlPersistence::open(temp.path())
      .expect("open");
    assert!(store.load_all().expect("load").is_empty());
    assert!(!store.path().exists());
  }

  #[test]
  fn save_then_load_preserves_order_and_fields() {
    let temp = TempDir::new().expect("tempdir");
    let mut store =
      JsonlPersistence::open(temp.path()).expect("open");
    let tasks = sample();
    store.save_all(&tasks).expect("save");

    let raw = fs::read_to_string(store.path())
      .expect("read file");
    assert_eq!(raw.lines().count(), 2);
    assert!(raw.contains("\"dueDate\":\"2025-04-02T09:30:00\""));

    let reopened =
      JsonlPersistence::open(temp.path()).expect("reopen");
    assert_eq!(reopened.load_all().expect("load"), tasks);
  }

  #[test]
  fn corrupt_line_is_reported_with_location() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(temp.path().join(TASKS_FILE), "\n{nope}\n")
      .expect("write");
    let store = JsonlPersistence::open(temp.path())
      .expect("open");
    let err = store.load_all().expect_err("corrupt");
    assert!(format!("{err:#}").contains("line 2"));
  }

  #[test]
  fn memory_persistence_can_refuse_saves() {
    let mut store = MemoryPersistence::with_tasks(sample());
    store.fail_saves(true);
    assert!(store.save_all(&[]).is_err());
    assert_eq!(store.snapshot().len(), 2);
  }
}
