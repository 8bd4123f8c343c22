use std::fmt;

use anyhow::Context;
use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  Timelike,
  Utc
};
use tasklane_shared::TaskRecord;
use uuid::Uuid;

use crate::datetime::{
  format_due,
  format_timestamp,
  parse_due_lenient,
  parse_timestamp
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct TaskId(Uuid);

impl TaskId {
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }

  pub fn as_uuid(&self) -> Uuid {
    self.0
  }
}

impl Default for TaskId {
  fn default() -> Self {
    Self::new()
  }
}

impl From<Uuid> for TaskId {
  fn from(value: Uuid) -> Self {
    Self(value)
  }
}

impl fmt::Display for TaskId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// A scheduled point in local wall-clock time.
///
/// `all_day` is tri-state: `None` means the flag was never set and the
/// calendar falls back to its midnight/business-hour rules.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DueDate {
  at:      NaiveDateTime,
  all_day: Option<bool>
}

impl DueDate {
  pub fn new(
    at: NaiveDateTime,
    all_day: Option<bool>
  ) -> Self {
    Self {
      at: at
        .with_nanosecond(0)
        .unwrap_or(at),
      all_day
    }
  }

  pub fn at(&self) -> NaiveDateTime {
    self.at
  }

  pub fn date(&self) -> NaiveDate {
    self.at.date()
  }

  pub fn all_day(&self) -> Option<bool> {
    self.all_day
  }

  pub fn is_midnight(&self) -> bool {
    self.at.time().num_seconds_from_midnight()
      == 0
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
  pub id:         TaskId,
  pub title:      String,
  pub completed:  bool,
  pub tags:       Vec<String>,
  pub due:        Option<DueDate>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>
}

impl Task {
  pub fn new(
    title: String,
    now: DateTime<Utc>
  ) -> Self {
    Self {
      id: TaskId::new(),
      title,
      completed: false,
      tags: vec![],
      due: None,
      created_at: now,
      updated_at: now
    }
  }

  pub fn due_date(
    &self
  ) -> Option<NaiveDate> {
    self.due.map(|due| due.date())
  }

  pub fn is_due_on(
    &self,
    day: NaiveDate
  ) -> bool {
    self.due_date() == Some(day)
  }

  pub fn to_record(&self) -> TaskRecord {
    TaskRecord {
      id:         self.id.as_uuid(),
      title:      self.title.clone(),
      completed:  self.completed,
      tags:       self.tags.clone(),
      due_date:   self
        .due
        .map(|due| format_due(due.at())),
      is_all_day: self
        .due
        .and_then(|due| due.all_day()),
      created_at: format_timestamp(
        self.created_at
      ),
      updated_at: format_timestamp(
        self.updated_at
      )
    }
  }

  /// Rebuilds a task from its stored form. Broken timestamps are an error;
  /// a broken due date only drops the schedule.
  pub fn from_record(
    record: TaskRecord
  ) -> anyhow::Result<Self> {
    let created_at =
      parse_timestamp(&record.created_at)
        .with_context(|| {
          format!(
            "task {} createdAt",
            record.id
          )
        })?;
    let updated_at =
      parse_timestamp(&record.updated_at)
        .with_context(|| {
          format!(
            "task {} updatedAt",
            record.id
          )
        })?;

    let due = parse_due_lenient(
      record.due_date.as_deref()
    )
    .map(|at| {
      DueDate::new(at, record.is_all_day)
    });

    Ok(Self {
      id: TaskId::from(record.id),
      title: record.title,
      completed: record.completed,
      tags: record.tags,
      due,
      created_at,
      updated_at: updated_at
        .max(created_at)
    })
  }
}

/// Drops blank tags and repeats while keeping first-seen order.
pub fn normalize_tags(
  tags: Vec<String>
) -> Vec<String> {
  let mut out: Vec<String> =
    Vec::with_capacity(tags.len());
  for tag in tags {
    let trimmed = tag.trim();
    if trimmed.is_empty()
      || out.iter().any(|t| t == trimmed)
    {
      continue;
    }
    out.push(trimmed.to_string());
  }
  out
}
