//! View strategies.
//!
//! Each presentation (list, board, calendar day/week/month) is a
//! [`ViewStrategy`]: it partitions the canonical task collection into
//! buckets and knows which mutation a drop onto one of its buckets means.
//! The orchestrator never branches on the view itself; it resolves the
//! strategy from the [`ViewRegistry`] and calls through the trait.

mod board;
mod calendar_day;
mod calendar_month;
mod calendar_week;
mod list;
mod presentation;
mod registry;

use std::fmt;

use chrono::{
  NaiveDate,
  NaiveDateTime
};
use tasklane_shared::TaskPatch;

pub use self::board::BoardStrategy;
pub use self::calendar_day::{
  DaySlot,
  DayStrategy
};
pub use self::calendar_month::MonthStrategy;
pub use self::calendar_week::WeekStrategy;
pub use self::list::{
  ListOrder,
  ListStrategy,
  TaskComparator
};
pub use self::presentation::{
  CellPreview,
  PeriodStats,
  cell_preview,
  collect_period_tasks,
  current_time_indicator,
  due_time_label,
  month_week_shortcuts,
  summarize_period,
  weekday_labels
};
pub use self::registry::ViewRegistry;
use crate::calendar::Granularity;
use crate::datetime::format_due;
use crate::task::{
  Task,
  TaskId
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
pub enum ViewId {
  List,
  Board,
  CalendarDay,
  CalendarWeek,
  CalendarMonth
}

impl ViewId {
  pub fn all() -> [Self; 5] {
    [
      Self::List,
      Self::Board,
      Self::CalendarDay,
      Self::CalendarWeek,
      Self::CalendarMonth
    ]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::List => "list",
      | Self::Board => "board",
      | Self::CalendarDay => {
        "calendar-day"
      }
      | Self::CalendarWeek => {
        "calendar-week"
      }
      | Self::CalendarMonth => {
        "calendar-month"
      }
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::List => "List",
      | Self::Board => "Board",
      | Self::CalendarDay => "Day",
      | Self::CalendarWeek => "Week",
      | Self::CalendarMonth => "Month"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key.trim() {
      | "list" => Some(Self::List),
      | "board" | "kanban" => {
        Some(Self::Board)
      }
      | "calendar-day" | "day" => {
        Some(Self::CalendarDay)
      }
      | "calendar-week" | "week" => {
        Some(Self::CalendarWeek)
      }
      | "calendar-month" | "month"
      | "calendar" => {
        Some(Self::CalendarMonth)
      }
      | _ => None
    }
  }

  /// Navigation granularity for calendar views; `None` for list and board.
  pub fn granularity(
    self
  ) -> Option<Granularity> {
    match self {
      | Self::CalendarDay => {
        Some(Granularity::Day)
      }
      | Self::CalendarWeek => {
        Some(Granularity::Week)
      }
      | Self::CalendarMonth => {
        Some(Granularity::Month)
      }
      | Self::List | Self::Board => None
    }
  }

  pub fn is_calendar(self) -> bool {
    self.granularity().is_some()
  }
}

impl fmt::Display for ViewId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

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
pub enum BucketKey {
  All,
  Todo,
  Completed,
  AllDay,
  Hour(u32),
  Day(NaiveDate)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
  pub key:            BucketKey,
  pub label:          String,
  /// Today for day cells, the current hour for day-view rows.
  pub is_current:     bool,
  /// Month grid padding days from the neighbouring months.
  pub outside_period: bool,
  pub tasks:          Vec<Task>
}

impl Bucket {
  pub fn new(
    key: BucketKey,
    label: impl Into<String>
  ) -> Self {
    Self {
      key,
      label: label.into(),
      is_current: false,
      outside_period: false,
      tasks: Vec::new()
    }
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }

  pub fn contains(
    &self,
    id: TaskId
  ) -> bool {
    self.tasks.iter().any(|t| t.id == id)
  }
}

/// Inputs a strategy needs besides the tasks themselves.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct RenderContext {
  pub focus: NaiveDate,
  pub today: NaiveDate,
  pub now:   NaiveDateTime
}

pub trait ViewStrategy: Send + Sync {
  fn id(&self) -> ViewId;

  fn partition(
    &self,
    tasks: &[Task],
    ctx: &RenderContext
  ) -> Vec<Bucket>;

  fn item_key(
    &self,
    task: &Task
  ) -> TaskId {
    task.id
  }

  /// The bucket `task` belongs to, independent of which buckets the
  /// current period renders. `None` when the view never shows it.
  fn bucket_of(
    &self,
    task: &Task,
    ctx: &RenderContext
  ) -> Option<BucketKey>;

  /// The single mutation a drop of `task` onto `bucket` stands for, or
  /// `None` when this view does not accept that bucket.
  fn on_reassign(
    &self,
    task: &Task,
    bucket: &BucketKey
  ) -> Option<TaskPatch>;

  /// Short text drawn on the task's card.
  fn card_badge(
    &self,
    _task: &Task
  ) -> Option<String> {
    None
  }
}

/// Moves a task to another calendar day, keeping its time of day. An
/// unscheduled task lands on that day as an all-day entry.
pub(crate) fn move_to_day(
  task: &Task,
  day: NaiveDate
) -> TaskPatch {
  match task.due {
    | Some(due) => {
      TaskPatch {
        due_date: Some(Some(format_due(
          day.and_time(due.at().time())
        ))),
        ..TaskPatch::default()
      }
    }
    | None => {
      TaskPatch {
        due_date:   Some(Some(format_due(
          day.and_time(
            chrono::NaiveTime::MIN
          )
        ))),
        is_all_day: Some(Some(true)),
        ..TaskPatch::default()
      }
    }
  }
}

/// Calendar buckets list tasks by due time, earliest first.
pub(crate) fn sort_by_due(
  tasks: &mut [Task]
) {
  tasks.sort_by_key(|task| {
    task.due.map(|due| due.at())
  });
}
