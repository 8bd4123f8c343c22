//! Small derived values the calendar screens show next to the buckets.

use chrono::{
  Datelike,
  NaiveDate,
  NaiveDateTime,
  Weekday
};

use super::Bucket;
use crate::calendar::{
  Granularity,
  add_days,
  first_day_of_month,
  last_day_of_month,
  period_range,
  start_of_week
};
use crate::task::Task;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct PeriodStats {
  pub total:     usize,
  pub completed: usize,
  pub pending:   usize
}

impl PeriodStats {
  fn push(&mut self, task: &Task) {
    self.total = self.total.saturating_add(1);
    if task.completed {
      self.completed =
        self.completed.saturating_add(1);
    } else {
      self.pending =
        self.pending.saturating_add(1);
    }
  }
}

/// Dated tasks whose due day falls inside the period around `focus`.
pub fn collect_period_tasks<'a>(
  tasks: &'a [Task],
  granularity: Granularity,
  focus: NaiveDate,
  week_start: Weekday
) -> Vec<&'a Task> {
  let (start, end) =
    period_range(granularity, focus, week_start);
  tasks
    .iter()
    .filter(|task| {
      task
        .due_date()
        .is_some_and(|day| day >= start && day <= end)
    })
    .collect()
}

pub fn summarize_period(
  tasks: &[Task],
  granularity: Granularity,
  focus: NaiveDate,
  week_start: Weekday
) -> PeriodStats {
  let mut stats = PeriodStats::default();
  for task in collect_period_tasks(
    tasks,
    granularity,
    focus,
    week_start
  ) {
    stats.push(task);
  }
  stats
}

/// First day of every grid row that overlaps the month of `focus`.
pub fn month_week_shortcuts(
  focus: NaiveDate,
  week_start: Weekday
) -> Vec<NaiveDate> {
  let first = first_day_of_month(
    focus.year(),
    focus.month()
  );
  let last = last_day_of_month(
    focus.year(),
    focus.month()
  );
  let mut cursor =
    start_of_week(first, week_start);
  let mut out = Vec::with_capacity(6);
  while cursor <= last {
    out.push(cursor);
    cursor = add_days(cursor, 7);
  }
  out
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellPreview<'a> {
  pub shown:    &'a [Task],
  pub overflow: usize
}

impl CellPreview<'_> {
  pub fn overflow_label(
    &self
  ) -> Option<String> {
    (self.overflow > 0)
      .then(|| format!("+{} more", self.overflow))
  }
}

/// The first `limit` tasks of a cell plus how many were left out.
pub fn cell_preview(
  bucket: &Bucket,
  limit: usize
) -> CellPreview<'_> {
  let capped = bucket.tasks.len().min(limit);
  CellPreview {
    shown:    &bucket.tasks[..capped],
    overflow: bucket
      .tasks
      .len()
      .saturating_sub(capped)
  }
}

/// Position of the "now" line in the day view as a fraction of the
/// visible hour rows. `None` when now is off screen.
pub fn current_time_indicator(
  now: NaiveDateTime,
  focus: NaiveDate,
  hour_start: u32,
  hour_end: u32
) -> Option<f64> {
  if now.date() != focus || hour_end < hour_start
  {
    return None;
  }
  let span =
    f64::from((hour_end + 1 - hour_start) * 60);
  let minutes = (now
    - focus.and_hms_opt(hour_start, 0, 0)?)
  .num_minutes() as f64;
  let fraction = minutes / span;
  (0.0..1.0)
    .contains(&fraction)
    .then_some(fraction)
}

/// Column headers starting at `week_start`.
pub fn weekday_labels(
  week_start: Weekday
) -> [&'static str; 7] {
  const NAMES: [&str; 7] = [
    "Mon", "Tue", "Wed", "Thu", "Fri", "Sat",
    "Sun"
  ];
  let offset =
    week_start.num_days_from_monday() as usize;
  std::array::from_fn(|i| NAMES[(offset + i) % 7])
}

pub fn due_time_label(
  task: &Task
) -> Option<String> {
  let due = task.due?;
  if due.all_day() == Some(true)
    || due.is_midnight()
  {
    Some("All day".to_string())
  } else {
    Some(due.at().format("%H:%M").to_string())
  }
}
