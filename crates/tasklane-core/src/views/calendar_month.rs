use chrono::{
  Datelike,
  Weekday
};
use tasklane_shared::TaskPatch;

use super::{
  Bucket,
  BucketKey,
  RenderContext,
  ViewId,
  ViewStrategy,
  due_time_label,
  move_to_day,
  sort_by_due
};
use crate::calendar::month_grid;
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct MonthStrategy {
  week_start: Weekday
}

impl MonthStrategy {
  pub fn new(week_start: Weekday) -> Self {
    Self {
      week_start
    }
  }
}

impl Default for MonthStrategy {
  fn default() -> Self {
    Self::new(Weekday::Mon)
  }
}

impl ViewStrategy for MonthStrategy {
  fn id(&self) -> ViewId {
    ViewId::CalendarMonth
  }

  fn card_badge(
    &self,
    task: &Task
  ) -> Option<String> {
    due_time_label(task)
  }

  fn partition(
    &self,
    tasks: &[Task],
    ctx: &RenderContext
  ) -> Vec<Bucket> {
    let grid =
      month_grid(ctx.focus, self.week_start);
    let grid_start = grid[0];

    let mut buckets: Vec<Bucket> = grid
      .iter()
      .map(|date| {
        let mut bucket = Bucket::new(
          BucketKey::Day(*date),
          date.day().to_string()
        );
        bucket.is_current = *date == ctx.today;
        bucket.outside_period = date.month()
          != ctx.focus.month()
          || date.year() != ctx.focus.year();
        bucket
      })
      .collect();

    for task in tasks {
      let Some(date) = task.due_date() else {
        continue;
      };
      let offset =
        (date - grid_start).num_days();
      if let Ok(idx) = usize::try_from(offset)
        && let Some(bucket) =
          buckets.get_mut(idx)
      {
        bucket.tasks.push(task.clone());
      }
    }
    for bucket in &mut buckets {
      sort_by_due(&mut bucket.tasks);
    }
    buckets
  }

  fn bucket_of(
    &self,
    task: &Task,
    _ctx: &RenderContext
  ) -> Option<BucketKey> {
    task.due_date().map(BucketKey::Day)
  }

  fn on_reassign(
    &self,
    task: &Task,
    bucket: &BucketKey
  ) -> Option<TaskPatch> {
    match *bucket {
      | BucketKey::Day(date) => {
        Some(move_to_day(task, date))
      }
      | _ => None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::views::testing::*;

  fn ctx() -> RenderContext {
    RenderContext {
      focus: day(2025, 3, 14),
      today: day(2025, 3, 14),
      now:   at(day(2025, 3, 14), 12, 0)
    }
  }

  #[test]
  fn grid_has_42_cells_with_padding_flags() {
    let buckets = MonthStrategy::default()
      .partition(&[], &ctx());
    assert_eq!(buckets.len(), 42);
    assert_eq!(
      buckets[0].key,
      BucketKey::Day(day(2025, 2, 24))
    );
    assert!(buckets[0].outside_period);
    // March 1 is the sixth cell
    assert!(!buckets[5].outside_period);
    assert_eq!(buckets[5].label, "1");
    assert!(buckets[41].outside_period);
    assert_eq!(
      buckets
        .iter()
        .filter(|b| b.is_current)
        .count(),
      1
    );
  }

  #[test]
  fn every_dated_task_lands_in_one_bucket() {
    let tasks = vec![
      due_task(
        "padding",
        at(day(2025, 2, 25), 9, 0),
        None
      ),
      due_task(
        "inside",
        at(day(2025, 3, 20), 0, 0),
        Some(true)
      ),
      due_task(
        "far",
        at(day(2025, 6, 1), 9, 0),
        None
      ),
      task("undated"),
    ];
    let strategy = MonthStrategy::default();
    let buckets =
      strategy.partition(&tasks, &ctx());

    for task in &tasks {
      let holders = buckets
        .iter()
        .filter(|b| b.contains(task.id))
        .count();
      let expected = match task.title.as_str()
      {
        | "padding" | "inside" => 1,
        | _ => 0
      };
      assert_eq!(holders, expected, "{}", task.title);
    }

    assert_eq!(
      strategy.bucket_of(&tasks[2], &ctx()),
      Some(BucketKey::Day(day(2025, 6, 1)))
    );
    assert_eq!(
      strategy.bucket_of(&tasks[3], &ctx()),
      None
    );
  }

  #[test]
  fn drop_keeps_all_day_flag() {
    let task = due_task(
      "holiday",
      at(day(2025, 3, 3), 0, 0),
      Some(true)
    );
    let patch = MonthStrategy::default()
      .on_reassign(
        &task,
        &BucketKey::Day(day(2025, 3, 10))
      )
      .expect("day accepts drop");
    assert_eq!(
      patch.due_date,
      Some(Some(
        "2025-03-10T00:00:00".to_string()
      ))
    );
    assert_eq!(patch.is_all_day, None);
  }
}
