use chrono::Weekday;
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
use crate::calendar::{
  add_days,
  start_of_week
};
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct WeekStrategy {
  week_start: Weekday
}

impl WeekStrategy {
  pub fn new(week_start: Weekday) -> Self {
    Self {
      week_start
    }
  }

  pub fn week_start(&self) -> Weekday {
    self.week_start
  }
}

impl Default for WeekStrategy {
  fn default() -> Self {
    Self::new(Weekday::Mon)
  }
}

impl ViewStrategy for WeekStrategy {
  fn id(&self) -> ViewId {
    ViewId::CalendarWeek
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
    let start =
      start_of_week(ctx.focus, self.week_start);
    let mut buckets: Vec<Bucket> = (0..7)
      .map(|offset| {
        let date = add_days(start, offset);
        let mut bucket = Bucket::new(
          BucketKey::Day(date),
          date.format("%a %-d").to_string()
        );
        bucket.is_current = date == ctx.today;
        bucket
      })
      .collect();

    for task in tasks {
      let Some(date) = task.due_date() else {
        continue;
      };
      let offset = (date - start).num_days();
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

  #[test]
  fn seven_days_from_week_start() {
    // 2025-04-02 is a Wednesday
    let ctx = RenderContext {
      focus: day(2025, 4, 2),
      today: day(2025, 4, 3),
      now:   at(day(2025, 4, 3), 8, 0)
    };
    let tasks = vec![
      due_task(
        "late",
        at(day(2025, 4, 6), 17, 0),
        None
      ),
      due_task(
        "early",
        at(day(2025, 4, 6), 8, 0),
        None
      ),
      due_task(
        "next week",
        at(day(2025, 4, 7), 8, 0),
        None
      ),
      task("undated"),
    ];
    let buckets = WeekStrategy::default()
      .partition(&tasks, &ctx);

    assert_eq!(buckets.len(), 7);
    assert_eq!(
      buckets[0].key,
      BucketKey::Day(day(2025, 3, 31))
    );
    assert_eq!(buckets[0].label, "Mon 31");
    assert!(buckets[3].is_current);
    let sunday: Vec<&str> = buckets[6]
      .tasks
      .iter()
      .map(|t| t.title.as_str())
      .collect();
    assert_eq!(sunday, vec!["early", "late"]);
    let placed: usize =
      buckets.iter().map(Bucket::len).sum();
    assert_eq!(placed, 2);
  }

  #[test]
  fn sunday_start_shifts_columns() {
    let ctx = RenderContext {
      focus: day(2025, 4, 2),
      today: day(2025, 4, 2),
      now:   at(day(2025, 4, 2), 8, 0)
    };
    let buckets =
      WeekStrategy::new(Weekday::Sun)
        .partition(&[], &ctx);
    assert_eq!(
      buckets[0].key,
      BucketKey::Day(day(2025, 3, 30))
    );
  }

  #[test]
  fn drop_on_day_moves_date_only() {
    let task = due_task(
      "review",
      at(day(2025, 4, 1), 16, 0),
      Some(false)
    );
    let patch = WeekStrategy::default()
      .on_reassign(
        &task,
        &BucketKey::Day(day(2025, 4, 4))
      )
      .expect("day accepts drop");
    assert_eq!(
      patch.due_date,
      Some(Some(
        "2025-04-04T16:00:00".to_string()
      ))
    );
    assert_eq!(patch.is_all_day, None);
    assert_eq!(
      WeekStrategy::default()
        .on_reassign(&task, &BucketKey::Todo),
      None
    );
  }
}
