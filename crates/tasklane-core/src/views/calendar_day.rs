use chrono::{
  NaiveTime,
  Timelike
};
use tasklane_shared::TaskPatch;

use super::{
  Bucket,
  BucketKey,
  RenderContext,
  ViewId,
  ViewStrategy,
  due_time_label,
  sort_by_due
};
use crate::datetime::format_due;
use crate::task::Task;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DaySlot {
  AllDay,
  Hour(u32)
}

impl From<DaySlot> for BucketKey {
  fn from(slot: DaySlot) -> Self {
    match slot {
      | DaySlot::AllDay => BucketKey::AllDay,
      | DaySlot::Hour(hour) => {
        BucketKey::Hour(hour)
      }
    }
  }
}

/// Hour rows for `hour_start..=hour_end` below a single all-day row.
#[derive(Debug, Clone)]
pub struct DayStrategy {
  hour_start: u32,
  hour_end:   u32
}

impl DayStrategy {
  pub fn new(
    hour_start: u32,
    hour_end: u32
  ) -> Self {
    let hour_start = hour_start.clamp(1, 23);
    Self {
      hour_start,
      hour_end: hour_end
        .clamp(hour_start, 23)
    }
  }

  pub fn hours(
    &self
  ) -> std::ops::RangeInclusive<u32> {
    self.hour_start..=self.hour_end
  }

  /// Where a task sits in the day view. Undated, midnight, flagged
  /// all-day, and out-of-hours tasks all land in the all-day row.
  pub fn classify_slot(
    &self,
    task: &Task
  ) -> DaySlot {
    let Some(due) = task.due else {
      return DaySlot::AllDay;
    };
    if due.all_day() == Some(true)
      || due.is_midnight()
    {
      return DaySlot::AllDay;
    }
    let hour = due.at().hour();
    if self.hours().contains(&hour) {
      DaySlot::Hour(hour)
    } else {
      DaySlot::AllDay
    }
  }
}

impl Default for DayStrategy {
  fn default() -> Self {
    Self::new(6, 19)
  }
}

fn hour_label(hour: u32) -> String {
  format!("{hour:02}:00")
}

impl ViewStrategy for DayStrategy {
  fn id(&self) -> ViewId {
    ViewId::CalendarDay
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
    let viewing_today =
      ctx.focus == ctx.today;

    let mut all_day = Bucket::new(
      BucketKey::AllDay,
      "All day"
    );
    all_day.is_current = viewing_today;
    let mut buckets = vec![all_day];
    buckets.extend(self.hours().map(
      |hour| {
        let mut bucket = Bucket::new(
          BucketKey::Hour(hour),
          hour_label(hour)
        );
        bucket.is_current = viewing_today
          && ctx.now.hour() == hour;
        bucket
      }
    ));

    for task in tasks {
      let Some(key) =
        self.bucket_of(task, ctx)
      else {
        continue;
      };
      if let Some(bucket) = buckets
        .iter_mut()
        .find(|bucket| bucket.key == key)
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
    ctx: &RenderContext
  ) -> Option<BucketKey> {
    task
      .is_due_on(ctx.focus)
      .then(|| self.classify_slot(task).into())
  }

  fn on_reassign(
    &self,
    task: &Task,
    bucket: &BucketKey
  ) -> Option<TaskPatch> {
    let due = task.due?;
    match *bucket {
      | BucketKey::AllDay => {
        Some(TaskPatch {
          is_all_day: Some(Some(true)),
          ..TaskPatch::default()
        })
      }
      | BucketKey::Hour(hour)
        if self.hours().contains(&hour) =>
      {
        let time =
          NaiveTime::from_hms_opt(hour, 0, 0)?;
        Some(TaskPatch {
          due_date: Some(Some(format_due(
            due.date().and_time(time)
          ))),
          is_all_day: Some(Some(false)),
          ..TaskPatch::default()
        })
      }
      | _ => None
    }
  }
}
