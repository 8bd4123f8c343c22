use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};
use serde::Deserialize;

pub const MONTH_GRID_CELLS: usize = 42;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
  Day,
  Week,
  Month
}

impl Granularity {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Day => "day",
      | Self::Week => "week",
      | Self::Month => "month"
    }
  }
}

/// Parses a configured week start. Only "sunday" moves it off Monday.
pub fn week_start_day(
  raw: &str
) -> Weekday {
  if raw
    .trim()
    .eq_ignore_ascii_case("sunday")
  {
    Weekday::Sun
  } else {
    Weekday::Mon
  }
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

/// Moves by whole months, clamping the day so Jan 31 + 1 lands on the last
/// day of February.
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let total = date.year() as i64 * 12
    + date.month0() as i64
    + months as i64;
  let year = total.div_euclid(12) as i32;
  let month =
    total.rem_euclid(12) as u32 + 1;

  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

pub fn end_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  add_days(
    start_of_week(day, week_start),
    6
  )
}

pub fn is_today(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  date == today
}

pub fn is_yesterday(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  date == add_days(today, -1)
}

pub fn is_tomorrow(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  date == add_days(today, 1)
}

/// Steps `date` by `steps` periods of the given granularity.
pub fn step(
  date: NaiveDate,
  granularity: Granularity,
  steps: i64
) -> NaiveDate {
  match granularity {
    | Granularity::Day => {
      add_days(date, steps)
    }
    | Granularity::Week => {
      add_days(date, steps * 7)
    }
    | Granularity::Month => {
      shift_months(date, steps as i32)
    }
  }
}

/// The 6x7 grid shown by the month view: leading days of the previous
/// month, the whole month, then trailing days so every row is full.
pub fn month_grid(
  month_date: NaiveDate,
  week_start: Weekday
) -> [NaiveDate; MONTH_GRID_CELLS] {
  let first = first_day_of_month(
    month_date.year(),
    month_date.month()
  );
  let grid_start =
    start_of_week(first, week_start);
  std::array::from_fn(|offset| {
    add_days(grid_start, offset as i64)
  })
}

/// Inclusive first and last day covered by the period containing `focus`.
pub fn period_range(
  granularity: Granularity,
  focus: NaiveDate,
  week_start: Weekday
) -> (NaiveDate, NaiveDate) {
  match granularity {
    | Granularity::Day => (focus, focus),
    | Granularity::Week => {
      let start =
        start_of_week(focus, week_start);
      (start, add_days(start, 6))
    }
    | Granularity::Month => {
      (
        first_day_of_month(
          focus.year(),
          focus.month()
        ),
        last_day_of_month(
          focus.year(),
          focus.month()
        )
      )
    }
  }
}

pub fn same_period(
  a: NaiveDate,
  b: NaiveDate,
  granularity: Granularity,
  week_start: Weekday
) -> bool {
  match granularity {
    | Granularity::Day => a == b,
    | Granularity::Week => {
      start_of_week(a, week_start)
        == start_of_week(b, week_start)
    }
    | Granularity::Month => {
      a.year() == b.year()
        && a.month() == b.month()
    }
  }
}

/// Week number within the year, counting the week that contains January 1
/// as week 1.
pub fn week_of_year(
  date: NaiveDate,
  week_start: Weekday
) -> u32 {
  let jan_first =
    first_day_of_month(date.year(), 1);
  let first_week_start =
    start_of_week(jan_first, week_start);
  let this_week_start =
    start_of_week(date, week_start);
  let weeks = (this_week_start
    - first_week_start)
    .num_days()
    / 7;
  weeks as u32 + 1
}
