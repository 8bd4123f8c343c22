//! Navigation strips for the calendar views.
//!
//! A strip is a short, fixed-size run of periods (days, weeks or months)
//! around the reference date. The only state is the reference date plus
//! the granularity; every transition returns a new state.

use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};

use crate::calendar::{
  Granularity,
  add_days,
  is_today,
  is_tomorrow,
  is_yesterday,
  same_period,
  shift_months,
  start_of_week,
  step
};

pub const DAY_WINDOW_SIZE: usize = 7;
pub const DAY_WINDOW_LEAD: i64 = 3;
pub const WEEK_WINDOW_SIZE: usize = 3;
pub const MONTH_WINDOW_SIZE: usize = 5;

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct NavLabel {
  pub upper: String,
  pub main:  String,
  pub lower: Option<String>
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct NavigationItem {
  pub date:        NaiveDate,
  pub label:       NavLabel,
  pub is_selected: bool,
  pub is_today:    bool
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct NavigationState {
  reference:   NaiveDate,
  granularity: Granularity
}

impl NavigationState {
  pub fn new(
    reference: NaiveDate,
    granularity: Granularity
  ) -> Self {
    Self {
      reference,
      granularity
    }
  }

  pub fn reference(&self) -> NaiveDate {
    self.reference
  }

  pub fn granularity(
    &self
  ) -> Granularity {
    self.granularity
  }

  #[must_use]
  pub fn navigate_previous(self) -> Self {
    Self {
      reference: step(
        self.reference,
        self.granularity,
        -1
      ),
      ..self
    }
  }

  #[must_use]
  pub fn navigate_next(self) -> Self {
    Self {
      reference: step(
        self.reference,
        self.granularity,
        1
      ),
      ..self
    }
  }

  #[must_use]
  pub fn jump_to_today(
    self,
    today: NaiveDate
  ) -> Self {
    Self {
      reference: today,
      ..self
    }
  }

  #[must_use]
  pub fn select_item(
    self,
    date: NaiveDate
  ) -> Self {
    Self {
      reference: date,
      ..self
    }
  }

  /// Switching granularity keeps the reference date so day/week/month
  /// views stay on the same spot.
  #[must_use]
  pub fn with_granularity(
    self,
    granularity: Granularity
  ) -> Self {
    Self {
      granularity,
      ..self
    }
  }

  pub fn window(
    &self,
    today: NaiveDate,
    week_start: Weekday
  ) -> Vec<NavigationItem> {
    navigation_window(
      self.reference,
      self.granularity,
      today,
      week_start
    )
  }
}

pub fn navigation_window(
  reference: NaiveDate,
  granularity: Granularity,
  today: NaiveDate,
  week_start: Weekday
) -> Vec<NavigationItem> {
  match granularity {
    | Granularity::Day => {
      day_window(reference, today)
    }
    | Granularity::Week => {
      week_window(
        reference, today, week_start
      )
    }
    | Granularity::Month => {
      month_window(reference, today)
    }
  }
}

fn day_window(
  reference: NaiveDate,
  today: NaiveDate
) -> Vec<NavigationItem> {
  let start =
    add_days(reference, -DAY_WINDOW_LEAD);
  (0..DAY_WINDOW_SIZE as i64)
    .map(|offset| {
      let date = add_days(start, offset);
      let lower = if is_today(date, today)
      {
        Some("Today")
      } else if is_yesterday(date, today) {
        Some("Yesterday")
      } else if is_tomorrow(date, today) {
        Some("Tomorrow")
      } else {
        None
      };

      NavigationItem {
        date,
        label: NavLabel {
          upper: date
            .format("%a")
            .to_string(),
          main:  date
            .format("%b %-d")
            .to_string(),
          lower: lower.map(str::to_string)
        },
        is_selected: date == reference,
        is_today: is_today(date, today)
      }
    })
    .collect()
}

fn week_window(
  reference: NaiveDate,
  today: NaiveDate,
  week_start: Weekday
) -> Vec<NavigationItem> {
  let today_week =
    start_of_week(today, week_start);
  let half = (WEEK_WINDOW_SIZE / 2) as i64;

  (-half..=half)
    .map(|offset| {
      let date =
        add_days(reference, offset * 7);
      let week = start_of_week(
        date, week_start
      );
      let week_end = add_days(week, 6);
      let relative =
        (week - today_week).num_days() / 7;
      let lower = match relative {
        | -1 => Some("Last Week"),
        | 0 => Some("This Week"),
        | 1 => Some("Next Week"),
        | _ => None
      };

      NavigationItem {
        date,
        label: NavLabel {
          upper: week
            .format("%Y")
            .to_string(),
          main:  format!(
            "{} - {}",
            week.format("%b %-d"),
            week_end.format("%b %-d")
          ),
          lower: lower.map(str::to_string)
        },
        is_selected: offset == 0,
        is_today: same_period(
          date,
          today,
          Granularity::Week,
          week_start
        )
      }
    })
    .collect()
}

fn month_window(
  reference: NaiveDate,
  today: NaiveDate
) -> Vec<NavigationItem> {
  let half = (MONTH_WINDOW_SIZE / 2) as i32;
  let today_index = month_index(today);

  (-half..=half)
    .map(|offset| {
      let date =
        shift_months(reference, offset);
      let lower = match month_index(date)
        - today_index
      {
        | -1 => Some("Last Month"),
        | 0 => Some("This Month"),
        | 1 => Some("Next Month"),
        | _ => None
      };

      NavigationItem {
        date,
        label: NavLabel {
          upper: date
            .format("%Y")
            .to_string(),
          main:  date
            .format("%b")
            .to_string(),
          lower: lower.map(str::to_string)
        },
        is_selected: offset == 0,
        is_today: month_index(date)
          == today_index
      }
    })
    .collect()
}

fn month_index(date: NaiveDate) -> i64 {
  date.year() as i64 * 12
    + date.month0() as i64
}

/// Narrows a strip to `count` items. The subset is centered unless that
/// would hide the selected item, in which case it is re-centered on it.
pub fn visible_window(
  items: &[NavigationItem],
  count: usize
) -> &[NavigationItem] {
  if items.is_empty() {
    return items;
  }
  let count = count.clamp(1, items.len());
  let max_start = items.len() - count;
  let mut start = max_start / 2;

  if let Some(selected) = items
    .iter()
    .position(|item| item.is_selected)
    && (selected < start
      || selected >= start + count)
  {
    start = selected
      .saturating_sub(count / 2)
      .min(max_start);
  }

  &items[start..start + count]
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct WidthBreakpoints {
  pub compact: u32,
  pub medium:  u32
}

impl Default for WidthBreakpoints {
  fn default() -> Self {
    Self {
      compact: 480,
      medium:  768
    }
  }
}

pub fn visible_count_for_width(
  width: u32,
  breakpoints: WidthBreakpoints
) -> usize {
  if width < breakpoints.compact {
    3
  } else if width < breakpoints.medium {
    5
  } else {
    7
  }
}

pub fn period_title(
  granularity: Granularity,
  focus: NaiveDate,
  week_start: Weekday
) -> String {
  match granularity {
    | Granularity::Month => {
      format!(
        "Month View {}",
        focus.format("%B %Y")
      )
    }
    | Granularity::Week => {
      let start =
        start_of_week(focus, week_start);
      let end = add_days(start, 6);
      format!(
        "Week View {} - {}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
      )
    }
    | Granularity::Day => {
      format!(
        "Day View {}",
        focus.format("%A, %Y-%m-%d")
      )
    }
  }
}
