use chrono::{
  DateTime,
  Duration,
  NaiveDate,
  NaiveDateTime,
  Utc
};
use chrono_tz::Tz;
use parking_lot::Mutex;

/// Source of "now". Everything time-dependent goes through this so tests
/// can pin the date.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

#[derive(Debug)]
pub struct FixedClock {
  now: Mutex<DateTime<Utc>>
}

impl FixedClock {
  pub fn new(
    now: DateTime<Utc>
  ) -> Self {
    Self {
      now: Mutex::new(now)
    }
  }

  pub fn set(
    &self,
    now: DateTime<Utc>
  ) {
    *self.now.lock() = now;
  }

  pub fn advance(
    &self,
    by: Duration
  ) {
    let mut now = self.now.lock();
    *now += by;
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock()
  }
}

#[must_use]
pub fn local_now(
  clock: &dyn Clock,
  timezone: Tz
) -> NaiveDateTime {
  clock
    .now()
    .with_timezone(&timezone)
    .naive_local()
}

#[must_use]
pub fn local_today(
  clock: &dyn Clock,
  timezone: Tz
) -> NaiveDate {
  local_now(clock, timezone).date()
}

/// Decides when the once-a-minute "now" refresh should re-render.
///
/// Only the today/yesterday/tomorrow labels and the current-time indicator
/// depend on it, so it never touches task data.
#[derive(Debug, Clone)]
pub struct NowTicker {
  interval:      Duration,
  last_rendered: Option<NaiveDateTime>
}

impl NowTicker {
  pub fn new(interval: Duration) -> Self {
    Self {
      interval:      interval
        .max(Duration::seconds(1)),
      last_rendered: None
    }
  }

  /// Returns true when `now` falls in a later refresh slot than the last
  /// render.
  pub fn tick(
    &mut self,
    now: NaiveDateTime
  ) -> bool {
    let slot = self.slot_of(now);
    match self.last_rendered {
      | Some(previous)
        if self.slot_of(previous)
          == slot =>
      {
        false
      }
      | _ => {
        self.last_rendered = Some(now);
        true
      }
    }
  }

  fn slot_of(
    &self,
    at: NaiveDateTime
  ) -> i64 {
    at.and_utc().timestamp().div_euclid(
      self.interval.num_seconds()
    )
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn fixed_clock_advances() {
    let start = Utc
      .with_ymd_and_hms(
        2025, 4, 1, 8, 0, 0
      )
      .single()
      .expect("valid now");
    let clock = FixedClock::new(start);
    clock.advance(Duration::minutes(5));
    assert_eq!(
      clock.now(),
      start + Duration::minutes(5)
    );
  }

  #[test]
  fn local_today_uses_timezone() {
    let clock = FixedClock::new(
      Utc
        .with_ymd_and_hms(
          2025, 4, 1, 3, 0, 0
        )
        .single()
        .expect("valid now")
    );
    let today = local_today(
      &clock,
      chrono_tz::America::Mexico_City
    );
    assert_eq!(
      today,
      NaiveDate::from_ymd_opt(
        2025, 3, 31
      )
      .expect("valid date")
    );
  }

  #[test]
  fn ticker_fires_once_per_minute() {
    let mut ticker =
      NowTicker::new(Duration::minutes(1));
    let base = NaiveDate::from_ymd_opt(
      2025, 4, 1
    )
    .and_then(|d| d.and_hms_opt(9, 0, 5))
    .expect("valid time");

    assert!(ticker.tick(base));
    assert!(!ticker.tick(
      base + Duration::seconds(30)
    ));
    assert!(ticker.tick(
      base + Duration::seconds(60)
    ));
  }
}
