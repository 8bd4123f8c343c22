use std::time::{
  Duration,
  Instant
};

/// Coalesces a burst of values into the last one, released once the input
/// has been quiet for `quiet`.
///
/// The caller owns the timer: it pushes events as they arrive and polls
/// whenever its own timer fires.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
  quiet:   Duration,
  pending: Option<(T, Instant)>
}

impl<T> Debouncer<T> {
  pub fn new(quiet: Duration) -> Self {
    Self {
      quiet,
      pending: None
    }
  }

  pub fn push(
    &mut self,
    value: T,
    at: Instant
  ) {
    self.pending = Some((value, at));
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// Instant at which the pending value becomes ready, if any.
  pub fn deadline(
    &self
  ) -> Option<Instant> {
    self
      .pending
      .as_ref()
      .map(|(_, at)| *at + self.quiet)
  }

  pub fn poll(
    &mut self,
    now: Instant
  ) -> Option<T> {
    let ready = self
      .deadline()
      .is_some_and(|deadline| {
        now >= deadline
      });
    if ready {
      self
        .pending
        .take()
        .map(|(value, _)| value)
    } else {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn burst_collapses_to_last_value() {
    let start = Instant::now();
    let mut debouncer =
      Debouncer::new(Duration::from_millis(
        150
      ));

    for (step, width) in
      [900_u32, 700, 520, 480]
        .into_iter()
        .enumerate()
    {
      debouncer.push(
        width,
        start
          + Duration::from_millis(
            step as u64 * 20
          )
      );
    }

    assert_eq!(
      debouncer.poll(
        start + Duration::from_millis(100)
      ),
      None
    );
    assert_eq!(
      debouncer.poll(
        start + Duration::from_millis(210)
      ),
      Some(480)
    );
    assert!(!debouncer.is_pending());
    assert_eq!(
      debouncer.poll(
        start + Duration::from_secs(5)
      ),
      None
    );
  }

  #[test]
  fn new_event_restarts_quiet_period() {
    let start = Instant::now();
    let mut debouncer =
      Debouncer::new(Duration::from_millis(
        100
      ));
    debouncer.push(1, start);
    debouncer.push(
      2,
      start + Duration::from_millis(90)
    );
    assert_eq!(
      debouncer.poll(
        start + Duration::from_millis(120)
      ),
      None
    );
    assert_eq!(
      debouncer.deadline(),
      Some(
        start + Duration::from_millis(190)
      )
    );
  }
}
