use std::collections::BTreeMap;

use tracing::debug;

use super::{
  BoardStrategy,
  DayStrategy,
  ListStrategy,
  MonthStrategy,
  ViewId,
  ViewStrategy,
  WeekStrategy
};
use crate::config::Config;
use crate::error::ConfigurationError;

/// Maps each view id to the strategy that renders it.
#[derive(Default)]
pub struct ViewRegistry {
  strategies:
    BTreeMap<ViewId, Box<dyn ViewStrategy>>
}

impl ViewRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// All five built-in views wired from config.
  pub fn standard(config: &Config) -> Self {
    let calendar_week_start =
      config.calendar_week_start();
    let mut registry = Self::new();
    registry.register(Box::new(
      ListStrategy::new(config.list.order)
    ));
    registry.register(Box::new(
      BoardStrategy::new(
        config.board_week_start()
      )
    ));
    registry.register(Box::new(
      DayStrategy::new(
        config.day_view.hour_start,
        config.day_view.hour_end
      )
    ));
    registry.register(Box::new(
      WeekStrategy::new(calendar_week_start)
    ));
    registry.register(Box::new(
      MonthStrategy::new(calendar_week_start)
    ));
    registry
  }

  /// Installs `strategy` under its own id, replacing any previous one.
  pub fn register(
    &mut self,
    strategy: Box<dyn ViewStrategy>
  ) {
    let id = strategy.id();
    if self
      .strategies
      .insert(id, strategy)
      .is_some()
    {
      debug!(view = %id, "replaced view strategy");
    }
  }

  pub fn resolve(
    &self,
    id: ViewId
  ) -> Result<&dyn ViewStrategy, ConfigurationError>
  {
    self
      .strategies
      .get(&id)
      .map(|strategy| strategy.as_ref())
      .ok_or(ConfigurationError::Unregistered(
        id
      ))
  }

  pub fn resolve_key(
    &self,
    key: &str
  ) -> Result<&dyn ViewStrategy, ConfigurationError>
  {
    let id =
      ViewId::from_key(key).ok_or_else(|| {
        ConfigurationError::UnknownView(
          key.to_string()
        )
      })?;
    self.resolve(id)
  }

  pub fn ids(
    &self
  ) -> impl Iterator<Item = ViewId> + '_ {
    self.strategies.keys().copied()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn standard_registry_resolves_every_view() {
    let registry =
      ViewRegistry::standard(&Config::default());
    for id in ViewId::all() {
      let strategy = registry
        .resolve(id)
        .expect("registered");
      assert_eq!(strategy.id(), id);
    }
    assert_eq!(registry.ids().count(), 5);
  }

  #[test]
  fn unknown_key_is_a_configuration_error() {
    let registry =
      ViewRegistry::standard(&Config::default());
    assert_eq!(
      registry.resolve_key("gantt").err(),
      Some(ConfigurationError::UnknownView(
        "gantt".to_string()
      ))
    );
    assert_eq!(
      registry
        .resolve_key("calendar-week")
        .map(|s| s.id())
        .ok(),
      Some(ViewId::CalendarWeek)
    );
  }

  #[test]
  fn missing_strategy_is_reported() {
    let mut registry = ViewRegistry::new();
    registry.register(Box::new(
      ListStrategy::default()
    ));
    assert_eq!(
      registry.resolve(ViewId::Board).err(),
      Some(ConfigurationError::Unregistered(
        ViewId::Board
      ))
    );
  }
}
