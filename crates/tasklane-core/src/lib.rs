pub mod calendar;
pub mod clock;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod debounce;
pub mod dnd;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod orchestrator;
pub mod store;
pub mod task;
pub mod views;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::clock::{
  Clock,
  SystemClock
};
use crate::config::{
  Config,
  resolve_data_dir
};
use crate::datastore::JsonlPersistence;
use crate::orchestrator::Orchestrator;
use crate::store::TaskStore;
use crate::views::ViewRegistry;

/// The file-backed app a shell drives.
pub type App = Orchestrator<JsonlPersistence>;

/// Wires config, the data directory, the JSONL store and the standard
/// views together.
pub fn open(
  config: &Config,
  data_dir_override: Option<&Path>
) -> anyhow::Result<App> {
  open_with_clock(
    config,
    data_dir_override,
    Arc::new(SystemClock)
  )
}

#[tracing::instrument(skip_all)]
pub fn open_with_clock(
  config: &Config,
  data_dir_override: Option<&Path>,
  clock: Arc<dyn Clock>
) -> anyhow::Result<App> {
  let data_dir =
    resolve_data_dir(config, data_dir_override)?;
  let persistence =
    JsonlPersistence::open(&data_dir)?;
  let store = TaskStore::open(persistence, clock)
    .with_context(|| {
      format!(
        "failed to load tasks from {}",
        data_dir.display()
      )
    })?;

  info!(
    data_dir = %data_dir.display(),
    tasks = store.len(),
    view = %config.default_view(),
    "tasklane ready"
  );
  Ok(Orchestrator::new(
    store,
    ViewRegistry::standard(config),
    config
  ))
}
