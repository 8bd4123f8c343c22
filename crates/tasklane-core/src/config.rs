use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono::Weekday;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::calendar::week_start_day;
use crate::datetime::parse_timezone;
use crate::navigation::WidthBreakpoints;
use crate::views::{
  ListOrder,
  ViewId
};

pub const CONFIG_FILE: &str =
  "tasklane.toml";
pub const CONFIG_ENV_VAR: &str =
  "TASKLANE_CONFIG";
pub const DATA_DIR_ENV_VAR: &str =
  "TASKLANE_DATA";
const DEFAULT_TIMEZONE: &str = "UTC";

fn default_calendar_week_start()
-> String {
  "monday".to_string()
}

fn default_board_week_start() -> String
{
  "sunday".to_string()
}

fn default_view_key() -> String {
  ViewId::List.as_key().to_string()
}

fn default_hour_start() -> u32 {
  6
}

fn default_hour_end() -> u32 {
  19
}

fn default_resize_debounce_ms() -> u64 {
  150
}

fn default_now_refresh_secs() -> u64 {
  60
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct Config {
  #[serde(default)]
  pub timezone:     Option<String>,
  #[serde(default = "default_view_key")]
  pub default_view: String,
  #[serde(default)]
  pub calendar:     CalendarSection,
  #[serde(default)]
  pub board:        BoardSection,
  #[serde(default)]
  pub day_view:     DayViewSection,
  #[serde(default)]
  pub navigation:   NavigationSection,
  #[serde(default)]
  pub list:         ListSection,
  #[serde(default)]
  pub storage:      StorageSection,
  #[serde(skip)]
  pub loaded_from:  Option<PathBuf>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarSection {
  #[serde(
    default = "default_calendar_week_start"
  )]
  pub week_start: String
}

/// The board labels due dates with a week-of-year number and counts weeks
/// from its own start day, independent of the calendar views.
#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct BoardSection {
  #[serde(
    default = "default_board_week_start"
  )]
  pub week_start: String
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct DayViewSection {
  #[serde(default = "default_hour_start")]
  pub hour_start: u32,
  #[serde(default = "default_hour_end")]
  pub hour_end:   u32
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct NavigationSection {
  #[serde(
    default = "default_resize_debounce_ms"
  )]
  pub resize_debounce_ms: u64,
  #[serde(
    default = "default_now_refresh_secs"
  )]
  pub now_refresh_secs:   u64,
  #[serde(default)]
  pub compact_width:      Option<u32>,
  #[serde(default)]
  pub medium_width:       Option<u32>
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Deserialize,
)]
pub struct ListSection {
  #[serde(default)]
  pub order: ListOrder
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Deserialize,
)]
pub struct StorageSection {
  #[serde(default)]
  pub data_dir: Option<PathBuf>
}

impl Default for CalendarSection {
  fn default() -> Self {
    Self {
      week_start:
        default_calendar_week_start()
    }
  }
}

impl Default for BoardSection {
  fn default() -> Self {
    Self {
      week_start:
        default_board_week_start()
    }
  }
}

impl Default for DayViewSection {
  fn default() -> Self {
    Self {
      hour_start: default_hour_start(),
      hour_end:   default_hour_end()
    }
  }
}

impl Default for NavigationSection {
  fn default() -> Self {
    Self {
      resize_debounce_ms:
        default_resize_debounce_ms(),
      now_refresh_secs:
        default_now_refresh_secs(),
      compact_width:      None,
      medium_width:       None
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      timezone:     None,
      default_view: default_view_key(),
      calendar:     CalendarSection::default(),
      board:        BoardSection::default(),
      day_view:     DayViewSection::default(),
      navigation:
        NavigationSection::default(),
      list:         ListSection::default(),
      storage:      StorageSection::default(),
      loaded_from:  None
    }
  }
}

impl Config {
  /// Loads configuration from, in order: an explicit path, the
  /// `TASKLANE_CONFIG` variable, `./tasklane.toml`. Falls back to defaults
  /// when none exist. An explicit path that is missing is an error.
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) = resolve_config_path(
      config_override
    )?
    else {
      warn!(
        "no tasklane.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut config =
      Self::from_toml_str(&text)
        .with_context(|| {
          format!(
            "failed to parse {}",
            path.display()
          )
        })?;
    config.loaded_from = Some(path);
    Ok(config)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<Self>(text)?;
    config.sanitize();
    debug!(
      week_start = %config.calendar.week_start,
      hour_start = config.day_view.hour_start,
      hour_end = config.day_view.hour_end,
      "parsed config"
    );
    Ok(config)
  }

  fn sanitize(&mut self) {
    if self
      .calendar
      .week_start
      .trim()
      .is_empty()
    {
      self.calendar.week_start =
        default_calendar_week_start();
    }
    if self
      .board
      .week_start
      .trim()
      .is_empty()
    {
      self.board.week_start =
        default_board_week_start();
    }

    // 00:00 always reads as all-day, so there is no hour-zero row
    self.day_view.hour_start =
      self.day_view.hour_start.clamp(1, 23);
    if self.day_view.hour_end > 23 {
      self.day_view.hour_end = 23;
    }
    if self.day_view.hour_end
      < self.day_view.hour_start
    {
      self.day_view.hour_end =
        self.day_view.hour_start;
    }

    if self.navigation.resize_debounce_ms
      == 0
    {
      self.navigation.resize_debounce_ms =
        default_resize_debounce_ms();
    }
    if self.navigation.now_refresh_secs
      == 0
    {
      self.navigation.now_refresh_secs =
        default_now_refresh_secs();
    }

    if ViewId::from_key(&self.default_view)
      .is_none()
    {
      warn!(
        view = %self.default_view,
        "unknown default_view; using list"
      );
      self.default_view =
        default_view_key();
    }
  }

  pub fn timezone(&self) -> Tz {
    self
      .timezone
      .as_deref()
      .and_then(|raw| {
        parse_timezone(raw, CONFIG_FILE)
      })
      .or_else(|| {
        parse_timezone(
          DEFAULT_TIMEZONE,
          "default"
        )
      })
      .unwrap_or(chrono_tz::UTC)
  }

  pub fn calendar_week_start(
    &self
  ) -> Weekday {
    week_start_day(
      &self.calendar.week_start
    )
  }

  pub fn board_week_start(
    &self
  ) -> Weekday {
    week_start_day(&self.board.week_start)
  }

  pub fn default_view(&self) -> ViewId {
    ViewId::from_key(&self.default_view)
      .unwrap_or(ViewId::List)
  }

  pub fn breakpoints(
    &self
  ) -> WidthBreakpoints {
    let defaults =
      WidthBreakpoints::default();
    let compact = self
      .navigation
      .compact_width
      .unwrap_or(defaults.compact);
    let medium = self
      .navigation
      .medium_width
      .unwrap_or(defaults.medium);
    if compact >= medium {
      warn!(
        compact,
        medium,
        "compact_width must be below \
         medium_width; using defaults"
      );
      return defaults;
    }
    WidthBreakpoints {
      compact,
      medium
    }
  }

  pub fn resize_debounce(
    &self
  ) -> Duration {
    Duration::from_millis(
      self.navigation.resize_debounce_ms
    )
  }

  pub fn now_refresh(
    &self
  ) -> chrono::Duration {
    chrono::Duration::seconds(
      self.navigation.now_refresh_secs
        as i64
    )
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Ok(raw) =
    std::env::var(DATA_DIR_ENV_VAR)
    && !raw.trim().is_empty()
  {
    expand_tilde(Path::new(raw.trim()))
  } else if let Some(path) =
    cfg.storage.data_dir.as_deref()
  {
    expand_tilde(path)
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    let path = expand_tilde(path);
    if !path.exists() {
      return Err(anyhow!(
        "config file does not exist: {}",
        path.display()
      ));
    }
    return Ok(Some(path));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Ok(Some(expand_tilde(
        Path::new(trimmed)
      )));
    }
  }

  let candidate = std::env::current_dir()
    .context(
      "cannot determine working \
       directory"
    )?
    .join(CONFIG_FILE);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let base = dirs::data_dir()
    .or_else(dirs::home_dir)
    .ok_or_else(|| {
      anyhow!(
        "cannot determine data \
         directory"
      )
    })?;
  Ok(base.join("tasklane"))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
