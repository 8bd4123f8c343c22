//! Ties the store, the view registry, and the calendar navigation into the
//! state a UI shell renders from.
//!
//! [`UiState`] holds only presentation state and changes through pure
//! transitions. [`Orchestrator`] owns the collaborators and turns user
//! intents into store calls, folding errors back into state instead of
//! propagating them to the shell.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{
  NaiveDate,
  NaiveDateTime,
  Weekday
};
use chrono_tz::Tz;
use tasklane_shared::{
  TaskCreate,
  TaskPatch
};
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::calendar::Granularity;
use crate::clock::{
  NowTicker,
  local_now
};
use crate::config::Config;
use crate::datastore::TaskPersistence;
use crate::debounce::Debouncer;
use crate::dnd::{
  DragController,
  DropOutcome
};
use crate::error::{
  ConfigurationError,
  TaskError
};
use crate::navigation::{
  NavigationItem,
  NavigationState,
  WidthBreakpoints,
  period_title,
  visible_count_for_width,
  visible_window
};
use crate::store::TaskStore;
use crate::task::{
  Task,
  TaskId
};
use crate::views::{
  Bucket,
  BucketKey,
  CellPreview,
  PeriodStats,
  RenderContext,
  ViewId,
  ViewRegistry,
  cell_preview,
  current_time_indicator,
  month_week_shortcuts,
  summarize_period,
  weekday_labels
};

pub const MISSING_TASK_NOTICE: &str =
  "That task no longer exists. The list has been refreshed.";

const WIDE_VISIBLE_COUNT: usize = 7;

/// Tasks drawn in one month cell before the "+N more" marker.
pub const MONTH_CELL_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
  Closed,
  Open {
    /// `None` while creating.
    editing: Option<Task>,
    error:   Option<String>
  }
}

impl FormState {
  pub fn is_open(&self) -> bool {
    matches!(self, Self::Open { .. })
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      | Self::Open {
        error,
        ..
      } => error.as_deref(),
      | Self::Closed => None
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
  pub current_view: ViewId,
  pub form:         FormState,
  /// Shared by the day, week and month views.
  pub navigation:   NavigationState,
  pub notice:       Option<String>
}

impl UiState {
  pub fn new(
    view: ViewId,
    today: NaiveDate
  ) -> Self {
    Self {
      current_view: view,
      form:         FormState::Closed,
      navigation:   NavigationState::new(
        today,
        view
          .granularity()
          .unwrap_or(Granularity::Month)
      ),
      notice:       None
    }
  }

  #[must_use]
  pub fn select_view(
    self,
    view: ViewId
  ) -> Self {
    let navigation = match view.granularity()
    {
      | Some(granularity) => {
        self
          .navigation
          .with_granularity(granularity)
      }
      | None => self.navigation
    };
    Self {
      current_view: view,
      navigation,
      ..self
    }
  }

  #[must_use]
  pub fn open_create_form(self) -> Self {
    Self {
      form: FormState::Open {
        editing: None,
        error:   None
      },
      ..self
    }
  }

  #[must_use]
  pub fn open_edit_form(
    self,
    task: Task
  ) -> Self {
    Self {
      form: FormState::Open {
        editing: Some(task),
        error:   None
      },
      ..self
    }
  }

  #[must_use]
  pub fn close_form(self) -> Self {
    Self {
      form: FormState::Closed,
      ..self
    }
  }

  /// Keeps the form open with an inline message. No-op when closed.
  #[must_use]
  pub fn with_form_error(
    self,
    message: impl Into<String>
  ) -> Self {
    match self.form {
      | FormState::Open {
        editing,
        ..
      } => {
        Self {
          form: FormState::Open {
            editing,
            error: Some(message.into())
          },
          ..self
        }
      }
      | FormState::Closed => self
    }
  }

  #[must_use]
  pub fn with_notice(
    self,
    notice: impl Into<String>
  ) -> Self {
    Self {
      notice: Some(notice.into()),
      ..self
    }
  }

  #[must_use]
  pub fn clear_notice(self) -> Self {
    Self {
      notice: None,
      ..self
    }
  }

  #[must_use]
  pub fn navigate_previous(self) -> Self {
    Self {
      navigation: self
        .navigation
        .navigate_previous(),
      ..self
    }
  }

  #[must_use]
  pub fn navigate_next(self) -> Self {
    Self {
      navigation: self
        .navigation
        .navigate_next(),
      ..self
    }
  }

  #[must_use]
  pub fn jump_to_today(
    self,
    today: NaiveDate
  ) -> Self {
    Self {
      navigation: self
        .navigation
        .jump_to_today(today),
      ..self
    }
  }

  #[must_use]
  pub fn select_date(
    self,
    date: NaiveDate
  ) -> Self {
    Self {
      navigation: self
        .navigation
        .select_item(date),
      ..self
    }
  }
}

/// Everything a shell needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
  pub view:           ViewId,
  pub title:          String,
  pub buckets:        Vec<Bucket>,
  /// Calendar views only, already narrowed to the visible count.
  pub navigation:     Option<Vec<NavigationItem>>,
  pub stats:          Option<PeriodStats>,
  pub week_shortcuts: Vec<NaiveDate>,
  pub now_indicator:  Option<f64>,
  /// Column headers for the week and month grids.
  pub weekday_labels: Option<[&'static str; 7]>,
  /// Per-card text such as `W14` on the board or `09:30` in calendars.
  pub badges:         BTreeMap<TaskId, String>,
  /// Cap on tasks drawn per bucket; `None` draws them all.
  pub cell_limit:     Option<usize>,
  pub form:           FormState,
  pub notice:         Option<String>
}

impl RenderModel {
  pub fn bucket(
    &self,
    key: BucketKey
  ) -> Option<&Bucket> {
    self
      .buckets
      .iter()
      .find(|bucket| bucket.key == key)
  }

  /// The part of a bucket to draw, honouring `cell_limit`.
  pub fn preview(
    &self,
    key: BucketKey
  ) -> Option<CellPreview<'_>> {
    let limit = self.cell_limit.unwrap_or(usize::MAX);
    self
      .bucket(key)
      .map(|bucket| cell_preview(bucket, limit))
  }

  pub fn badge(
    &self,
    id: TaskId
  ) -> Option<&str> {
    self.badges.get(&id).map(String::as_str)
  }
}

pub struct Orchestrator<P> {
  store:              TaskStore<P>,
  registry:           ViewRegistry,
  state:              UiState,
  drag:               DragController,
  resize:             Debouncer<u32>,
  ticker:             NowTicker,
  timezone:           Tz,
  calendar_week_start: Weekday,
  breakpoints:        WidthBreakpoints,
  hours:              (u32, u32),
  visible_count:      usize
}

impl<P: TaskPersistence> Orchestrator<P> {
  pub fn new(
    store: TaskStore<P>,
    registry: ViewRegistry,
    config: &Config
  ) -> Self {
    let timezone = config.timezone();
    let today =
      local_now(store.clock().as_ref(), timezone)
        .date();
    Self {
      state: UiState::new(
        config.default_view(),
        today
      ),
      store,
      registry,
      drag: DragController::new(),
      resize: Debouncer::new(
        config.resize_debounce()
      ),
      ticker: NowTicker::new(
        config.now_refresh()
      ),
      timezone,
      calendar_week_start: config
        .calendar_week_start(),
      breakpoints: config.breakpoints(),
      hours: (
        config.day_view.hour_start,
        config.day_view.hour_end
      ),
      visible_count: WIDE_VISIBLE_COUNT
    }
  }

  pub fn state(&self) -> &UiState {
    &self.state
  }

  pub fn store(&self) -> &TaskStore<P> {
    &self.store
  }

  pub fn visible_count(&self) -> usize {
    self.visible_count
  }

  pub fn now(&self) -> NaiveDateTime {
    local_now(
      self.store.clock().as_ref(),
      self.timezone
    )
  }

  pub fn today(&self) -> NaiveDate {
    self.now().date()
  }

  fn update_state(
    &mut self,
    change: impl FnOnce(UiState) -> UiState
  ) {
    let state = std::mem::replace(
      &mut self.state,
      UiState::new(ViewId::List, NaiveDate::MIN)
    );
    self.state = change(state);
  }

  // Views

  #[instrument(skip(self))]
  pub fn select_view(
    &mut self,
    view: ViewId
  ) -> Result<(), ConfigurationError> {
    self.registry.resolve(view)?;
    self.drag.cancel();
    self.update_state(|s| s.select_view(view));
    debug!(%view, "switched view");
    Ok(())
  }

  pub fn select_view_key(
    &mut self,
    key: &str
  ) -> Result<(), ConfigurationError> {
    let view =
      self.registry.resolve_key(key)?.id();
    self.select_view(view)
  }

  // Navigation

  pub fn navigate_previous(&mut self) {
    self.update_state(UiState::navigate_previous);
  }

  pub fn navigate_next(&mut self) {
    self.update_state(UiState::navigate_next);
  }

  pub fn jump_to_today(&mut self) {
    let today = self.today();
    self.update_state(|s| s.jump_to_today(today));
  }

  pub fn select_date(
    &mut self,
    date: NaiveDate
  ) {
    self.update_state(|s| s.select_date(date));
  }

  pub fn dismiss_notice(&mut self) {
    self.update_state(UiState::clear_notice);
  }

  // Form

  pub fn open_create_form(&mut self) {
    self.update_state(UiState::open_create_form);
  }

  pub fn open_edit_form(
    &mut self,
    id: TaskId
  ) -> bool {
    match self.store.get_by_id(id) {
      | Ok(task) => {
        self.update_state(|s| s.open_edit_form(task));
        true
      }
      | Err(err) => {
        self.recover(err);
        false
      }
    }
  }

  pub fn close_form(&mut self) {
    self.update_state(UiState::close_form);
  }

  /// Creates or updates depending on what the form was opened for.
  /// Returns the saved task; on failure the reason is in the state.
  #[instrument(skip(self, patch))]
  pub fn submit_form(
    &mut self,
    patch: TaskPatch
  ) -> Option<Task> {
    let editing = match &self.state.form {
      | FormState::Open {
        editing,
        ..
      } => editing.as_ref().map(|task| task.id),
      | FormState::Closed => {
        warn!("form submitted while closed");
        return None;
      }
    };

    let result = match editing {
      | Some(id) => self.store.update(id, patch),
      | None => self.store.create(create_from_patch(patch))
    };

    match result {
      | Ok(task) => {
        info!(id = %task.id, "form saved");
        self.update_state(UiState::close_form);
        Some(task)
      }
      | Err(TaskError::Validation(message)) => {
        debug!(%message, "form rejected");
        self.update_state(|s| s.with_form_error(message));
        None
      }
      | Err(err) => {
        if err.is_not_found() {
          self.update_state(UiState::close_form);
        } else {
          let message = err.to_string();
          self.update_state(|s| {
            s.with_form_error(message)
          });
        }
        self.recover(err);
        None
      }
    }
  }

  // Direct mutations

  pub fn toggle_completed(
    &mut self,
    id: TaskId
  ) -> Option<Task> {
    match self.store.toggle_completed(id) {
      | Ok(task) => Some(task),
      | Err(err) => {
        self.recover(err);
        None
      }
    }
  }

  pub fn delete_task(
    &mut self,
    id: TaskId
  ) -> bool {
    match self.store.delete(id) {
      | Ok(()) => true,
      | Err(err) => {
        self.recover(err);
        false
      }
    }
  }

  /// Folds a store error into the notice. A missing task means memory is
  /// stale, so the collection is re-read.
  fn recover(&mut self, err: TaskError) {
    let notice = match &err {
      | TaskError::NotFound(id) => {
        warn!(%id, "task vanished; reloading");
        if let Err(reload) = self.store.reload() {
          warn!(error = %reload, "reload failed");
        }
        MISSING_TASK_NOTICE.to_string()
      }
      | TaskError::Validation(message) => {
        message.clone()
      }
      | TaskError::Persistence(_) => {
        warn!(error = %err, "could not save changes");
        "Could not save changes.".to_string()
      }
    };
    self.update_state(|s| s.with_notice(notice));
  }

  // Rendering

  fn render_context(&self) -> RenderContext {
    let now = self.now();
    RenderContext {
      focus: self.state.navigation.reference(),
      today: now.date(),
      now
    }
  }

  #[instrument(skip(self), fields(view = %self.state.current_view))]
  pub fn render(
    &self
  ) -> Result<RenderModel, ConfigurationError> {
    let view = self.state.current_view;
    let strategy = self.registry.resolve(view)?;
    let ctx = self.render_context();
    let tasks = self.store.list_all();
    let buckets = strategy.partition(&tasks, &ctx);
    let badges = buckets
      .iter()
      .flat_map(|bucket| bucket.tasks.iter())
      .filter_map(|task| {
        strategy
          .card_badge(task)
          .map(|badge| (task.id, badge))
      })
      .collect();

    let mut model = RenderModel {
      view,
      title: view.label().to_string(),
      buckets,
      navigation: None,
      stats: None,
      week_shortcuts: Vec::new(),
      now_indicator: None,
      weekday_labels: None,
      badges,
      cell_limit: None,
      form: self.state.form.clone(),
      notice: self.state.notice.clone()
    };

    if let Some(granularity) = view.granularity() {
      let week_start = self.calendar_week_start;
      let items = self
        .state
        .navigation
        .window(ctx.today, week_start);
      model.title =
        period_title(granularity, ctx.focus, week_start);
      model.navigation = Some(
        visible_window(&items, self.visible_count)
          .to_vec()
      );
      model.stats = Some(summarize_period(
        &tasks,
        granularity,
        ctx.focus,
        week_start
      ));
      match granularity {
        | Granularity::Month => {
          model.week_shortcuts =
            month_week_shortcuts(ctx.focus, week_start);
          model.weekday_labels =
            Some(weekday_labels(week_start));
          model.cell_limit = Some(MONTH_CELL_LIMIT);
        }
        | Granularity::Day => {
          model.now_indicator = current_time_indicator(
            ctx.now,
            ctx.focus,
            self.hours.0,
            self.hours.1
          );
        }
        | Granularity::Week => {
          model.weekday_labels =
            Some(weekday_labels(week_start));
        }
      }
    }

    debug!(
      buckets = model.buckets.len(),
      tasks = tasks.len(),
      "rendered view"
    );
    Ok(model)
  }

  // Drag and drop

  /// Starts dragging `id` from the bucket the active view puts it in.
  pub fn begin_drag(
    &mut self,
    id: TaskId
  ) -> Result<bool, ConfigurationError> {
    let view = self.state.current_view;
    self.registry.resolve(view)?;
    let task = match self.store.get_by_id(id) {
      | Ok(task) => task,
      | Err(err) => {
        self.recover(err);
        return Ok(false);
      }
    };
    let strategy = self.registry.resolve(view)?;
    let ctx = self.render_context();
    let Some(source) = strategy.bucket_of(&task, &ctx)
    else {
      return Ok(false);
    };
    let source_index = strategy
      .partition(&self.store.list_all(), &ctx)
      .into_iter()
      .find(|bucket| bucket.key == source)
      .and_then(|bucket| {
        bucket
          .tasks
          .iter()
          .position(|t| strategy.item_key(t) == id)
      })
      .unwrap_or_default();
    self.drag.start(id, source, source_index);
    Ok(true)
  }

  pub fn drag_hover(
    &mut self,
    bucket: Option<BucketKey>
  ) {
    self.drag.hover(bucket);
  }

  pub fn cancel_drag(&mut self) -> DropOutcome {
    self.drag.cancel()
  }

  pub fn is_dragging(&self) -> bool {
    self.drag.is_dragging()
  }

  pub fn drop_on(
    &mut self,
    target: Option<BucketKey>
  ) -> Result<DropOutcome, ConfigurationError> {
    let strategy =
      self.registry.resolve(self.state.current_view)?;
    match self.drag.drop(target, strategy, &self.store) {
      | Ok(outcome) => Ok(outcome),
      | Err(err) => {
        self.recover(err);
        Ok(DropOutcome::Invalid)
      }
    }
  }

  // Timers

  pub fn resize(
    &mut self,
    width: u32,
    at: Instant
  ) {
    self.resize.push(width, at);
  }

  /// Applies the last width once the resize burst has settled. Returns
  /// true when the visible navigation count changed.
  pub fn poll_resize(
    &mut self,
    at: Instant
  ) -> bool {
    let Some(width) = self.resize.poll(at) else {
      return false;
    };
    let count =
      visible_count_for_width(width, self.breakpoints);
    if count == self.visible_count {
      return false;
    }
    debug!(width, count, "navigation width changed");
    self.visible_count = count;
    true
  }

  /// Whether the clock has moved into a new refresh slot since the last
  /// render. Never touches tasks.
  pub fn tick(&mut self) -> bool {
    let now = self.now();
    self.ticker.tick(now)
  }
}

fn create_from_patch(
  patch: TaskPatch
) -> TaskCreate {
  TaskCreate {
    title:      patch.title.unwrap_or_default(),
    completed:  patch.completed.unwrap_or(false),
    tags:       patch.tags.unwrap_or_default(),
    due_date:   patch.due_date.flatten(),
    is_all_day: patch.is_all_day.flatten()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 2)
      .expect("valid date")
  }

  #[test]
  fn calendar_views_share_reference_date() {
    let state = UiState::new(ViewId::List, today())
      .select_view(ViewId::CalendarMonth)
      .navigate_next()
      .select_view(ViewId::CalendarWeek);
    assert_eq!(
      state.navigation.reference(),
      NaiveDate::from_ymd_opt(2025, 5, 2)
        .expect("valid date")
    );
    assert_eq!(
      state.navigation.granularity(),
      Granularity::Week
    );

    let back = state
      .select_view(ViewId::Board)
      .select_view(ViewId::CalendarDay);
    assert_eq!(
      back.navigation.reference(),
      NaiveDate::from_ymd_opt(2025, 5, 2)
        .expect("valid date")
    );
  }

  #[test]
  fn form_error_only_applies_to_open_form() {
    let closed = UiState::new(ViewId::List, today())
      .with_form_error("nope");
    assert_eq!(closed.form, FormState::Closed);

    let open = UiState::new(ViewId::List, today())
      .open_create_form()
      .with_form_error("title cannot be empty");
    assert!(open.form.is_open());
    assert_eq!(
      open.form.error(),
      Some("title cannot be empty")
    );
    assert_eq!(open.close_form().form, FormState::Closed);
  }

  #[test]
  fn patch_becomes_create_payload() {
    let create = create_from_patch(TaskPatch {
      title: Some("Plan".to_string()),
      due_date: Some(Some("2025-04-03".to_string())),
      ..TaskPatch::default()
    });
    assert_eq!(create.title, "Plan");
    assert_eq!(
      create.due_date.as_deref(),
      Some("2025-04-03")
    );
    assert_eq!(create.is_all_day, None);
    assert!(!create.completed);

    let done = create_from_patch(TaskPatch {
      title: Some("Filed".to_string()),
      completed: Some(true),
      ..TaskPatch::default()
    });
    assert!(done.completed);
  }
}
