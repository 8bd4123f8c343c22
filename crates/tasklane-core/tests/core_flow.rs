use std::cell::Cell;
use std::sync::Arc;

use chrono::{
  DateTime,
  NaiveDate,
  TimeZone,
  Utc
};
use tasklane_core::clock::FixedClock;
use tasklane_core::config::Config;
use tasklane_core::datastore::{
  JsonlPersistence,
  MemoryPersistence,
  TaskPersistence
};
use tasklane_core::dnd::{
  DragController,
  DropOutcome,
  ReassignTarget
};
use tasklane_core::error::TaskResult;
use tasklane_core::orchestrator::{
  FormState,
  MISSING_TASK_NOTICE
};
use tasklane_core::store::TaskStore;
use tasklane_core::task::{
  Task,
  TaskId
};
use tasklane_core::views::{
  BoardStrategy,
  BucketKey,
  MonthStrategy,
  RenderContext,
  ViewId,
  ViewStrategy
};
use tasklane_shared::{
  TaskCreate,
  TaskPatch,
  TaskRecord
};
use tempfile::tempdir;

fn pinned_now() -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(2025, 4, 1, 10, 0, 0)
    .single()
    .expect("valid now")
}

fn day(
  y: i32,
  m: u32,
  d: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d)
    .expect("valid date")
}

fn memory_store(
  clock: Arc<FixedClock>
) -> TaskStore<MemoryPersistence> {
  TaskStore::open(MemoryPersistence::new(), clock)
    .expect("open store")
}

/// Counts how often the drop protocol writes.
struct CountingSink<'a, P> {
  store: &'a TaskStore<P>,
  calls: Cell<usize>
}

impl<P: TaskPersistence> ReassignTarget
  for CountingSink<'_, P>
{
  fn lookup(
    &self,
    id: TaskId
  ) -> TaskResult<Task> {
    self.store.get_by_id(id)
  }

  fn apply(
    &self,
    id: TaskId,
    patch: TaskPatch
  ) -> TaskResult<Task> {
    self.calls.set(self.calls.get() + 1);
    self.store.update(id, patch)
  }
}

#[test]
fn create_and_list() {
  let store = memory_store(Arc::new(FixedClock::new(pinned_now())));
  store
    .create(TaskCreate::titled("Buy milk"))
    .expect("create");

  let all = store.list_all();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].title, "Buy milk");
  assert!(!all[0].completed);
  assert_eq!(all[0].due, None);
}

#[test]
fn records_round_trip_through_json() {
  let store = memory_store(Arc::new(FixedClock::new(pinned_now())));
  let created = [
    TaskCreate::titled("plain"),
    TaskCreate {
      tags: vec!["home".to_string(), "errand".to_string()],
      due_date: Some("2025-04-02T09:15".to_string()),
      is_all_day: Some(false),
      ..TaskCreate::titled("scheduled")
    },
    TaskCreate {
      due_date: Some("2025-04-05".to_string()),
      is_all_day: Some(true),
      ..TaskCreate::titled("holiday")
    },
  ];
  for create in created {
    store.create(create).expect("create");
  }

  for task in store.list_all() {
    let json = serde_json::to_string(&task.to_record())
      .expect("serialize");
    let record: TaskRecord =
      serde_json::from_str(&json).expect("deserialize");
    assert_eq!(Task::from_record(record).expect("rebuild"), task);
  }
}

#[test]
fn jsonl_store_survives_reopen() {
  let temp = tempdir().expect("tempdir");
  let clock = Arc::new(FixedClock::new(pinned_now()));

  let first = {
    let store = TaskStore::open(
      JsonlPersistence::open(temp.path()).expect("open"),
      clock.clone()
    )
    .expect("store");
    let a = store
      .create(TaskCreate::titled("first"))
      .expect("create");
    let b = store
      .create(TaskCreate::titled("second"))
      .expect("create");
    store
      .update(b.id, TaskPatch::completed(true))
      .expect("update");
    store.delete(a.id).expect("delete");
    store.list_all()
  };

  let reopened = TaskStore::open(
    JsonlPersistence::open(temp.path()).expect("open"),
    clock
  )
  .expect("store");
  assert_eq!(reopened.list_all(), first);
  assert_eq!(first.len(), 1);
  assert!(first[0].completed);
}

#[test]
fn board_partition_is_complete() {
  let store = memory_store(Arc::new(FixedClock::new(pinned_now())));
  for n in 0..9 {
    let task = store
      .create(TaskCreate::titled(format!("task {n}")))
      .expect("create");
    if n % 3 == 0 {
      store.toggle_completed(task.id).expect("toggle");
    }
  }
  let tasks = store.list_all();
  let ctx = RenderContext {
    focus: day(2025, 4, 1),
    today: day(2025, 4, 1),
    now:   day(2025, 4, 1)
      .and_hms_opt(10, 0, 0)
      .expect("time")
  };
  let buckets = BoardStrategy::default().partition(&tasks, &ctx);
  assert_eq!(buckets.len(), 2);
  assert_eq!(buckets[0].len() + buckets[1].len(), tasks.len());
  for task in &tasks {
    let holders = buckets
      .iter()
      .filter(|bucket| bucket.contains(task.id))
      .count();
    assert_eq!(holders, 1);
    let expected = if task.completed {
      BucketKey::Completed
    } else {
      BucketKey::Todo
    };
    assert!(buckets
      .iter()
      .any(|b| b.key == expected && b.contains(task.id)));
  }
}

#[test]
fn month_view_places_dated_tasks_once() {
  let store = memory_store(Arc::new(FixedClock::new(pinned_now())));
  for (title, due) in [
    ("a", Some("2025-04-01T08:00")),
    ("b", Some("2025-03-31")),
    ("c", Some("2025-05-11T23:59")),
    ("d", None),
  ] {
    store
      .create(TaskCreate {
        due_date: due.map(str::to_string),
        ..TaskCreate::titled(title)
      })
      .expect("create");
  }
  let tasks = store.list_all();
  let ctx = RenderContext {
    focus: day(2025, 4, 15),
    today: day(2025, 4, 1),
    now:   day(2025, 4, 1)
      .and_hms_opt(10, 0, 0)
      .expect("time")
  };
  let strategy = MonthStrategy::default();
  let buckets = strategy.partition(&tasks, &ctx);
  assert_eq!(buckets.len(), 42);

  for task in &tasks {
    let holders: Vec<BucketKey> = buckets
      .iter()
      .filter(|bucket| bucket.contains(task.id))
      .map(|bucket| bucket.key)
      .collect();
    match task.due_date() {
      | Some(date) => {
        let expected = BucketKey::Day(date);
        assert_eq!(strategy.bucket_of(task, &ctx), Some(expected));
        // the April grid runs Mar 31 - May 11 for Monday weeks
        assert_eq!(holders, vec![expected]);
      }
      | None => {
        assert!(holders.is_empty());
        assert_eq!(strategy.bucket_of(task, &ctx), None);
      }
    }
  }
}

#[test]
fn drop_counts_mutations() {
  let store = memory_store(Arc::new(FixedClock::new(pinned_now())));
  let task = store
    .create(TaskCreate::titled("ship"))
    .expect("create");
  let sink = CountingSink {
    store: &store,
    calls: Cell::new(0)
  };
  let board = BoardStrategy::default();
  let mut dnd = DragController::new();

  dnd.start(task.id, BucketKey::Todo, 0);
  let outcome = dnd
    .drop(Some(BucketKey::Todo), &board, &sink)
    .expect("drop");
  assert_eq!(outcome, DropOutcome::NoOp);
  assert_eq!(sink.calls.get(), 0);

  dnd.start(task.id, BucketKey::Todo, 0);
  let outcome = dnd
    .drop(Some(BucketKey::Completed), &board, &sink)
    .expect("drop");
  assert!(matches!(outcome, DropOutcome::Reassigned(_)));
  assert_eq!(sink.calls.get(), 1);
}

#[test]
fn board_drag_completes_task() {
  let temp = tempdir().expect("tempdir");
  let clock = Arc::new(FixedClock::new(pinned_now()));
  let mut app = tasklane_core::open_with_clock(
    &Config::default(),
    Some(temp.path()),
    clock
  )
  .expect("open app");

  app.open_create_form();
  let before = app
    .submit_form(TaskPatch {
      title: Some("Buy milk".to_string()),
      ..TaskPatch::default()
    })
    .expect("created");
  assert_eq!(app.state().form, FormState::Closed);

  app.select_view(ViewId::Board).expect("board");
  assert!(app.begin_drag(before.id).expect("registered"));
  app.drag_hover(Some(BucketKey::Completed));
  let outcome = app
    .drop_on(Some(BucketKey::Completed))
    .expect("registered");
  assert!(matches!(outcome, DropOutcome::Reassigned(_)));
  assert!(!app.is_dragging());

  let after = app.store().list_all();
  assert_eq!(after.len(), 1);
  assert!(after[0].completed);
  assert!(after[0].updated_at > before.updated_at);

  let model = app.render().expect("render");
  let done = model.bucket(BucketKey::Completed).expect("column");
  assert!(done.contains(before.id));
  assert_eq!(model.navigation, None);
}

#[test]
fn board_cards_show_due_week() {
  let temp = tempdir().expect("tempdir");
  let mut app = tasklane_core::open_with_clock(
    &Config::default(),
    Some(temp.path()),
    Arc::new(FixedClock::new(pinned_now()))
  )
  .expect("open app");
  let dated = app
    .store()
    .create(TaskCreate {
      due_date: Some("2025-04-03T09:00".to_string()),
      ..TaskCreate::titled("dated")
    })
    .expect("create");
  let loose = app
    .store()
    .create(TaskCreate::titled("loose"))
    .expect("create");

  app.select_view(ViewId::Board).expect("board");
  let model = app.render().expect("render");
  // board weeks start on Sunday; Mar 30 opens week 14
  assert_eq!(model.badge(dated.id), Some("W14"));
  assert_eq!(model.badge(loose.id), None);
  assert_eq!(model.weekday_labels, None);
  let todo = model.preview(BucketKey::Todo).expect("column");
  assert_eq!(todo.shown.len(), 2);
  assert_eq!(todo.overflow_label(), None);
}

#[test]
fn create_form_keeps_completed_flag() {
  let temp = tempdir().expect("tempdir");
  let mut app = tasklane_core::open_with_clock(
    &Config::default(),
    Some(temp.path()),
    Arc::new(FixedClock::new(pinned_now()))
  )
  .expect("open app");

  app.open_create_form();
  let saved = app
    .submit_form(TaskPatch {
      title: Some("Already done".to_string()),
      completed: Some(true),
      ..TaskPatch::default()
    })
    .expect("created");
  assert!(saved.completed);
  assert_eq!(saved.created_at, saved.updated_at);
  assert_eq!(app.store().list_all(), vec![saved]);
}

#[test]
fn invalid_form_stays_open_with_error() {
  let temp = tempdir().expect("tempdir");
  let mut app = tasklane_core::open_with_clock(
    &Config::default(),
    Some(temp.path()),
    Arc::new(FixedClock::new(pinned_now()))
  )
  .expect("open app");

  app.open_create_form();
  let saved = app.submit_form(TaskPatch {
    title: Some("   ".to_string()),
    ..TaskPatch::default()
  });
  assert_eq!(saved, None);
  assert!(app.state().form.is_open());
  assert_eq!(
    app.state().form.error(),
    Some("title cannot be empty")
  );
  assert!(app.store().is_empty());
}

#[test]
fn stale_id_reloads_and_notifies() {
  let temp = tempdir().expect("tempdir");
  let clock = Arc::new(FixedClock::new(pinned_now()));
  let mut stale = tasklane_core::open_with_clock(
    &Config::default(),
    Some(temp.path()),
    clock.clone()
  )
  .expect("open app");
  let fresh = tasklane_core::open_with_clock(
    &Config::default(),
    Some(temp.path()),
    clock
  )
  .expect("open app");

  let task = fresh
    .store()
    .create(TaskCreate::titled("made elsewhere"))
    .expect("create");

  assert_eq!(stale.toggle_completed(task.id), None);
  assert_eq!(
    stale.state().notice.as_deref(),
    Some(MISSING_TASK_NOTICE)
  );
  assert!(stale.store().get_by_id(task.id).is_ok());

  stale.dismiss_notice();
  assert!(!stale.delete_task(TaskId::new()));
  assert!(stale.state().notice.is_some());
}

#[test]
fn editing_a_deleted_task_closes_form() {
  let store_clock = Arc::new(FixedClock::new(pinned_now()));
  let temp = tempdir().expect("tempdir");
  let mut app = tasklane_core::open_with_clock(
    &Config::default(),
    Some(temp.path()),
    store_clock
  )
  .expect("open app");
  let task = app
    .store()
    .create(TaskCreate::titled("doomed"))
    .expect("create");

  assert!(app.open_edit_form(task.id));
  app.store().delete(task.id).expect("delete");
  let saved = app.submit_form(TaskPatch {
    title: Some("renamed".to_string()),
    ..TaskPatch::default()
  });
  assert_eq!(saved, None);
  assert_eq!(app.state().form, FormState::Closed);
  assert_eq!(
    app.state().notice.as_deref(),
    Some(MISSING_TASK_NOTICE)
  );
}
