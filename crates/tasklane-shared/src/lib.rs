use serde::{
  Deserialize,
  Deserializer,
  Serialize
};
use uuid::Uuid;

/// Persisted shape of a task.
///
/// Timestamps are ISO-8601 strings: `createdAt` and `updatedAt` are UTC
/// with a `Z` suffix, `dueDate` is a local wall-clock date-time without an
/// offset. Absent optional fields are omitted.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
  pub id:         Uuid,
  #[serde(default)]
  pub title:      String,
  #[serde(default)]
  pub completed:  bool,
  #[serde(default)]
  pub tags:       Vec<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:   Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub is_all_day: Option<bool>,
  pub created_at: String,
  pub updated_at: String
}

/// Field set submitted by the form when creating a task.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreate {
  pub title:      String,
  #[serde(default)]
  pub completed:  bool,
  #[serde(default)]
  pub tags:       Vec<String>,
  #[serde(default)]
  pub due_date:   Option<String>,
  #[serde(default)]
  pub is_all_day: Option<bool>
}

impl TaskCreate {
  pub fn titled(
    title: impl Into<String>
  ) -> Self {
    Self {
      title: title.into(),
      ..Self::default()
    }
  }
}

/// Partial update. `None` leaves a field untouched; for the nullable
/// fields `Some(None)` clears the value. Over JSON an absent key means
/// untouched and an explicit `null` means clear.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
  pub title:      Option<String>,
  pub completed:  Option<bool>,
  pub tags:       Option<Vec<String>>,
  #[serde(
    default,
    deserialize_with = "double_option",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:   Option<Option<String>>,
  #[serde(
    default,
    deserialize_with = "double_option",
    skip_serializing_if = "Option::is_none"
  )]
  pub is_all_day: Option<Option<bool>>
}

/// A present key, `null` included, becomes `Some`. A missing key falls
/// back to `default` and stays `None`.
fn double_option<'de, T, D>(
  deserializer: D
) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>
{
  Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
  pub fn completed(
    completed: bool
  ) -> Self {
    Self {
      completed: Some(completed),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.completed.is_none()
      && self.tags.is_none()
      && self.due_date.is_none()
      && self.is_all_day.is_none()
  }
}

impl From<TaskCreate> for TaskPatch {
  fn from(create: TaskCreate) -> Self {
    Self {
      title:      Some(create.title),
      completed:  Some(create.completed),
      tags:       Some(create.tags),
      due_date:   Some(create.due_date),
      is_all_day: Some(
        create.is_all_day
      )
    }
  }
}
