use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  SecondsFormat,
  Utc
};
use chrono_tz::Tz;

const DUE_FORMAT: &str =
  "%Y-%m-%dT%H:%M:%S";

const DUE_INPUT_FORMATS: [&str; 3] = [
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M"
];

/// Timestamps keep full sub-second precision so a stored task reads back
/// equal to the one that was written.
#[must_use]
pub fn format_timestamp(
  dt: DateTime<Utc>
) -> String {
  dt.to_rfc3339_opts(
    SecondsFormat::AutoSi,
    true
  )
}

pub fn parse_timestamp(
  raw: &str
) -> anyhow::Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(
    raw.trim()
  )
  .map(|dt| dt.with_timezone(&Utc))
  .with_context(|| {
    format!(
      "invalid ISO-8601 timestamp: \
       {raw:?}"
    )
  })
}

#[must_use]
pub fn format_due(
  at: NaiveDateTime
) -> String {
  at.format(DUE_FORMAT).to_string()
}

/// Accepts the shapes a date picker produces: a bare date (midnight), a
/// local date-time with or without seconds, or a full RFC 3339 value whose
/// wall-clock part is kept.
pub fn parse_due(
  raw: &str
) -> anyhow::Result<NaiveDateTime> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(anyhow!(
      "due date cannot be empty"
    ));
  }

  for format in DUE_INPUT_FORMATS {
    if let Ok(parsed) =
      NaiveDateTime::parse_from_str(
        trimmed, format
      )
    {
      return Ok(parsed);
    }
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      trimmed, "%Y-%m-%d"
    )
    && let Some(midnight) =
      date.and_hms_opt(0, 0, 0)
  {
    return Ok(midnight);
  }

  DateTime::parse_from_rfc3339(trimmed)
    .map(|dt| dt.naive_local())
    .map_err(|_| {
      anyhow!(
        "unrecognized due date: \
         {trimmed:?}"
      )
    })
}

/// Stored due dates that fail to parse degrade to "no due date" instead of
/// failing the whole load.
#[must_use]
pub fn parse_due_lenient(
  raw: Option<&str>
) -> Option<NaiveDateTime> {
  let raw = raw?;
  match parse_due(raw) {
    | Ok(at) => Some(at),
    | Err(error) => {
      tracing::warn!(
        raw,
        error = %error,
        "ignoring unparseable due date"
      );
      None
    }
  }
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "resolved timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "invalid timezone id"
      );
      None
    }
  }
}
