use chrono::{DateTime, Utc};
use wren_core::{resolve_timeframe, TIMEFRAME_PRESETS};

use crate::error::ServiceError;
use crate::Result;

/// Resolves the `(after, before)` bounds of a request. A timeframe preset
/// and explicit bounds are mutually exclusive.
pub fn resolve_window(
    timeframe: Option<&str>,
    after: Option<&str>,
    before: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    if let Some(name) = timeframe.filter(|t| !t.is_empty()) {
        if after.is_some() || before.is_some() {
            return Err(ServiceError::validation_with_hint(
                "timeframe cannot be combined with explicit after/before bounds",
                "pass either a timeframe preset or ISO-8601 after/before, not both",
            ));
        }
        let window = resolve_timeframe(name).map_err(|err| {
            ServiceError::validation_with_hint(
                err.to_string(),
                format!("valid presets: {}", TIMEFRAME_PRESETS.join(", ")),
            )
        })?;
        return Ok((Some(window.after), Some(window.before)));
    }

    Ok((
        parse_bound("after", after)?,
        parse_bound("before", before)?,
    ))
}

fn parse_bound(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(value)
        .map(|t| Some(t.with_timezone(&Utc)))
        .map_err(|_| {
            ServiceError::validation_with_hint(
                format!("'{field}' is not a valid ISO-8601 timestamp: {value}"),
                "use the form 2025-01-15T00:00:00Z",
            )
        })
}
