use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use thiserror::Error;

/// Named timeframe presets accepted by the tool surface.
pub const TIMEFRAME_PRESETS: &[&str] = &[
    "last_hour",
    "today",
    "yesterday",
    "last_3_days",
    "this_week",
    "last_week",
    "this_month",
];

#[derive(Error, Debug)]
pub enum TimeframeError {
    #[error("invalid timeframe: {0} (valid options: last_hour, today, yesterday, last_3_days, this_week, last_week, this_month)")]
    Unknown(String),
}

/// A resolved `(after, before)` window in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
}

/// Resolves a preset name against the host clock.
pub fn resolve_timeframe(name: &str) -> Result<TimeWindow, TimeframeError> {
    resolve_timeframe_at(name, Local::now())
}

/// Resolves a preset name against an explicit "now", so tests can pin the
/// clock. Presets anchor to local midnights; `this_week` is Monday-anchored.
pub fn resolve_timeframe_at(
    name: &str,
    now: DateTime<Local>,
) -> Result<TimeWindow, TimeframeError> {
    let today = now.date_naive();
    let (after, before) = match name {
        "last_hour" => (now - Duration::hours(1), now),
        "today" => (midnight(today, now), now),
        "yesterday" => {
            let yesterday = today - Duration::days(1);
            (midnight(yesterday, now), midnight(today, now))
        }
        "last_3_days" => (now - Duration::days(3), now),
        "this_week" => {
            let monday = today - Duration::days(i64::from(now.weekday().num_days_from_monday()));
            (midnight(monday, now), now)
        }
        "last_week" => {
            let monday = today - Duration::days(i64::from(now.weekday().num_days_from_monday()));
            let last_monday = monday - Duration::days(7);
            (midnight(last_monday, now), midnight(monday, now))
        }
        "this_month" => {
            let first = today.with_day(1).unwrap_or(today);
            (midnight(first, now), now)
        }
        other => return Err(TimeframeError::Unknown(other.to_string())),
    };
    Ok(TimeWindow {
        after: after.with_timezone(&Utc),
        before: before.with_timezone(&Utc),
    })
}

fn midnight(day: NaiveDate, fallback: DateTime<Local>) -> DateTime<Local> {
    day.and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or(fallback)
}
