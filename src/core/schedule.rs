use crate::domain::model::ScheduleDate;
use crate::utils::error::{Result, TypefullyError};
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

const ACCEPTED_FORMS: &str =
    "next-free-slot, an RFC 3339 timestamp, 'YYYY-MM-DD HH:MM' (local time), or +<n>m/+<n>h/+<n>d";

/// Parses a `--schedule` value relative to `now`.
pub fn parse_schedule(input: &str, now: DateTime<Utc>) -> Result<ScheduleDate> {
    parse_schedule_in(input, now, &Local)
}

pub(crate) fn parse_schedule_in<Tz: TimeZone>(
    input: &str,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<ScheduleDate> {
    let value = input.trim();
    if value.is_empty() {
        return Err(invalid(input, "schedule cannot be empty"));
    }

    if value.eq_ignore_ascii_case("next-free-slot") || value.eq_ignore_ascii_case("next") {
        return Ok(ScheduleDate::NextFreeSlot);
    }

    let at = if let Some(offset) = value.strip_prefix('+') {
        now.checked_add_signed(parse_offset(input, offset)?)
            .ok_or_else(|| invalid(input, "relative offset is too large"))?
    } else if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        parsed.with_timezone(&Utc)
    } else {
        parse_local(input, value, tz)?
    };

    if at <= now {
        return Err(invalid(input, "schedule date is in the past"));
    }

    Ok(ScheduleDate::At(at))
}

fn parse_offset(input: &str, offset: &str) -> Result<Duration> {
    let unit = offset
        .chars()
        .last()
        .ok_or_else(|| invalid(input, "relative offset needs a number, e.g. +30m"))?;
    let digits = &offset[..offset.len() - unit.len_utf8()];
    let amount: i64 = digits
        .parse()
        .map_err(|_| invalid(input, "relative offset needs a number, e.g. +30m"))?;
    if amount <= 0 {
        return Err(invalid(input, "relative offset must be positive"));
    }

    let duration = match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => return Err(invalid(input, "relative offset unit must be m, h or d")),
    };
    duration.ok_or_else(|| invalid(input, "relative offset is too large"))
}

fn parse_local<Tz: TimeZone>(input: &str, value: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| invalid(input, &format!("expected {}", ACCEPTED_FORMS)))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Clocks going back: the earlier instant is the first time the wall clock shows it.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(invalid(input, "time does not exist in the local time zone")),
    }
}

fn invalid(input: &str, reason: &str) -> TypefullyError {
    TypefullyError::InvalidConfigValueError {
        field: "--schedule".to_string(),
        value: input.to_string(),
        reason: reason.to_string(),
    }
}
