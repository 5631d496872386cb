use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use tmbasic_types::Value;

use crate::error::RuntimeError;
use crate::object::{Object, Record};

use super::{expect_string, string_list, SystemCallInput, SystemCallOutput, SystemCallResult};

pub(super) const MS_PER_SECOND: i64 = 1_000;
pub(super) const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
pub(super) const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub(super) const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// `Days`/`Hours`/`Minutes`/`Seconds`/`Milliseconds`: a span is the count
/// scaled to milliseconds.
pub(super) fn span(input: &mut SystemCallInput<'_>, ms_per_unit: i64) -> SystemCallResult {
    let count = input.value_arg(0)?;
    Ok(SystemCallOutput::value(count * &Value::from(ms_per_unit)))
}

/// `TotalDays`/`TotalHours`/...: the span in the requested unit.
pub(super) fn total(input: &mut SystemCallInput<'_>, ms_per_unit: i64) -> SystemCallResult {
    let span = input.value_arg(0)?;
    let total = span
        .checked_div(&Value::from(ms_per_unit))
        .ok_or_else(|| RuntimeError::internal("zero-width time unit"))?;
    Ok(SystemCallOutput::value(total))
}

fn date_part<T: TryFrom<i64>>(value: &Value, what: &str) -> Result<T, RuntimeError> {
    T::try_from(value.as_i64())
        .map_err(|_| RuntimeError::internal(format!("Invalid {what}: {value}.")))
}

fn civil_date_time(input: &SystemCallInput<'_>) -> Result<NaiveDateTime, RuntimeError> {
    let year: i32 = date_part(input.value_arg(0)?, "year")?;
    let month: u32 = date_part(input.value_arg(1)?, "month")?;
    let day: u32 = date_part(input.value_arg(2)?, "day")?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        RuntimeError::internal(format!("Invalid date: {year}-{month}-{day}."))
    })?;

    let (hour, minute, second, millisecond) = if input.num_value_args > 3 {
        (
            date_part(input.value_arg(3)?, "hour")?,
            date_part(input.value_arg(4)?, "minute")?,
            date_part(input.value_arg(5)?, "second")?,
            date_part(input.value_arg(6)?, "millisecond")?,
        )
    } else {
        (0, 0, 0, 0)
    };
    date.and_hms_milli_opt(hour, minute, second, millisecond)
        .ok_or_else(|| {
            RuntimeError::internal(format!(
                "Invalid time of day: {hour}:{minute}:{second}.{millisecond}."
            ))
        })
}

/// `DateFromParts(year, month, day) as Date` — epoch milliseconds at
/// midnight.
pub(super) fn date_from_parts(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let date_time = civil_date_time(input)?;
    Ok(SystemCallOutput::value(Value::from(
        date_time.and_utc().timestamp_millis(),
    )))
}

/// `DateTimeFromParts(year, ..., millisecond) as DateTime` — epoch
/// milliseconds.
pub(super) fn date_time_from_parts(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let date_time = civil_date_time(input)?;
    Ok(SystemCallOutput::value(Value::from(
        date_time.and_utc().timestamp_millis(),
    )))
}

fn parse_time_zone(name: &str) -> Result<Tz, RuntimeError> {
    name.parse::<Tz>().map_err(|_| {
        RuntimeError::internal(format!("The time zone name \"{name}\" is invalid."))
    })
}

/// `DateTimeOffsetFromParts(year, ..., millisecond, timeZone) as
/// DateTimeOffset` — a record of the civil instant and the zone's UTC
/// offset at that instant, both in milliseconds.
pub(super) fn date_time_offset_from_parts(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let date_time = civil_date_time(input)?;
    let zone_name = input.object_arg(0)?.clone();
    let zone = parse_time_zone(expect_string(&zone_name)?.as_str())?;
    let offset = zone
        .offset_from_local_datetime(&date_time)
        .earliest()
        .ok_or_else(|| {
            RuntimeError::internal("The date and time do not exist in that time zone.")
        })?;
    let offset_ms = i64::from(offset.fix().local_minus_utc()) * MS_PER_SECOND;
    let record = Record::new(
        [
            Value::from(date_time.and_utc().timestamp_millis()),
            Value::from(offset_ms),
        ],
        [],
    );
    Ok(SystemCallOutput::object(Rc::new(Object::Record(record))))
}

/// `TimeZoneFromName(name as String) as TimeZone`
pub(super) fn time_zone_from_name(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let name = input.object_arg(0)?.clone();
    let zone = parse_time_zone(expect_string(&name)?.as_str())?;
    Ok(SystemCallOutput::object(Object::string(zone.name())))
}

/// `AvailableTimeZones() as List of TimeZone`
pub(super) fn available_time_zones(_input: &mut SystemCallInput<'_>) -> SystemCallResult {
    Ok(SystemCallOutput::object(string_list(
        chrono_tz::TZ_VARIANTS.iter().map(|zone| zone.name().to_owned()),
    )))
}

/// `UtcOffset(timeZone as TimeZone, dateTime as DateTime) as TimeSpan`
pub(super) fn utc_offset(input: &mut SystemCallInput<'_>) -> SystemCallResult {
    let zone_name = input.object_arg(0)?.clone();
    let zone = parse_time_zone(expect_string(&zone_name)?.as_str())?;
    let instant_ms = input.value_arg(0)?.as_i64();
    let instant = chrono::DateTime::from_timestamp_millis(instant_ms)
        .ok_or_else(|| RuntimeError::internal("The date and time are out of range."))?
        .naive_utc();
    let offset = zone.offset_from_utc_datetime(&instant);
    let offset_ms = i64::from(offset.fix().local_minus_utc()) * MS_PER_SECOND;
    Ok(SystemCallOutput::value(Value::from(offset_ms)))
}
