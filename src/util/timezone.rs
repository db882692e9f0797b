use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use time::{
    Date, Month, OffsetDateTime, UtcOffset, format_description::FormatItem,
    macros::format_description,
};

const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let seconds = utc.unix_timestamp();
    let nanos: u32 = utc.nanosecond();
    let datetime_utc = DateTime::<Utc>::from_timestamp(seconds, nanos)
        .or_else(|| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or_default();
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

pub fn localized_date(time: OffsetDateTime, tz: Tz) -> Option<Date> {
    let localized = localized_datetime(time, tz);
    let month = Month::try_from(u8::try_from(localized.month()).ok()?).ok()?;
    let day = u8::try_from(localized.day()).ok()?;
    Date::from_calendar_date(localized.year(), month, day).ok()
}

/// `March 3, 2024` in the given timezone.
pub fn format_human_date(time: OffsetDateTime, tz: Tz) -> String {
    localized_date(time, tz)
        .and_then(|date| date.format(HUMAN_DATE_FORMAT).ok())
        .unwrap_or_default()
}

/// UTC instant of local midnight on the first day of `year-month` in `tz`.
///
/// When midnight falls into a DST gap the first valid local instant of that
/// day is used instead.
pub fn local_month_start(tz: Tz, year: i32, month: u32) -> Option<OffsetDateTime> {
    let midnight = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    let local = tz.from_local_datetime(&midnight).earliest().or_else(|| {
        let shifted = midnight.checked_add_signed(TimeDelta::try_hours(1)?)?;
        tz.from_local_datetime(&shifted).earliest()
    })?;
    OffsetDateTime::from_unix_timestamp(local.timestamp()).ok()
}
