//! Date and timezone helpers.
//!
//! Reporting in this system is anchored to IST (+05:30, no DST), so the span
//! helpers resolve "today", "this week" etc. against the IST calendar. All
//! ranges are half-open: `[start, end)`.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};

/// IST offset from UTC, in seconds (+05:30).
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The IST fixed offset.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("+05:30 is a valid offset")
}

/// Current timestamp in IST.
pub fn ist_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&ist())
}

/// Convert a UTC timestamp to IST.
pub fn to_ist(datetime: DateTime<Utc>) -> DateTime<FixedOffset> {
    datetime.with_timezone(&ist())
}

/// Convert a UTC timestamp to an arbitrary fixed offset.
pub fn to_offset(datetime: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    datetime.with_timezone(&offset)
}

/// Midnight at the start of `date` in IST.
fn at_ist_midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    let offset = ist();
    let local = date.and_time(NaiveTime::MIN);
    // A fixed offset has no DST gaps, so local -> UTC is total.
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    chrono::TimeZone::from_utc_datetime(&offset, &utc)
}

/// `[midnight, next midnight)` for one IST calendar day.
pub fn day_range(date: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start = at_ist_midnight(date);
    (start, start + Duration::days(1))
}

pub fn today_range() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    day_range(ist_now().date_naive())
}

pub fn yesterday_range() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    day_range(ist_now().date_naive() - Duration::days(1))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// Monday-to-Monday range for the IST week containing `date`.
pub fn week_range(date: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start = at_ist_midnight(week_start(date));
    (start, start + Duration::days(7))
}

pub fn current_week_range() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    week_range(ist_now().date_naive())
}

pub fn last_week_range() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    week_range(ist_now().date_naive() - Duration::days(7))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Range for the IST month containing `date`.
pub fn month_range(date: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    (
        at_ist_midnight(month_start(date)),
        at_ist_midnight(next_month_start(date)),
    )
}

pub fn current_month_range() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    month_range(ist_now().date_naive())
}

pub fn last_month_range() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let today = ist_now().date_naive();
    month_range(month_start(today) - Duration::days(1))
}

/// Range for the current IST calendar year.
pub fn calendar_year_range() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let year = ist_now().date_naive().year();
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1);
    match (start, end) {
        (Some(start), Some(end)) => (at_ist_midnight(start), at_ist_midnight(end)),
        _ => today_range(),
    }
}

/// Number of days in `[start, end)` excluding Sundays.
pub fn num_weekdays(start: NaiveDate, end: NaiveDate) -> i64 {
    if end <= start {
        return 0;
    }

    let total = (end - start).num_days();
    let full_weeks = total / 7;
    let mut count = full_weeks * 6;

    let mut day = start + Duration::days(full_weeks * 7);
    while day < end {
        if day.weekday() != Weekday::Sun {
            count += 1;
        }
        day += Duration::days(1);
    }

    count
}
