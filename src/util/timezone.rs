use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let seconds = utc.unix_timestamp();
    let nanos: u32 = utc.nanosecond();
    let datetime_utc = DateTime::<Utc>::from_timestamp(seconds, nanos)
        .or_else(|| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or_default();
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

/// Short date-time used on receipts, e.g. `5/1/2024, 10:00:00 a.m.`.
pub fn receipt_timestamp(time: OffsetDateTime, tz: Tz) -> String {
    let local = localized_datetime(time, tz);
    let (is_pm, hour) = local.hour12();
    let meridiem = if is_pm { "p.m." } else { "a.m." };
    format!(
        "{}/{}/{}, {}:{:02}:{:02} {}",
        local.month(),
        local.day(),
        local.year(),
        hour,
        local.minute(),
        local.second(),
        meridiem
    )
}
