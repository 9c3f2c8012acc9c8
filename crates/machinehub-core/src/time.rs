//! Timestamp parsing and display helpers.
//!
//! Display formatting uses the fleet's operating timezone (Venezuela,
//! fixed UTC-4, no DST).

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Offset of the fleet's operating timezone (UTC-4).
fn fleet_offset() -> FixedOffset {
    FixedOffset::west_opt(4 * 3600).unwrap_or_else(|| Utc.fix())
}

/// Parse a wire timestamp, falling back to `now` when missing or invalid.
pub fn parse_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse).unwrap_or_else(Utc::now)
}

/// Parse an RFC 3339 / ISO-8601 timestamp.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Localized time-of-day string for notification bodies, e.g. `14:03:27`.
pub fn format_notification_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&fleet_offset()).format("%H:%M:%S").to_string()
}

/// Localized date-and-time string for rendered notifications.
pub fn format_notification_datetime(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&fleet_offset())
        .format("%d/%m/%Y %H:%M")
        .to_string()
}

/// Local calendar date of an instant in the fleet timezone.
pub fn local_date(ts: &DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&fleet_offset()).date_naive()
}

/// Today's local calendar date.
pub fn today_local() -> NaiveDate {
    local_date(&Utc::now())
}

/// Start of the local day containing `now`, as a UTC instant. Used for
/// the "today only" history filter.
pub fn start_of_today_utc() -> DateTime<Utc> {
    start_of_local_day(&Utc::now())
}

/// Start of the local day containing `ts`, as a UTC instant.
pub fn start_of_local_day(ts: &DateTime<Utc>) -> DateTime<Utc> {
    let offset = fleet_offset();
    ts.with_timezone(&offset)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(offset).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(*ts)
}

/// UTC bounds of an inclusive local `YYYY-MM-DD` date range. `from` maps
/// to local 00:00:00.000, `to` maps to local 23:59:59.999.
pub fn local_date_range_utc(
    from: Option<&str>,
    to: Option<&str>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let offset = fleet_offset();
    let lower = from
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| dt.and_local_timezone(offset).single())
        .map(|dt| dt.with_timezone(&Utc));
    let upper = to
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
        .and_then(|dt| dt.and_local_timezone(offset).single())
        .map(|dt| dt.with_timezone(&Utc));
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_now_falls_back() {
        let before = Utc::now();
        let parsed = parse_or_now(Some("not a timestamp"));
        assert!(parsed >= before);

        let fixed = parse_or_now(Some("2026-03-01T12:00:00Z"));
        assert_eq!(fixed.to_rfc3339(), "2026-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 02:30 UTC is still the previous day at UTC-4.
        let ts = parse("2026-03-02T02:30:00Z").unwrap();
        assert_eq!(
            local_date(&ts),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_local_date_range_bounds() {
        let (from, to) = local_date_range_utc(Some("2026-03-01"), Some("2026-03-02"));
        // Local midnight at UTC-4 is 04:00 UTC.
        assert_eq!(from.unwrap().to_rfc3339(), "2026-03-01T04:00:00+00:00");
        assert!(to.unwrap() > from.unwrap());

        let (none_from, none_to) = local_date_range_utc(Some("garbage"), None);
        assert!(none_from.is_none());
        assert!(none_to.is_none());
    }
}
