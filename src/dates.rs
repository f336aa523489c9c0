use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use crate::constants::dates::{
    STOCK_MONITORING_REPORTED_DATE, SUPERVISION_DATE, SUPERVISOR_REPORTED_DATE,
};
use crate::data::Report;
use crate::utils::coerce_epoch_millis;

/// Resolve the effective timestamp of a report.
///
/// Order of preference:
/// 1. a supervisor correction (`s_reported.s_reported_date`, then `supervision_date`),
/// 2. `stock_monitoring_reported_date` when `report` is an item-used document
///    (its form equals `item_used_form`),
/// 3. the native `reported_date` in epoch milliseconds.
///
/// Never fails: anything unreadable resolves to the Unix epoch.
pub fn reported_date(report: &Report, item_used_form: &str) -> DateTime<Utc> {
    for path in [SUPERVISOR_REPORTED_DATE, SUPERVISION_DATE] {
        if let Some(date) = report.field(path).and_then(parse_date_value) {
            return date;
        }
    }
    if !item_used_form.is_empty() && report.form == item_used_form {
        let stock_date = report
            .field(STOCK_MONITORING_REPORTED_DATE)
            .and_then(|value| parse_date_value(value).or_else(|| epoch_value(value)));
        if let Some(date) = stock_date {
            return date;
        }
    }
    native_reported_date(report)
}

/// The document's own `reported_date`, or the Unix epoch.
pub fn native_reported_date(report: &Report) -> DateTime<Utc> {
    coerce_epoch_millis(Some(&report.reported_date))
        .map(from_epoch_millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Convert epoch milliseconds into a UTC timestamp, clamping out-of-range values to the epoch.
pub fn from_epoch_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Parse an ISO-8601 date or date-time string.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC). Returns `None` when parsing fails.
pub fn parse_iso_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Midnight (UTC) of the day containing `instant`.
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_iso_date)
}

fn epoch_value(value: &Value) -> Option<DateTime<Utc>> {
    coerce_epoch_millis(Some(value)).map(from_epoch_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ITEM_USED: &str = "stock-consumption-doc";

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn parse_iso_date_accepts_common_layouts() {
        assert_eq!(parse_iso_date("2025-03-01"), Some(utc(2025, 3, 1)));
        assert_eq!(
            parse_iso_date("2025-03-01T10:30:00Z"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_iso_date("2025-03-01T12:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_iso_date("2025-03-01T10:30:00.250"),
            Some(
                Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap()
                    + chrono::Duration::milliseconds(250)
            )
        );
        assert_eq!(parse_iso_date(""), None);
        assert_eq!(parse_iso_date("03/01/2025"), None);
        assert_eq!(parse_iso_date("2025-02-30"), None);
    }

    #[test]
    fn supervisor_correction_wins_over_native_date() {
        let report = Report::new("r1", "stock_count")
            .with_reported_date(utc(2025, 5, 10).timestamp_millis())
            .with_field("s_reported.s_reported_date", "2025-04-30");
        assert_eq!(reported_date(&report, ITEM_USED), utc(2025, 4, 30));

        let report = Report::new("r2", "stock_count")
            .with_reported_date(utc(2025, 5, 10).timestamp_millis())
            .with_field("supervision_date", "2025-04-29");
        assert_eq!(reported_date(&report, ITEM_USED), utc(2025, 4, 29));
    }

    #[test]
    fn unparseable_correction_falls_through() {
        let report = Report::new("r1", "stock_count")
            .with_reported_date(utc(2025, 5, 10).timestamp_millis())
            .with_field("s_reported.s_reported_date", "last tuesday");
        assert_eq!(reported_date(&report, ITEM_USED), utc(2025, 5, 10));
    }

    #[test]
    fn item_used_documents_prefer_their_own_date() {
        let report = Report::new("d1", ITEM_USED)
            .with_reported_date(utc(2025, 5, 10).timestamp_millis())
            .with_value("stock_monitoring_reported_date", "2025-05-02");
        assert_eq!(reported_date(&report, ITEM_USED), utc(2025, 5, 2));

        let millis = Report::new("d2", ITEM_USED)
            .with_reported_date(utc(2025, 5, 10).timestamp_millis())
            .with_value(
                "stock_monitoring_reported_date",
                utc(2025, 5, 3).timestamp_millis(),
            );
        assert_eq!(reported_date(&millis, ITEM_USED), utc(2025, 5, 3));

        let other_form = Report::new("d3", "stock_supply")
            .with_reported_date(utc(2025, 5, 10).timestamp_millis())
            .with_value("stock_monitoring_reported_date", "2025-05-02");
        assert_eq!(reported_date(&other_form, ITEM_USED), utc(2025, 5, 10));
    }

    #[test]
    fn missing_or_garbled_native_date_resolves_to_epoch() {
        let missing = Report::new("r1", "stock_count");
        assert_eq!(reported_date(&missing, ITEM_USED), DateTime::<Utc>::UNIX_EPOCH);

        let mut garbled = Report::new("r2", "stock_count");
        garbled.reported_date = Value::from("soon");
        assert_eq!(reported_date(&garbled, ITEM_USED), DateTime::<Utc>::UNIX_EPOCH);

        let mut textual = Report::new("r3", "stock_count");
        textual.reported_date = Value::from("1746835200000");
        assert_eq!(reported_date(&textual, ITEM_USED), utc(2025, 5, 10));
    }

    #[test]
    fn start_of_day_truncates_time() {
        let instant = Utc.with_ymd_and_hms(2025, 5, 10, 17, 45, 3).unwrap();
        assert_eq!(start_of_day(instant), utc(2025, 5, 10));
    }
}
