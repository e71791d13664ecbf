//! Timestamp composition for raw station records.
//!
//! Both sources carry the observation time split across columns; these
//! helpers rebuild a naive epoch-millisecond timestamp and signal an
//! unbuildable one with `None` so the caller can drop the row.

use chrono::{NaiveDate, NaiveTime};

/// Compose a timestamp from a ground record's `YYYY-MM-DD` date and
/// its hour field. The hour arrives in mixed shapes (`0`, `600`,
/// `1200 UTC`); left-padding to four characters and keeping the first
/// two recovers the hour in every shape.
pub fn ground_timestamp_ms(date: &str, hour: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let hour = normalize_hour(hour)?;
    let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
    Some(date.and_time(time).and_utc().timestamp_millis())
}

/// Compose a timestamp from satellite Year/Month/Day/Hour/Minute
/// integer columns.
pub fn satellite_timestamp_ms(year: i64, month: i64, day: i64, hour: i64, minute: i64) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )?;
    let time = NaiveTime::from_hms_opt(u32::try_from(hour).ok()?, u32::try_from(minute).ok()?, 0)?;
    Some(date.and_time(time).and_utc().timestamp_millis())
}

fn normalize_hour(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let padded = format!("{raw:0>4}");
    let hh = padded.get(..2)?;
    let hour: u32 = hh.parse().ok()?;
    (hour < 24).then_some(hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_hour_shapes() {
        // Bare zero, short form, and the "HHMM UTC" form all resolve.
        let midnight = ground_timestamp_ms("2023-06-15", "0").unwrap();
        let six = ground_timestamp_ms("2023-06-15", "600").unwrap();
        let noon = ground_timestamp_ms("2023-06-15", "1200 UTC").unwrap();
        assert_eq!(six - midnight, 6 * 3_600_000);
        assert_eq!(noon - midnight, 12 * 3_600_000);
    }

    #[test]
    fn test_ground_invalid_rows_rejected() {
        assert!(ground_timestamp_ms("not-a-date", "1200").is_none());
        assert!(ground_timestamp_ms("2023-02-30", "1200").is_none());
        assert!(ground_timestamp_ms("2023-06-15", "9900").is_none());
        assert!(ground_timestamp_ms("2023-06-15", "").is_none());
    }

    #[test]
    fn test_satellite_timestamp() {
        let ts = satellite_timestamp_ms(2023, 6, 15, 14, 30).unwrap();
        let base = satellite_timestamp_ms(2023, 6, 15, 0, 0).unwrap();
        assert_eq!(ts - base, 14 * 3_600_000 + 30 * 60_000);
        assert!(satellite_timestamp_ms(2023, 13, 1, 0, 0).is_none());
        assert!(satellite_timestamp_ms(2023, 2, 30, 0, 0).is_none());
    }
}
