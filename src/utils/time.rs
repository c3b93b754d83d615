use crate::error::{other_error, AppResult};
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Utc,
};
use chrono_tz::Tz;

/// Parse time string in HH:MM format (a trailing :SS segment is tolerated)
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    if let Some(seconds) = parts.get(2) {
        let seconds = seconds.parse::<u32>().ok()?;
        if seconds > 59 {
            return None;
        }
    }
    Some((hour, minute))
}

/// Parse a wall-clock time of day
pub fn parse_time_of_day(time_str: &str) -> Option<NaiveTime> {
    let (hour, minute) = parse_time(time_str)?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Format a time of day the way the backend stores it
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parse a session date.
///
/// Plain `YYYY-MM-DD` values are taken as the calendar date itself. Full
/// timestamps are converted into `tz` first, so an instant written at
/// local midnight lands on the intended day.
pub fn parse_session_date(date_str: &str, tz: Tz) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&tz).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    None
}

/// Combine a calendar date with a time of day
pub fn combine(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// Current wall-clock time in the given timezone
pub fn local_now(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

/// Resolve a local wall-clock time to an absolute instant.
/// Ambiguous times (clocks going back) resolve to the earlier instant.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> AppResult<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| other_error(&format!("{} does not exist in {}", local, tz)))
}

/// Encode a local start time as the ISO timestamp the backend expects for `date`
pub fn to_wire_date(tz: Tz, local: NaiveDateTime) -> AppResult<String> {
    Ok(local_to_utc(tz, local)?.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A Monday-to-Monday display window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    /// Monday 00:00 of the week
    pub start: NaiveDateTime,
    /// Monday 00:00 of the following week (exclusive)
    pub end: NaiveDateTime,
}

impl WeekWindow {
    pub fn first_day(&self) -> NaiveDate {
        self.start.date()
    }

    /// Sunday of the week
    pub fn last_day(&self) -> NaiveDate {
        self.first_day() + Duration::days(6)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    /// Days of the week in order, Monday first
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        (0..7).map(move |offset| first + Duration::days(offset))
    }

    /// Dates as YYYY-MM-DD, Monday and Sunday
    pub fn date_range(&self) -> (String, String) {
        (
            self.first_day().format("%Y-%m-%d").to_string(),
            self.last_day().format("%Y-%m-%d").to_string(),
        )
    }
}

/// Get the week (Monday to Sunday) containing `now`
pub fn week_window(now: NaiveDateTime) -> WeekWindow {
    let monday = now.date() - Duration::days(now.weekday().num_days_from_monday() as i64);
    let start = monday.and_time(NaiveTime::MIN);
    WeekWindow {
        start,
        end: start + Duration::days(7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_time() {
        // Valid cases
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("12:30"), Some((12, 30)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time("09:00:00"), Some((9, 0)));

        // Invalid cases
        assert_eq!(parse_time("24:00"), None); // Hour out of range
        assert_eq!(parse_time("12:60"), None); // Minute out of range
        assert_eq!(parse_time("12:30:60"), None); // Second out of range
        assert_eq!(parse_time("12"), None); // Too few parts
        assert_eq!(parse_time("12:ab"), None); // Invalid minute
        assert_eq!(parse_time("ab:30"), None); // Invalid hour
    }

    #[test]
    fn test_parse_session_date() {
        let tz = chrono_tz::Europe::Paris;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        assert_eq!(parse_session_date("2024-03-04", tz), Some(expected));
        // Local midnight in Paris, written in UTC the previous evening
        assert_eq!(
            parse_session_date("2024-03-03T23:00:00.000Z", tz),
            Some(expected)
        );
        assert_eq!(parse_session_date("2024-03-04T00:00:00", tz), Some(expected));
        assert_eq!(parse_session_date("04/03/2024", tz), None);
        assert_eq!(parse_session_date("", tz), None);
    }

    #[test]
    fn test_week_window() {
        // Wednesday, 2024-03-06
        let window = week_window(at(2024, 3, 6, 15, 45));
        assert_eq!(window.start, at(2024, 3, 4, 0, 0));
        assert_eq!(window.end, at(2024, 3, 11, 0, 0));
        assert_eq!(window.end - window.start, Duration::days(7));

        // Monday stays in its own week
        let window = week_window(at(2024, 3, 4, 0, 0));
        assert_eq!(window.start, at(2024, 3, 4, 0, 0));

        // Sunday belongs to the week that started six days earlier
        let window = week_window(at(2024, 3, 10, 23, 59));
        assert_eq!(window.start, at(2024, 3, 4, 0, 0));
        assert_eq!(
            window.date_range(),
            ("2024-03-04".to_string(), "2024-03-10".to_string())
        );
        assert_eq!(window.days().count(), 7);
        assert!(window.contains_date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()));
        assert!(!window.contains_date(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()));
    }

    #[test]
    fn test_to_wire_date() {
        let tz = chrono_tz::Europe::Paris;
        let wire = to_wire_date(tz, at(2024, 3, 4, 9, 0)).unwrap();
        assert_eq!(wire, "2024-03-04T08:00:00.000Z");

        // Round trip back to the same calendar date
        assert_eq!(
            parse_session_date(&wire, tz),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[test]
    fn test_local_to_utc_rejects_skipped_time() {
        // 02:30 does not exist in Paris on the spring-forward night
        let tz = chrono_tz::Europe::Paris;
        assert!(local_to_utc(tz, at(2024, 3, 31, 2, 30)).is_err());
    }
}
